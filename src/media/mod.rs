//! Source handles and the decode capability.

/// Decoder traits and frame types.
pub mod decoder;
/// `ffmpeg`-backed decoder.
#[cfg(feature = "media-ffmpeg")]
pub mod ffmpeg;
/// Source files and `ffprobe` probing.
pub mod source;
/// Procedural decoder for tests and debugging.
pub mod synthetic;
