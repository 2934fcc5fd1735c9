//! Encoding sinks.
//!
//! Sinks consume composited frames in output order and return the finished recording.

/// `ffmpeg`-based encoder (fragmented MP4 via system `ffmpeg`).
#[cfg(feature = "media-ffmpeg")]
pub mod ffmpeg;
/// In-process raw RGBA encoder.
pub mod raw;
/// Encoder-backed sink with codec negotiation.
pub mod recorder;
/// Frame sink trait, artifacts and built-in sinks.
pub mod sink;
