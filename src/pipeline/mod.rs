//! Decode slot ring and the background preload worker.

/// Worker thread that binds and seeks decoders ahead of playback.
pub mod preload;
/// Slot arena with explicit state transitions.
pub mod slots;
