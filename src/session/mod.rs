//! Run orchestration: timing, events and the engine.

/// Time sources.
pub mod clock;
/// The run state machine.
pub mod engine;
/// Progress events and observers.
pub mod events;
/// Output frame pacing.
pub mod pacer;
