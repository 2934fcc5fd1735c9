//! Clip planning: per-source spans and the run's scheduled sequence.

/// Random clip length and start offset within one source.
pub mod duration;
/// Sequence construction with the no-immediate-repeat policy.
pub mod scheduler;
