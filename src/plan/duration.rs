use rand::Rng;

use crate::config::ClipBounds;
use crate::foundation::math::uniform;

/// Length and start offset of one clip, in source seconds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ClipSpan {
    pub length_sec: f64,
    pub start_offset_sec: f64,
}

impl ClipSpan {
    /// Source time at which the clip ends.
    pub fn end_sec(self) -> f64 {
        self.start_offset_sec + self.length_sec
    }
}

/// Draw a random clip out of a source of `source_duration_sec`.
///
/// The length is uniform between `min_pct` and `max_pct` of the duration and the start is uniform
/// over every offset that keeps the clip inside the source. The length is clamped to the
/// duration and the feasible start range to zero, so `0 <= start` and `start + length <= duration`
/// hold even at `max_pct = 100`.
pub fn plan_clip<R: Rng + ?Sized>(
    source_duration_sec: f64,
    bounds: ClipBounds,
    rng: &mut R,
) -> ClipSpan {
    let min_len = bounds.min_pct / 100.0 * source_duration_sec;
    let max_len = bounds.max_pct / 100.0 * source_duration_sec;
    let length_sec = uniform(rng, min_len, max_len).clamp(0.0, source_duration_sec);

    let slack = (source_duration_sec - length_sec).max(0.0);
    let start_offset_sec = uniform(rng, 0.0, slack).clamp(0.0, slack);

    ClipSpan {
        length_sec,
        start_offset_sec,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/duration.rs"]
mod tests;
