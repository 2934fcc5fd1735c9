use std::time::Duration;

use crate::foundation::core::{Fps, FrameIndex};

/// Output frame timing against a single recording start.
///
/// Frame `i` is due at `start + i / fps`. Every deadline is measured from `start`, never
/// accumulated, and the output holds exactly `ceil(target * fps)` frames.
#[derive(Clone, Copy, Debug)]
pub struct Pacer {
    start: Duration,
    fps: Fps,
    target_sec: f64,
    target_frames: u64,
    next: u64,
}

impl Pacer {
    pub fn new(start: Duration, fps: Fps, target_sec: f64) -> Self {
        Self {
            start,
            fps,
            target_sec,
            target_frames: fps.secs_to_frames_ceil(target_sec),
            next: 0,
        }
    }

    pub fn start(&self) -> Duration {
        self.start
    }

    pub fn target_frames(&self) -> u64 {
        self.target_frames
    }

    /// Index of the next frame to emit.
    pub fn next_index(&self) -> u64 {
        self.next
    }

    pub fn remaining_frames(&self) -> u64 {
        self.target_frames.saturating_sub(self.next)
    }

    /// Clock time at which frame `index` is due.
    pub fn due(&self, index: u64) -> Duration {
        self.start + Duration::from_secs_f64(self.fps.frames_to_secs(index))
    }

    pub fn next_due(&self) -> Duration {
        self.due(self.next)
    }

    /// Seconds since recording started.
    pub fn elapsed_sec(&self, now: Duration) -> f64 {
        now.saturating_sub(self.start).as_secs_f64()
    }

    pub fn remaining_sec(&self, now: Duration) -> f64 {
        (self.target_sec - self.elapsed_sec(now)).max(0.0)
    }

    /// Whether the run must stop drawing: target elapsed or frame budget spent.
    pub fn deadline_reached(&self, now: Duration) -> bool {
        self.elapsed_sec(now) >= self.target_sec || self.next >= self.target_frames
    }

    /// Frames whose slot passed while the driver was busy; they must be filled with the held
    /// frame before drawing again.
    pub fn missed(&self, now: Duration) -> u64 {
        let due = self
            .fps
            .secs_to_frames_floor(self.elapsed_sec(now))
            .min(self.target_frames);
        due.saturating_sub(self.next)
    }

    /// Claim the next output index.
    pub fn advance(&mut self) -> FrameIndex {
        let idx = FrameIndex(self.next);
        self.next += 1;
        idx
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/pacer.rs"]
mod tests;
