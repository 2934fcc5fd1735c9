use std::collections::VecDeque;
use std::sync::Arc;

use rand::Rng;

use crate::config::ClipBounds;
use crate::foundation::error::{ReelmixError, ReelmixResult};
use crate::media::source::{SourceFile, validate_sources};
use crate::plan::duration::plan_clip;
use crate::session::events::{RunEvent, RunObserver};

/// Upper bound on plan length; past this the bounds cannot plausibly reach the target.
pub const MAX_PLANNED_CLIPS: usize = 100_000;

/// One scheduled sub-clip.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ClipPlan {
    /// Position in the sequence, 0-based.
    pub index: usize,
    /// Index of the source in the pool the plan was built from.
    pub source_index: usize,
    pub source: Arc<SourceFile>,
    pub start_offset_sec: f64,
    pub length_sec: f64,
}

impl ClipPlan {
    pub fn end_sec(&self) -> f64 {
        self.start_offset_sec + self.length_sec
    }
}

/// Ordered clip plan, consumed front to back.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct ScheduledSequence {
    clips: VecDeque<ClipPlan>,
}

impl ScheduledSequence {
    /// Wrap hand-built clips. Indices are renumbered to match their order.
    pub fn from_clips(clips: impl IntoIterator<Item = ClipPlan>) -> Self {
        let clips = clips
            .into_iter()
            .enumerate()
            .map(|(i, mut c)| {
                c.index = i;
                c
            })
            .collect();
        Self { clips }
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClipPlan> {
        self.clips.iter()
    }

    pub fn front(&self) -> Option<&ClipPlan> {
        self.clips.front()
    }

    pub fn pop_front(&mut self) -> Option<ClipPlan> {
        self.clips.pop_front()
    }

    /// Sum of all remaining clip lengths.
    pub fn total_length_sec(&self) -> f64 {
        self.clips.iter().map(|c| c.length_sec).sum()
    }
}

/// Pick a source index, never repeating `last` when there is a choice.
fn pick_source<R: Rng + ?Sized>(count: usize, last: Option<usize>, rng: &mut R) -> usize {
    match last {
        _ if count == 1 => 0,
        None => rng.random_range(0..count),
        Some(last) => {
            let k = rng.random_range(0..count - 1);
            if k >= last { k + 1 } else { k }
        }
    }
}

/// Build the clip plan for a run.
///
/// Clips are appended until their summed length reaches `target_sec`, so the plan always holds at
/// least one clip. Adjacent clips come from different sources whenever the pool has more than one.
#[tracing::instrument(skip_all, fields(sources = sources.len(), target_sec))]
pub fn build_sequence<R: Rng + ?Sized>(
    sources: &[Arc<SourceFile>],
    target_sec: f64,
    bounds: ClipBounds,
    rng: &mut R,
    observer: &dyn RunObserver,
) -> ReelmixResult<ScheduledSequence> {
    validate_sources(sources)?;
    if !target_sec.is_finite() || target_sec <= 0.0 {
        return Err(ReelmixError::validation(
            "target duration must be a positive finite number",
        ));
    }
    if !bounds.max_pct.is_finite() || bounds.max_pct <= 0.0 {
        return Err(ReelmixError::validation("clip max_pct must be > 0"));
    }

    let mut clips = VecDeque::new();
    let mut total = 0.0;
    let mut last = None;
    while total < target_sec {
        if clips.len() >= MAX_PLANNED_CLIPS {
            return Err(ReelmixError::validation(format!(
                "plan exceeded {MAX_PLANNED_CLIPS} clips before reaching {target_sec}s; \
                 clip bounds are too small for the target"
            )));
        }
        let source_index = pick_source(sources.len(), last, rng);
        let source = Arc::clone(&sources[source_index]);
        let span = plan_clip(source.duration_sec, bounds, rng);
        total += span.length_sec;

        let index = clips.len();
        observer.on_event(&RunEvent::ClipPlanned {
            clip: index,
            source: source.name.clone(),
            start_sec: span.start_offset_sec,
            length_sec: span.length_sec,
            planned_total_sec: total,
        });
        clips.push_back(ClipPlan {
            index,
            source_index,
            source,
            start_offset_sec: span.start_offset_sec,
            length_sec: span.length_sec,
        });
        last = Some(source_index);
    }

    observer.on_event(&RunEvent::PlanComplete {
        clips: clips.len(),
        total_sec: total,
    });
    Ok(ScheduledSequence { clips })
}

#[cfg(test)]
#[path = "../../tests/unit/plan/scheduler.rs"]
mod tests;
