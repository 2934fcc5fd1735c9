use std::sync::Mutex;

/// Stage of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Planning,
    Preloading,
    Running,
    Draining,
    Finalizing,
    Done,
}

/// Progress event reported to a [`RunObserver`].
///
/// Purely observational: nothing in the engine depends on how events are consumed.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    PhaseChanged {
        phase: RunPhase,
    },
    ClipPlanned {
        clip: usize,
        source: String,
        start_sec: f64,
        length_sec: f64,
        planned_total_sec: f64,
    },
    PlanComplete {
        clips: usize,
        total_sec: f64,
    },
    PreloadStarted {
        clip: usize,
        slot: usize,
        source: String,
        start_sec: f64,
        length_sec: f64,
    },
    PreloadCompleted {
        clip: usize,
        slot: usize,
        source: String,
    },
    RecordingStarted,
    ClipStarted {
        clip: usize,
        slot: usize,
        source: String,
    },
    ZoomApplied {
        clip: usize,
        source: String,
        factor: f64,
        x: f64,
        y: f64,
    },
    FlipApplied {
        clip: usize,
        source: String,
    },
    ClipCompleted {
        clip: usize,
        slot: usize,
        source: String,
        frames: u64,
    },
    CodecFallback {
        preferred: String,
        reason: String,
    },
    ChunkReceived {
        bytes: usize,
    },
    Draining {
        remaining_sec: f64,
    },
    RecordingStopped {
        frames: u64,
    },
}

/// Receives progress events. Injected into the engine and the recording sink.
pub trait RunObserver: Send + Sync {
    fn on_event(&self, event: &RunEvent);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl RunObserver for NullObserver {
    fn on_event(&self, _event: &RunEvent) {}
}

/// Forwards events to `tracing` at info level (chunks at debug).
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_event(&self, event: &RunEvent) {
        match event {
            RunEvent::PhaseChanged { phase } => tracing::info!(?phase, "run phase"),
            RunEvent::ClipPlanned {
                clip,
                source,
                start_sec,
                length_sec,
                planned_total_sec,
            } => tracing::info!(
                clip,
                %source,
                start = format_args!("{start_sec:.2}s"),
                length = format_args!("{length_sec:.2}s"),
                total = format_args!("{planned_total_sec:.2}s"),
                "added clip"
            ),
            RunEvent::PlanComplete { clips, total_sec } => {
                tracing::info!(clips, total = format_args!("{total_sec:.2}s"), "plan complete")
            }
            RunEvent::PreloadStarted {
                clip,
                slot,
                source,
                start_sec,
                length_sec,
            } => tracing::info!(
                clip,
                slot,
                %source,
                start = format_args!("{start_sec:.2}s"),
                length = format_args!("{length_sec:.2}s"),
                "preloading clip"
            ),
            RunEvent::PreloadCompleted { clip, slot, source } => {
                tracing::info!(clip, slot, %source, "preload complete")
            }
            RunEvent::RecordingStarted => tracing::info!("recording started"),
            RunEvent::ClipStarted { clip, slot, source } => {
                tracing::info!(clip, slot, %source, "processing clip")
            }
            RunEvent::ZoomApplied {
                clip,
                source,
                factor,
                x,
                y,
            } => tracing::info!(
                clip,
                %source,
                zoom = format_args!("{:.0}%", factor * 100.0),
                x = format_args!("{x:.0}"),
                y = format_args!("{y:.0}"),
                "applied zoom"
            ),
            RunEvent::FlipApplied { clip, source } => {
                tracing::info!(clip, %source, "applied horizontal flip")
            }
            RunEvent::ClipCompleted {
                clip,
                slot,
                source,
                frames,
            } => tracing::info!(clip, slot, %source, frames, "clip completed"),
            RunEvent::CodecFallback { preferred, reason } => {
                tracing::info!(%preferred, %reason, "codec fallback")
            }
            RunEvent::ChunkReceived { bytes } => tracing::debug!(bytes, "encoded chunk received"),
            RunEvent::Draining { remaining_sec } => tracing::info!(
                remaining = format_args!("{remaining_sec:.2}s"),
                "waiting for remaining time"
            ),
            RunEvent::RecordingStopped { frames } => {
                tracing::info!(frames, "recording stopped")
            }
        }
    }
}

/// Collects events in arrival order, for tests and debugging.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<RunEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event received so far.
    pub fn events(&self) -> Vec<RunEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl RunObserver for EventLog {
    fn on_event(&self, event: &RunEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}
