use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::RunConfig;
use crate::encode::sink::{FrameSink, MediaArtifact, SinkConfig};
use crate::foundation::error::{DecodeStage, ReelmixError, ReelmixResult};
use crate::media::decoder::DecoderFactory;
use crate::media::source::SourceFile;
use crate::pipeline::preload::Preloader;
use crate::pipeline::slots::{SlotRing, SlotState};
use crate::plan::scheduler::{ClipPlan, ScheduledSequence, build_sequence};
use crate::render::compositor::{ComposeInput, Compositor};
use crate::render::frame::FrameRGBA;
use crate::render::transform::TransformConfig;
use crate::session::clock::{Clock, SystemClock};
use crate::session::events::{RunEvent, RunObserver, RunPhase};
use crate::session::pacer::Pacer;

/// Why the run stopped drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// The target duration elapsed while clips were still playing.
    Deadline,
    /// Every planned clip finished before the target; the tail was filled with the held frame.
    PlanExhausted,
}

/// Counters reported at the end of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct RunStats {
    pub clips_planned: usize,
    /// Clips that played to their own end.
    pub clips_rendered: usize,
    /// Frames handed to the sink.
    pub frames_total: u64,
    /// Frames freshly composited.
    pub frames_rendered: u64,
    /// Frames filled with the held frame (catch-up, draining, padding).
    pub frames_repeated: u64,
    pub completion: Completion,
}

/// What was played for one clip.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ClipReport {
    pub clip: usize,
    pub slot: usize,
    pub source: String,
    pub transform: TransformConfig,
    pub frames: u64,
    /// `false` when the run deadline cut the clip short.
    pub completed: bool,
}

/// Result of a successful run.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub artifact: MediaArtifact,
    pub stats: RunStats,
    pub clips: Vec<ClipReport>,
    /// Last frame handed to the sink.
    pub last_frame: Option<FrameRGBA>,
}

/// Plans and renders one montage.
///
/// A run goes `Planning -> Preloading -> Running -> Draining -> Finalizing -> Done`, reporting
/// every transition to the observer. All rendering and sink calls happen on the calling thread;
/// decoders are bound and seeked on a scoped preload worker.
pub struct Engine {
    cfg: RunConfig,
    observer: Arc<dyn RunObserver>,
    clock: Box<dyn Clock>,
    rng: StdRng,
    phase: RunPhase,
}

impl Engine {
    /// Validate `cfg` and create an engine on the system clock.
    pub fn new(cfg: RunConfig, observer: Arc<dyn RunObserver>) -> ReelmixResult<Self> {
        cfg.validate()?;
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            cfg,
            observer,
            clock: Box::new(SystemClock::new()),
            rng,
            phase: RunPhase::Idle,
        })
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.cfg
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Build the clip plan for `sources`.
    #[tracing::instrument(skip_all, fields(sources = sources.len()))]
    pub fn plan(&mut self, sources: &[Arc<SourceFile>]) -> ReelmixResult<ScheduledSequence> {
        enter_phase(&mut self.phase, self.observer.as_ref(), RunPhase::Planning);
        build_sequence(
            sources,
            self.cfg.target_duration_sec,
            self.cfg.clip,
            &mut self.rng,
            self.observer.as_ref(),
        )
    }

    /// Plan and render a montage of `sources` into `sink`.
    ///
    /// Any source failure aborts the run; the sink is then left unfinished and no artifact is
    /// produced.
    #[tracing::instrument(
        skip_all,
        fields(sources = sources.len(), target_sec = self.cfg.target_duration_sec)
    )]
    pub fn run(
        &mut self,
        sources: &[Arc<SourceFile>],
        decoders: &dyn DecoderFactory,
        sink: &mut dyn FrameSink,
    ) -> ReelmixResult<RunOutcome> {
        let sequence = self.plan(sources)?;
        self.run_plan(sequence, decoders, sink)
    }

    /// Render an already built plan.
    pub fn run_plan(
        &mut self,
        sequence: ScheduledSequence,
        decoders: &dyn DecoderFactory,
        sink: &mut dyn FrameSink,
    ) -> ReelmixResult<RunOutcome> {
        if sequence.is_empty() {
            return Err(ReelmixError::validation("cannot run an empty plan"));
        }
        enter_phase(&mut self.phase, self.observer.as_ref(), RunPhase::Preloading);

        let mut ring = SlotRing::new(decoders, self.cfg.slots)?;
        let observer = Arc::clone(&self.observer);
        let Self {
            cfg,
            clock,
            rng,
            phase,
            ..
        } = self;
        let compositor = Compositor::new(cfg.output.canvas(), cfg.dissolve, cfg.overlap_sec)
            .with_background(cfg.output.background);
        let pacer = Pacer::new(clock.now(), cfg.output.fps, cfg.target_duration_sec);

        std::thread::scope(|scope| {
            let run = RunLoop {
                cfg,
                observer: observer.as_ref(),
                clock: &mut **clock,
                rng,
                phase,
                ring: &mut ring,
                preloader: Preloader::spawn(scope, observer.as_ref()),
                sink,
                compositor,
                pacer,
                held: None,
                reports: Vec::new(),
                frames_rendered: 0,
                frames_repeated: 0,
                clips_rendered: 0,
            };
            run.execute(sequence)
        })
    }
}

fn enter_phase(slot: &mut RunPhase, observer: &dyn RunObserver, phase: RunPhase) {
    *slot = phase;
    observer.on_event(&RunEvent::PhaseChanged { phase });
}

enum ClipEnd {
    Completed,
    Deadline,
}

/// State of one run while the preload worker is alive.
struct RunLoop<'a, 'o> {
    cfg: &'a RunConfig,
    observer: &'o dyn RunObserver,
    clock: &'a mut dyn Clock,
    rng: &'a mut StdRng,
    phase: &'a mut RunPhase,
    ring: &'a mut SlotRing,
    preloader: Preloader<'o>,
    sink: &'a mut dyn FrameSink,
    compositor: Compositor,
    pacer: Pacer,
    held: Option<FrameRGBA>,
    reports: Vec<ClipReport>,
    frames_rendered: u64,
    frames_repeated: u64,
    clips_rendered: usize,
}

impl RunLoop<'_, '_> {
    fn execute(mut self, mut sequence: ScheduledSequence) -> ReelmixResult<RunOutcome> {
        let clips_planned = sequence.len();

        self.refill(&mut sequence)?;
        let first_slot = self.ring.slot_for(0);
        self.preloader.wait_ready(self.ring, first_slot)?;

        let out = &self.cfg.output;
        self.sink.begin(SinkConfig {
            width: out.width,
            height: out.height,
            fps: out.fps,
        })?;
        self.observer.on_event(&RunEvent::RecordingStarted);
        self.enter(RunPhase::Running);
        self.pacer = Pacer::new(
            self.clock.now(),
            self.cfg.output.fps,
            self.cfg.target_duration_sec,
        );

        let mut completion = Completion::PlanExhausted;
        for k in 0..clips_planned {
            if self.pacer.deadline_reached(self.clock.now()) {
                completion = Completion::Deadline;
                break;
            }
            if let ClipEnd::Deadline = self.play_clip(k, clips_planned, &mut sequence)? {
                completion = Completion::Deadline;
                break;
            }
        }

        if completion == Completion::PlanExhausted {
            self.drain()?;
        }
        self.finalize(completion, clips_planned)
    }

    fn enter(&mut self, phase: RunPhase) {
        enter_phase(self.phase, self.observer, phase);
    }

    /// Bind upcoming plan entries to their slots while those slots are free.
    fn refill(&mut self, sequence: &mut ScheduledSequence) -> ReelmixResult<()> {
        while let Some(index) = sequence.front().map(|c| c.index) {
            let slot = self.ring.slot_for(index);
            if self.ring.state(slot)? != SlotState::Empty {
                break;
            }
            let Some(clip) = sequence.pop_front() else {
                break;
            };
            self.preloader.request(self.ring, slot, clip)?;
        }
        self.preloader.poll(self.ring)
    }

    fn play_clip(
        &mut self,
        k: usize,
        clips_planned: usize,
        sequence: &mut ScheduledSequence,
    ) -> ReelmixResult<ClipEnd> {
        let slot = self.ring.slot_for(k);
        self.refill(sequence)?;
        self.preloader.wait_ready(self.ring, slot)?;

        let (clip, metadata) = {
            let ready = self.ring.ready(slot)?;
            (ready.clip.clone(), ready.metadata)
        };
        let source = clip.source.name.clone();
        self.observer.on_event(&RunEvent::ClipStarted {
            clip: k,
            slot,
            source: source.clone(),
        });

        let transform = TransformConfig::sample(
            metadata.width,
            metadata.height,
            self.compositor.canvas(),
            &self.cfg.effects,
            &mut *self.rng,
        );
        self.report_transform(&clip, &transform);

        self.ring
            .ready(slot)?
            .decoder
            .play()
            .map_err(|e| ReelmixError::playback_start(source.as_str(), e))?;

        let previous = self.held.clone();
        let mut clip_start: Option<Duration> = None;
        let mut frames = 0u64;
        let end = loop {
            self.clock.sleep_until(self.pacer.next_due());
            let now = self.clock.now();
            self.fill_missed(now)?;
            if self.pacer.deadline_reached(now) {
                break ClipEnd::Deadline;
            }

            let started = *clip_start.get_or_insert(now);
            let source_t = clip.start_offset_sec + now.saturating_sub(started).as_secs_f64();
            let frame = self.draw(slot, &clip, source_t, &transform, previous.as_ref())?;
            self.push(&frame)?;
            self.frames_rendered += 1;
            self.held = Some(frame);
            frames += 1;

            let clip_elapsed = self.clock.now().saturating_sub(started).as_secs_f64();
            if clip_elapsed >= clip.length_sec {
                break ClipEnd::Completed;
            }
        };

        let completed = matches!(end, ClipEnd::Completed);
        if completed {
            if k + 1 < clips_planned {
                let next_slot = self.ring.slot_for(k + 1);
                self.preloader.wait_ready(self.ring, next_slot)?;
            }
            self.ring.release(slot)?;
            self.clips_rendered += 1;
            self.observer.on_event(&RunEvent::ClipCompleted {
                clip: k,
                slot,
                source: source.clone(),
                frames,
            });
        }
        self.reports.push(ClipReport {
            clip: k,
            slot,
            source,
            transform,
            frames,
            completed,
        });
        Ok(end)
    }

    fn report_transform(&self, clip: &ClipPlan, transform: &TransformConfig) {
        if transform.zoom_applied {
            self.observer.on_event(&RunEvent::ZoomApplied {
                clip: clip.index,
                source: clip.source.name.clone(),
                factor: transform.zoom_factor,
                x: transform.crop.x0,
                y: transform.crop.y0,
            });
        }
        if transform.flip_applied {
            self.observer.on_event(&RunEvent::FlipApplied {
                clip: clip.index,
                source: clip.source.name.clone(),
            });
        }
    }

    fn draw(
        &mut self,
        slot: usize,
        clip: &ClipPlan,
        source_t: f64,
        transform: &TransformConfig,
        previous: Option<&FrameRGBA>,
    ) -> ReelmixResult<FrameRGBA> {
        let ready = self.ring.ready(slot)?;
        let decoded = ready.decoder.frame_at(source_t).map_err(|e| {
            ReelmixError::decode(clip.source.name.as_str(), DecodeStage::Frame, e)
        })?;
        self.compositor.compose(ComposeInput {
            frame: decoded,
            transform,
            clip_start_sec: clip.start_offset_sec,
            previous,
        })
    }

    fn push(&mut self, frame: &FrameRGBA) -> ReelmixResult<()> {
        let idx = self.pacer.advance();
        self.sink.push_frame(idx, frame)
    }

    fn held_or_blank(&self) -> FrameRGBA {
        self.held.clone().unwrap_or_else(|| {
            let canvas = self.compositor.canvas();
            FrameRGBA::blank(canvas.width, canvas.height)
        })
    }

    fn repeat_held(&mut self, count: u64) -> ReelmixResult<()> {
        if count == 0 {
            return Ok(());
        }
        let filler = self.held_or_blank();
        for _ in 0..count {
            self.push(&filler)?;
            self.frames_repeated += 1;
        }
        if self.held.is_none() {
            self.held = Some(filler);
        }
        Ok(())
    }

    /// Repeat the held frame for ticks that passed while the driver was busy.
    fn fill_missed(&mut self, now: Duration) -> ReelmixResult<()> {
        let missed = self.pacer.missed(now);
        if missed > 0 {
            tracing::debug!(missed, "driver behind clock, repeating held frame");
        }
        self.repeat_held(missed)
    }

    fn drain(&mut self) -> ReelmixResult<()> {
        self.enter(RunPhase::Draining);
        self.observer.on_event(&RunEvent::Draining {
            remaining_sec: self.pacer.remaining_sec(self.clock.now()),
        });
        while self.pacer.remaining_frames() > 0 {
            self.clock.sleep_until(self.pacer.next_due());
            let now = self.clock.now();
            self.fill_missed(now)?;
            if self.pacer.deadline_reached(now) {
                break;
            }
            self.repeat_held(1)?;
        }
        Ok(())
    }

    fn finalize(mut self, completion: Completion, clips_planned: usize) -> ReelmixResult<RunOutcome> {
        self.enter(RunPhase::Finalizing);
        let pad = self.pacer.remaining_frames();
        self.repeat_held(pad)?;

        let artifact = self.sink.end()?;
        let frames_total = self.pacer.next_index();
        self.observer.on_event(&RunEvent::RecordingStopped {
            frames: frames_total,
        });
        self.enter(RunPhase::Done);

        Ok(RunOutcome {
            artifact,
            stats: RunStats {
                clips_planned,
                clips_rendered: self.clips_rendered,
                frames_total,
                frames_rendered: self.frames_rendered,
                frames_repeated: self.frames_repeated,
                completion,
            },
            clips: self.reports,
            last_frame: self.held,
        })
    }
}
