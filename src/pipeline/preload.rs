use std::sync::mpsc;
use std::thread::Scope;

use crate::foundation::error::{DecodeStage, ReelmixError, ReelmixResult};
use crate::media::decoder::{SourceMetadata, VideoDecoder};
use crate::pipeline::slots::{SlotRing, SlotState};
use crate::plan::scheduler::ClipPlan;
use crate::session::events::{RunEvent, RunObserver};

/// Bind `decoder` to the clip's source and seek to its start offset.
///
/// Both acknowledgements must succeed; a failure is tagged with the source and the stage.
pub fn preload_clip(
    decoder: &mut dyn VideoDecoder,
    clip: &ClipPlan,
) -> ReelmixResult<SourceMetadata> {
    let name = &clip.source.name;
    let metadata = decoder
        .load(&clip.source)
        .map_err(|e| ReelmixError::decode(name.as_str(), DecodeStage::Metadata, e))?;
    decoder
        .seek(clip.start_offset_sec)
        .map_err(|e| ReelmixError::decode(name.as_str(), DecodeStage::Seek, e))?;
    Ok(metadata)
}

struct PreloadJob {
    slot: usize,
    clip: ClipPlan,
    decoder: Box<dyn VideoDecoder>,
}

struct PreloadOutcome {
    slot: usize,
    clip: ClipPlan,
    decoder: Box<dyn VideoDecoder>,
    result: ReelmixResult<SourceMetadata>,
}

fn run_worker(jobs: mpsc::Receiver<PreloadJob>, outcomes: mpsc::Sender<PreloadOutcome>) {
    for mut job in jobs {
        tracing::debug!(
            slot = job.slot,
            clip = job.clip.index,
            source = %job.clip.source.name,
            "preload worker: loading"
        );
        let result = preload_clip(job.decoder.as_mut(), &job.clip);
        if let Err(e) = &result {
            tracing::debug!(slot = job.slot, error = %e, "preload worker: failed");
        }
        let outcome = PreloadOutcome {
            slot: job.slot,
            clip: job.clip,
            decoder: job.decoder,
            result,
        };
        if outcomes.send(outcome).is_err() {
            // Driver is gone; nothing left to report to.
            break;
        }
    }
}

/// Driver-side handle to the preload worker.
///
/// Requests take the slot's decoder and ship it to a worker thread; outcomes come back over a
/// channel and are applied to the ring on the driver thread, so the slot states are only ever
/// mutated there. Dropping the handle closes the job channel and lets the worker exit.
pub struct Preloader<'o> {
    jobs: mpsc::Sender<PreloadJob>,
    outcomes: mpsc::Receiver<PreloadOutcome>,
    in_flight: usize,
    observer: &'o dyn RunObserver,
}

impl<'o> Preloader<'o> {
    /// Start the worker on `scope`.
    pub fn spawn<'scope, 'env>(
        scope: &'scope Scope<'scope, 'env>,
        observer: &'o dyn RunObserver,
    ) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<PreloadJob>();
        let (out_tx, out_rx) = mpsc::channel::<PreloadOutcome>();
        scope.spawn(move || run_worker(job_rx, out_tx));
        Self {
            jobs: job_tx,
            outcomes: out_rx,
            in_flight: 0,
            observer,
        }
    }

    /// Number of requests whose outcome has not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Bind `clip` to the empty `slot` and queue its preload.
    pub fn request(&mut self, ring: &mut SlotRing, slot: usize, clip: ClipPlan) -> ReelmixResult<()> {
        let event = RunEvent::PreloadStarted {
            clip: clip.index,
            slot,
            source: clip.source.name.clone(),
            start_sec: clip.start_offset_sec,
            length_sec: clip.length_sec,
        };
        let decoder = ring.begin_loading(slot, clip.clone())?;
        self.observer.on_event(&event);
        self.jobs
            .send(PreloadJob {
                slot,
                clip,
                decoder,
            })
            .map_err(|_| ReelmixError::Other(anyhow::anyhow!("preload worker is not accepting jobs")))?;
        self.in_flight += 1;
        Ok(())
    }

    /// Apply every outcome that has already arrived, without blocking.
    pub fn poll(&mut self, ring: &mut SlotRing) -> ReelmixResult<()> {
        while self.in_flight > 0 {
            match self.outcomes.try_recv() {
                Ok(outcome) => self.apply(ring, outcome)?,
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => return Err(worker_gone()),
            }
        }
        Ok(())
    }

    /// Block until `slot` has left the loading state.
    ///
    /// Returns the preload error if the slot's own load failed. Outcomes for other slots that
    /// arrive first are applied along the way.
    pub fn wait_ready(&mut self, ring: &mut SlotRing, slot: usize) -> ReelmixResult<()> {
        while ring.state(slot)? == SlotState::Loading {
            let outcome = self.outcomes.recv().map_err(|_| worker_gone())?;
            self.apply(ring, outcome)?;
        }
        Ok(())
    }

    fn apply(&mut self, ring: &mut SlotRing, outcome: PreloadOutcome) -> ReelmixResult<()> {
        self.in_flight = self.in_flight.saturating_sub(1);
        let PreloadOutcome {
            slot,
            clip,
            decoder,
            result,
        } = outcome;
        match result {
            Ok(metadata) => {
                ring.finish_loading(slot, decoder, metadata)?;
                self.observer.on_event(&RunEvent::PreloadCompleted {
                    clip: clip.index,
                    slot,
                    source: clip.source.name.clone(),
                });
                Ok(())
            }
            Err(e) => {
                ring.abort_loading(slot, decoder)?;
                Err(e)
            }
        }
    }
}

fn worker_gone() -> ReelmixError {
    ReelmixError::Other(anyhow::anyhow!("preload worker disconnected unexpectedly"))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/preload.rs"]
mod tests;
