use crate::foundation::error::{ReelmixError, ReelmixResult};
use crate::media::decoder::{DecoderFactory, SourceMetadata, VideoDecoder};
use crate::plan::scheduler::ClipPlan;

/// Lifecycle of a decode slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    /// No clip bound; may be assigned.
    Empty,
    /// Bound to a clip, preload in flight. The decoder is owned by the preload job.
    Loading,
    /// Metadata and seek acknowledged; ready to play.
    Ready,
}

/// One entry of the slot ring.
pub struct DecodeSlot {
    index: usize,
    state: SlotState,
    clip: Option<ClipPlan>,
    decoder: Option<Box<dyn VideoDecoder>>,
    metadata: Option<SourceMetadata>,
}

impl DecodeSlot {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn clip(&self) -> Option<&ClipPlan> {
        self.clip.as_ref()
    }

    pub fn metadata(&self) -> Option<SourceMetadata> {
        self.metadata
    }
}

impl std::fmt::Debug for DecodeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeSlot")
            .field("index", &self.index)
            .field("state", &self.state)
            .field("clip", &self.clip.as_ref().map(|c| c.index))
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// A clip that is bound, preloaded and ready to render.
pub struct ReadyClip<'a> {
    pub clip: &'a ClipPlan,
    pub metadata: SourceMetadata,
    pub decoder: &'a mut dyn VideoDecoder,
}

/// Fixed arena of decode slots, one decoder each.
///
/// Every transition is explicit: `Empty -> Loading` in [`begin_loading`], `Loading -> Ready` in
/// [`finish_loading`] and `Ready -> Empty` in [`release`]. A slot can only be assigned while
/// `Empty`, which bounds live decoders to the ring size.
///
/// [`begin_loading`]: SlotRing::begin_loading
/// [`finish_loading`]: SlotRing::finish_loading
/// [`release`]: SlotRing::release
#[derive(Debug)]
pub struct SlotRing {
    slots: Vec<DecodeSlot>,
}

impl SlotRing {
    pub fn new(decoders: &dyn DecoderFactory, count: usize) -> ReelmixResult<Self> {
        if count == 0 {
            return Err(ReelmixError::validation("slot ring needs at least one slot"));
        }
        let slots = (0..count)
            .map(|index| {
                Ok(DecodeSlot {
                    index,
                    state: SlotState::Empty,
                    clip: None,
                    decoder: Some(decoders.create_decoder(index)?),
                    metadata: None,
                })
            })
            .collect::<ReelmixResult<Vec<_>>>()?;
        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot that plan entry `clip_index` is bound to.
    pub fn slot_for(&self, clip_index: usize) -> usize {
        clip_index % self.slots.len()
    }

    pub fn slot(&self, index: usize) -> ReelmixResult<&DecodeSlot> {
        self.slots
            .get(index)
            .ok_or_else(|| slot_err(index, "out of range"))
    }

    pub fn state(&self, index: usize) -> ReelmixResult<SlotState> {
        Ok(self.slot(index)?.state)
    }

    pub fn slots(&self) -> impl Iterator<Item = &DecodeSlot> {
        self.slots.iter()
    }

    fn slot_mut(&mut self, index: usize) -> ReelmixResult<&mut DecodeSlot> {
        self.slots
            .get_mut(index)
            .ok_or_else(|| slot_err(index, "out of range"))
    }

    /// Bind `clip` to an empty slot and hand its decoder to the preload job.
    pub fn begin_loading(
        &mut self,
        index: usize,
        clip: ClipPlan,
    ) -> ReelmixResult<Box<dyn VideoDecoder>> {
        let slot = self.slot_mut(index)?;
        if slot.state != SlotState::Empty {
            return Err(slot_err(
                index,
                format!("cannot bind clip {} while {:?}", clip.index, slot.state),
            ));
        }
        let decoder = slot
            .decoder
            .take()
            .ok_or_else(|| slot_err(index, "decoder missing"))?;
        slot.state = SlotState::Loading;
        slot.clip = Some(clip);
        slot.metadata = None;
        Ok(decoder)
    }

    /// Return the decoder of a successful preload and mark the slot ready.
    pub fn finish_loading(
        &mut self,
        index: usize,
        decoder: Box<dyn VideoDecoder>,
        metadata: SourceMetadata,
    ) -> ReelmixResult<()> {
        let slot = self.slot_mut(index)?;
        if slot.state != SlotState::Loading {
            return Err(slot_err(index, format!("finish while {:?}", slot.state)));
        }
        slot.decoder = Some(decoder);
        slot.metadata = Some(metadata);
        slot.state = SlotState::Ready;
        Ok(())
    }

    /// Return the decoder of a failed preload and clear the binding.
    pub fn abort_loading(
        &mut self,
        index: usize,
        decoder: Box<dyn VideoDecoder>,
    ) -> ReelmixResult<()> {
        let slot = self.slot_mut(index)?;
        if slot.state != SlotState::Loading {
            return Err(slot_err(index, format!("abort while {:?}", slot.state)));
        }
        slot.decoder = Some(decoder);
        slot.clip = None;
        slot.metadata = None;
        slot.state = SlotState::Empty;
        Ok(())
    }

    /// Borrow a ready slot's clip and decoder for rendering.
    pub fn ready(&mut self, index: usize) -> ReelmixResult<ReadyClip<'_>> {
        let slot = self.slot_mut(index)?;
        if slot.state != SlotState::Ready {
            return Err(slot_err(index, format!("not ready ({:?})", slot.state)));
        }
        match (slot.clip.as_ref(), slot.metadata, slot.decoder.as_deref_mut()) {
            (Some(clip), Some(metadata), Some(decoder)) => Ok(ReadyClip {
                clip,
                metadata,
                decoder,
            }),
            _ => Err(slot_err(index, "ready slot is missing its binding")),
        }
    }

    /// Unbind a slot whose clip finished rendering.
    pub fn release(&mut self, index: usize) -> ReelmixResult<ClipPlan> {
        let slot = self.slot_mut(index)?;
        if slot.state != SlotState::Ready {
            return Err(slot_err(index, format!("release while {:?}", slot.state)));
        }
        let clip = slot
            .clip
            .take()
            .ok_or_else(|| slot_err(index, "ready slot has no clip"))?;
        slot.metadata = None;
        slot.state = SlotState::Empty;
        Ok(clip)
    }
}

fn slot_err(index: usize, msg: impl std::fmt::Display) -> ReelmixError {
    ReelmixError::Other(anyhow::anyhow!("decode slot {index}: {msg}"))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/slots.rs"]
mod tests;
