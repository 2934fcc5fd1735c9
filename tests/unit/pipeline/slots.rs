use std::sync::Arc;

use super::*;
use crate::media::source::SourceFile;
use crate::media::synthetic::SyntheticDecoderFactory;

fn clip(index: usize) -> ClipPlan {
    ClipPlan {
        index,
        source_index: 0,
        source: Arc::new(SourceFile::new("a.mp4", "a.mp4", 10.0, 64, 36)),
        start_offset_sec: 1.0,
        length_sec: 2.0,
    }
}

fn meta() -> SourceMetadata {
    SourceMetadata {
        width: 64,
        height: 36,
        duration_sec: 10.0,
    }
}

#[test]
fn full_lifecycle() {
    let mut ring = SlotRing::new(&SyntheticDecoderFactory::default(), 2).unwrap();
    assert_eq!(ring.len(), 2);
    assert!(ring.slots().all(|s| s.state() == SlotState::Empty));

    let decoder = ring.begin_loading(1, clip(1)).unwrap();
    assert_eq!(ring.state(1).unwrap(), SlotState::Loading);
    assert_eq!(ring.slot(1).unwrap().clip().map(|c| c.index), Some(1));

    ring.finish_loading(1, decoder, meta()).unwrap();
    assert_eq!(ring.state(1).unwrap(), SlotState::Ready);
    {
        let ready = ring.ready(1).unwrap();
        assert_eq!(ready.clip.index, 1);
        assert_eq!(ready.metadata, meta());
    }

    let released = ring.release(1).unwrap();
    assert_eq!(released.index, 1);
    assert_eq!(ring.state(1).unwrap(), SlotState::Empty);
    assert!(ring.slot(1).unwrap().clip().is_none());
}

#[test]
fn assignment_only_from_empty() {
    let mut ring = SlotRing::new(&SyntheticDecoderFactory::default(), 2).unwrap();
    let decoder = ring.begin_loading(0, clip(0)).unwrap();
    assert!(ring.begin_loading(0, clip(2)).is_err());

    ring.finish_loading(0, decoder, meta()).unwrap();
    assert!(ring.begin_loading(0, clip(2)).is_err());
    // The rejected rebinding left the original clip in place.
    assert_eq!(ring.slot(0).unwrap().clip().map(|c| c.index), Some(0));
}

#[test]
fn invalid_transitions_are_errors() {
    let mut ring = SlotRing::new(&SyntheticDecoderFactory::default(), 2).unwrap();
    assert!(ring.release(0).is_err());
    assert!(ring.ready(0).is_err());
    assert!(ring.state(5).is_err());

    let decoder = ring.begin_loading(0, clip(0)).unwrap();
    assert!(ring.ready(0).is_err());
    ring.abort_loading(0, decoder).unwrap();
    assert_eq!(ring.state(0).unwrap(), SlotState::Empty);
    assert!(ring.slot(0).unwrap().clip().is_none());
}

#[test]
fn plan_entries_map_round_robin() {
    let ring = SlotRing::new(&SyntheticDecoderFactory::default(), 4).unwrap();
    let slots: Vec<usize> = (0..6).map(|i| ring.slot_for(i)).collect();
    assert_eq!(slots, vec![0, 1, 2, 3, 0, 1]);
}

#[test]
fn zero_slots_rejected() {
    assert!(SlotRing::new(&SyntheticDecoderFactory::default(), 0).is_err());
}
