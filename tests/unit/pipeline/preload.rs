use std::sync::Arc;

use super::*;
use crate::media::decoder::DecoderFactory as _;
use crate::media::source::SourceFile;
use crate::media::synthetic::{SyntheticDecoderFactory, SyntheticFault};
use crate::session::events::EventLog;

fn clip(index: usize, name: &str, start: f64) -> ClipPlan {
    ClipPlan {
        index,
        source_index: 0,
        source: Arc::new(SourceFile::new(name, name, 10.0, 32, 18)),
        start_offset_sec: start,
        length_sec: 2.0,
    }
}

#[test]
fn preload_clip_reports_metadata() {
    let factory = SyntheticDecoderFactory::default();
    let mut decoder = factory.create_decoder(0).unwrap();
    let meta = preload_clip(decoder.as_mut(), &clip(0, "a.mp4", 3.0)).unwrap();
    assert_eq!((meta.width, meta.height), (32, 18));
    assert_eq!(meta.duration_sec, 10.0);
}

#[test]
fn preload_clip_tags_stage() {
    let factory = SyntheticDecoderFactory::default()
        .with_fault("meta.mp4", SyntheticFault::Metadata)
        .with_fault("seek.mp4", SyntheticFault::Seek);
    let mut decoder = factory.create_decoder(0).unwrap();

    match preload_clip(decoder.as_mut(), &clip(0, "meta.mp4", 0.0)) {
        Err(ReelmixError::Decode {
            source_name, stage, ..
        }) => {
            assert_eq!(source_name, "meta.mp4");
            assert_eq!(stage, DecodeStage::Metadata);
        }
        other => panic!("unexpected {other:?}"),
    }
    match preload_clip(decoder.as_mut(), &clip(0, "seek.mp4", 0.0)) {
        Err(ReelmixError::Decode { stage, .. }) => assert_eq!(stage, DecodeStage::Seek),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn worker_marks_slots_ready() {
    let factory = SyntheticDecoderFactory::default();
    let mut ring = SlotRing::new(&factory, 3).unwrap();
    let log = EventLog::new();

    std::thread::scope(|scope| {
        let mut preloader = Preloader::spawn(scope, &log);
        for i in 0..3 {
            preloader
                .request(&mut ring, i, clip(i, &format!("c{i}.mp4"), 1.0))
                .unwrap();
        }
        for i in 0..3 {
            preloader.wait_ready(&mut ring, i).unwrap();
            assert_eq!(ring.state(i).unwrap(), SlotState::Ready);
        }
        preloader.poll(&mut ring).unwrap();
        assert_eq!(preloader.in_flight(), 0);
    });

    let events = log.events();
    let started = events
        .iter()
        .filter(|e| matches!(e, RunEvent::PreloadStarted { .. }))
        .count();
    let completed = events
        .iter()
        .filter(|e| matches!(e, RunEvent::PreloadCompleted { .. }))
        .count();
    assert_eq!((started, completed), (3, 3));
}

#[test]
fn ready_decoder_plays_from_offset() {
    let factory = SyntheticDecoderFactory::default();
    let mut ring = SlotRing::new(&factory, 2).unwrap();
    let log = EventLog::new();

    std::thread::scope(|scope| {
        let mut preloader = Preloader::spawn(scope, &log);
        preloader
            .request(&mut ring, 0, clip(0, "a.mp4", 4.0))
            .unwrap();
        preloader.wait_ready(&mut ring, 0).unwrap();
    });

    let ready = ring.ready(0).unwrap();
    ready.decoder.play().unwrap();
    let frame = ready.decoder.frame_at(4.0).unwrap();
    assert!((frame.pts_sec - 4.0).abs() < 1e-9);
}

#[test]
fn failed_preload_surfaces_and_frees_slot() {
    let factory = SyntheticDecoderFactory::default().with_fault("bad.mp4", SyntheticFault::Seek);
    let mut ring = SlotRing::new(&factory, 2).unwrap();
    let log = EventLog::new();

    let err = std::thread::scope(|scope| {
        let mut preloader = Preloader::spawn(scope, &log);
        preloader
            .request(&mut ring, 1, clip(1, "bad.mp4", 0.0))
            .unwrap();
        preloader.wait_ready(&mut ring, 1).unwrap_err()
    });

    assert!(err.is_source_failure());
    assert!(err.to_string().contains("bad.mp4"));
    assert_eq!(ring.state(1).unwrap(), SlotState::Empty);
    assert!(
        !log.events()
            .iter()
            .any(|e| matches!(e, RunEvent::PreloadCompleted { .. }))
    );
}

#[test]
fn request_into_busy_slot_is_rejected() {
    let factory = SyntheticDecoderFactory::default();
    let mut ring = SlotRing::new(&factory, 2).unwrap();
    let log = EventLog::new();

    std::thread::scope(|scope| {
        let mut preloader = Preloader::spawn(scope, &log);
        preloader
            .request(&mut ring, 0, clip(0, "a.mp4", 0.0))
            .unwrap();
        assert!(
            preloader
                .request(&mut ring, 0, clip(2, "b.mp4", 0.0))
                .is_err()
        );
        preloader.wait_ready(&mut ring, 0).unwrap();
        assert_eq!(ring.slot(0).unwrap().clip().map(|c| c.index), Some(0));
    });
}
