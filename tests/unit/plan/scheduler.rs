use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;
use crate::session::events::{EventLog, NullObserver};

fn pool(durations: &[f64]) -> Vec<Arc<SourceFile>> {
    durations
        .iter()
        .enumerate()
        .map(|(i, d)| Arc::new(SourceFile::new(format!("s{i}.mp4"), format!("s{i}.mp4"), *d, 640, 360)))
        .collect()
}

fn build(sources: &[Arc<SourceFile>], target: f64, seed: u64) -> ScheduledSequence {
    build_sequence(
        sources,
        target,
        ClipBounds::default(),
        &mut StdRng::seed_from_u64(seed),
        &NullObserver,
    )
    .unwrap()
}

#[test]
fn total_length_reaches_target() {
    let sources = pool(&[12.0, 5.5, 40.0]);
    for seed in 0..50 {
        let seq = build(&sources, 30.0, seed);
        assert!(!seq.is_empty());
        assert!(seq.total_length_sec() >= 30.0);
        // Dropping the last clip must fall short, otherwise we planned too much.
        let without_last: f64 = seq.iter().take(seq.len() - 1).map(|c| c.length_sec).sum();
        assert!(without_last < 30.0);
    }
}

#[test]
fn adjacent_clips_use_different_sources() {
    let sources = pool(&[8.0, 9.0, 10.0]);
    for seed in 0..50 {
        let seq = build(&sources, 60.0, seed);
        let picks: Vec<usize> = seq.iter().map(|c| c.source_index).collect();
        assert!(picks.windows(2).all(|w| w[0] != w[1]), "{picks:?}");
    }
}

#[test]
fn two_sources_alternate() {
    let sources = pool(&[10.0, 10.0]);
    let seq = build(&sources, 20.0, 3);
    let first = seq.iter().next().unwrap().source_index;
    for (i, c) in seq.iter().enumerate() {
        assert_eq!(c.source_index, (first + i) % 2);
    }
}

#[test]
fn single_source_is_reused() {
    let sources = pool(&[4.0]);
    let seq = build(&sources, 10.0, 9);
    assert!(seq.len() > 1);
    assert!(seq.iter().all(|c| c.source_index == 0));
    assert!(seq.iter().all(|c| c.end_sec() <= 4.0 + 1e-12));
}

#[test]
fn indices_follow_sequence_order() {
    let sources = pool(&[6.0, 7.0]);
    let seq = build(&sources, 12.0, 1);
    for (i, c) in seq.iter().enumerate() {
        assert_eq!(c.index, i);
        assert!(Arc::ptr_eq(&c.source, &sources[c.source_index]));
    }
}

#[test]
fn same_seed_same_plan() {
    let sources = pool(&[12.0, 5.5, 40.0]);
    assert_eq!(build(&sources, 30.0, 77), build(&sources, 30.0, 77));
}

#[test]
fn rejects_bad_inputs() {
    let mut rng = StdRng::seed_from_u64(0);
    let err = build_sequence(&[], 10.0, ClipBounds::default(), &mut rng, &NullObserver);
    assert!(matches!(err, Err(ReelmixError::Validation(_))));

    let sources = pool(&[0.0]);
    let err = build_sequence(&sources, 10.0, ClipBounds::default(), &mut rng, &NullObserver);
    assert!(matches!(err, Err(ReelmixError::Validation(_))));

    let sources = pool(&[5.0]);
    let zero = ClipBounds {
        min_pct: 0.0,
        max_pct: 0.0,
    };
    let err = build_sequence(&sources, 10.0, zero, &mut rng, &NullObserver);
    assert!(matches!(err, Err(ReelmixError::Validation(_))));
}

#[test]
fn tiny_clips_hit_the_cap() {
    let sources = pool(&[0.001]);
    let tiny = ClipBounds {
        min_pct: 1.0,
        max_pct: 1.0,
    };
    let err = build_sequence(
        &sources,
        1_000.0,
        tiny,
        &mut StdRng::seed_from_u64(0),
        &NullObserver,
    );
    assert!(matches!(err, Err(ReelmixError::Validation(_))));
}

#[test]
fn reports_each_clip_and_completion() {
    let sources = pool(&[10.0, 20.0]);
    let log = EventLog::new();
    let seq = build_sequence(
        &sources,
        15.0,
        ClipBounds::default(),
        &mut StdRng::seed_from_u64(4),
        &log,
    )
    .unwrap();
    let events = log.events();
    assert_eq!(events.len(), seq.len() + 1);
    match events.last() {
        Some(RunEvent::PlanComplete { clips, total_sec }) => {
            assert_eq!(*clips, seq.len());
            assert!((total_sec - seq.total_length_sec()).abs() < 1e-9);
        }
        other => panic!("unexpected last event {other:?}"),
    }
    if let Some(RunEvent::ClipPlanned { clip, source, .. }) = events.first() {
        assert_eq!(*clip, 0);
        assert_eq!(source, &seq.iter().next().unwrap().source.name);
    } else {
        panic!("first event should be ClipPlanned");
    }
}
