use super::*;

fn pacer(target_sec: f64) -> Pacer {
    Pacer::new(Duration::from_secs(10), Fps::new(30, 1).unwrap(), target_sec)
}

#[test]
fn frame_budget_is_ceil_of_target() {
    assert_eq!(pacer(2.0).target_frames(), 60);
    assert_eq!(pacer(2.01).target_frames(), 61);
    assert_eq!(pacer(0.01).target_frames(), 1);
}

#[test]
fn due_times_are_relative_to_start() {
    let p = pacer(2.0);
    assert_eq!(p.due(0), Duration::from_secs(10));
    let d = p.due(15).as_secs_f64();
    assert!((d - 10.5).abs() < 1e-9);
}

#[test]
fn missed_counts_ticks_behind_clock() {
    let mut p = pacer(2.0);
    assert_eq!(p.missed(p.start()), 0);
    // 0.21s in: frame 6 is current, frames 0..=5 were missed.
    let now = p.start() + Duration::from_millis(210);
    assert_eq!(p.missed(now), 6);
    p.advance();
    p.advance();
    assert_eq!(p.missed(now), 4);
}

#[test]
fn missed_is_capped_by_budget() {
    let p = pacer(1.0);
    let now = p.start() + Duration::from_secs(5);
    assert_eq!(p.missed(now), 30);
}

#[test]
fn deadline_by_time_or_budget() {
    let mut p = pacer(0.1);
    assert!(!p.deadline_reached(p.start()));
    assert!(p.deadline_reached(p.start() + Duration::from_millis(100)));
    for _ in 0..p.target_frames() {
        p.advance();
    }
    assert!(p.deadline_reached(p.start()));
    assert_eq!(p.remaining_frames(), 0);
}

#[test]
fn remaining_time_never_negative() {
    let p = pacer(1.0);
    assert!((p.remaining_sec(p.start() + Duration::from_millis(250)) - 0.75).abs() < 1e-9);
    assert_eq!(p.remaining_sec(p.start() + Duration::from_secs(3)), 0.0);
    // Before start counts as zero elapsed.
    assert_eq!(p.elapsed_sec(Duration::ZERO), 0.0);
}
