use super::*;

fn source(name: &str) -> SourceFile {
    SourceFile::new(name, format!("{name}.mp4"), 2.0, 16, 8)
}

#[test]
fn load_seek_play_then_frames_follow_time() {
    let factory = SyntheticDecoderFactory::new(10.0);
    let mut dec = factory.create_decoder(0).unwrap();

    let meta = dec.load(&source("a")).unwrap();
    assert_eq!((meta.width, meta.height), (16, 8));
    dec.seek(0.5).unwrap();
    dec.play().unwrap();

    let first = dec.frame_at(0.5).unwrap().clone();
    assert!((first.pts_sec - 0.5).abs() < 1e-9);
    assert_eq!(first.image.width, 16);

    let later = dec.frame_at(1.26).unwrap();
    assert!((later.pts_sec - 1.2).abs() < 1e-9);
    assert_ne!(later.image.data, first.image.data);
}

#[test]
fn frames_hold_at_end_of_source() {
    let factory = SyntheticDecoderFactory::new(10.0);
    let mut dec = factory.create_decoder(0).unwrap();
    dec.load(&source("a")).unwrap();
    dec.seek(1.5).unwrap();
    dec.play().unwrap();
    let pts = dec.frame_at(99.0).unwrap().pts_sec;
    assert!((pts - 1.9).abs() < 1e-9);
}

#[test]
fn frames_before_play_are_rejected() {
    let factory = SyntheticDecoderFactory::default();
    let mut dec = factory.create_decoder(0).unwrap();
    dec.load(&source("a")).unwrap();
    assert!(dec.frame_at(0.0).is_err());
    assert!(dec.play().is_err());
}

#[test]
fn faults_fire_only_for_named_source() {
    let factory = SyntheticDecoderFactory::default()
        .with_fault("bad", SyntheticFault::Seek)
        .with_fault("mute", SyntheticFault::Play);
    let mut dec = factory.create_decoder(0).unwrap();

    dec.load(&source("bad")).unwrap();
    assert!(dec.seek(0.0).is_err());

    dec.load(&source("mute")).unwrap();
    dec.seek(0.0).unwrap();
    assert!(dec.play().is_err());

    dec.load(&source("good")).unwrap();
    dec.seek(0.0).unwrap();
    dec.play().unwrap();
}

#[test]
fn colors_are_stable_per_name() {
    assert_eq!(synthetic_color("a.mp4"), synthetic_color("a.mp4"));
    assert_ne!(synthetic_color("a.mp4"), synthetic_color("b.mp4"));
}
