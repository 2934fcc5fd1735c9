use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert!(Fps::new(30000, 1001).is_ok());
}

#[test]
fn fps_frame_conversions() {
    let fps = Fps::new(30, 1).unwrap();
    assert!((fps.frame_duration_secs() - 1.0 / 30.0).abs() < 1e-12);
    assert!((fps.frames_to_secs(45) - 1.5).abs() < 1e-12);
    assert_eq!(fps.secs_to_frames_floor(1.49), 44);
}

#[test]
fn ceil_frames_covers_target_without_overshooting_exact_products() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.secs_to_frames_ceil(2.5), 75);
    assert_eq!(fps.secs_to_frames_ceil(5.0), 150);
    assert_eq!(fps.secs_to_frames_ceil(0.01), 1);
    assert_eq!(fps.secs_to_frames_ceil(1.0 / 3.0), 10);

    let ntsc = Fps::new(30000, 1001).unwrap();
    assert_eq!(ntsc.secs_to_frames_ceil(1.0), 30);
}

#[test]
fn canvas_aspect_and_len() {
    let c = Canvas {
        width: 1920,
        height: 1080,
    };
    assert!((c.aspect() - 16.0 / 9.0).abs() < 1e-12);
    assert_eq!(c.rgba_len(), 1920 * 1080 * 4);
}
