use super::*;

#[test]
fn over_opaque_replaces() {
    assert_eq!(over([10, 20, 30, 255], [1, 2, 3, 255], 1.0), [1, 2, 3, 255]);
}

#[test]
fn over_zero_opacity_keeps_dst() {
    assert_eq!(over([10, 20, 30, 255], [1, 2, 3, 255], 0.0), [10, 20, 30, 255]);
}

#[test]
fn over_half_opacity_mixes() {
    let out = over([0, 0, 0, 255], [255, 255, 255, 255], 0.5);
    for c in &out[..3] {
        assert!((127..=129).contains(c), "{out:?}");
    }
    assert_eq!(out[3], 255);
}

#[test]
fn over_in_place_checks_lengths() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], 1.0).is_err());
}

#[test]
fn over_in_place_opaque_copies() {
    let mut dst = vec![9u8; 8];
    let src = vec![1, 2, 3, 255, 4, 5, 6, 255];
    over_in_place(&mut dst, &src, 1.0).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_alpha_0_returns_bg() {
    let mut dst = vec![0u8; 4];
    flatten_over_bg(&[0, 0, 0, 0], &mut dst, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_alpha_255_is_identity() {
    let src = [1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_over_bg(&src, &mut dst, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src.to_vec());
}

#[test]
fn fill_paints_every_pixel() {
    let mut buf = vec![0u8; 12];
    fill(&mut buf, [1, 2, 3, 4]);
    assert!(buf.chunks_exact(4).all(|p| p == [1, 2, 3, 4]));
}
