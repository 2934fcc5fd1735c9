use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(128, 255), 128);
    assert_eq!(mul_div255_u8(255, 0), 0);
}

#[test]
fn fnv_is_stable() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"clip.mp4");
    let mut b = Fnv1a64::new_default();
    b.write_bytes(b"clip.mp4");
    assert_eq!(a.finish(), b.finish());

    let mut c = Fnv1a64::new_default();
    c.write_bytes(b"other.mp4");
    assert_ne!(a.finish(), c.finish());
}

#[test]
fn uniform_stays_in_half_open_interval() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..1000 {
        let v = uniform(&mut rng, 2.0, 5.0);
        assert!((2.0..5.0).contains(&v));
    }
    assert_eq!(uniform(&mut rng, 4.0, 4.0), 4.0);
}

#[test]
fn uniform_with_inverted_bounds_returns_lo() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..100 {
        assert_eq!(uniform(&mut rng, 3.0, 1.0), 3.0);
    }
}

#[test]
fn uniform_consumes_one_draw_even_when_empty() {
    let mut a = StdRng::seed_from_u64(12);
    let mut b = StdRng::seed_from_u64(12);
    uniform(&mut a, 1.0, 1.0);
    let _: f64 = b.random();
    assert_eq!(uniform(&mut a, 0.0, 1.0), uniform(&mut b, 0.0, 1.0));
}

#[test]
fn chance_pct_extremes() {
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..200 {
        assert!(!chance_pct(&mut rng, 0.0));
        assert!(chance_pct(&mut rng, 100.0));
    }
}
