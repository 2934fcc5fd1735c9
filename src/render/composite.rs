use crate::foundation::error::{ReelmixError, ReelmixResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

/// Source-over for premultiplied pixels, with an extra opacity on `src`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// [`over`] applied pixel by pixel to two equal-length RGBA8 buffers.
pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> ReelmixResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelmixError::validation(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    if opacity >= 1.0 && src.chunks_exact(4).all(|p| p[3] == 255) {
        dst.copy_from_slice(src);
        return Ok(());
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Fill a buffer with one premultiplied color.
pub fn fill(dst: &mut [u8], color: PremulRgba8) {
    for px in dst.chunks_exact_mut(4) {
        px.copy_from_slice(&color);
    }
}

/// Composite premultiplied pixels over an opaque background, yielding straight RGBA8 with
/// alpha 255.
pub fn flatten_over_bg(src: &[u8], dst: &mut [u8], bg: [u8; 4]) -> ReelmixResult<()> {
    if src.len() != dst.len() || !src.len().is_multiple_of(4) {
        return Err(ReelmixError::validation(
            "flatten_over_bg expects equal-length rgba8 buffers",
        ));
    }
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let inv = 255u16 - u16::from(s[3]);
        for i in 0..3 {
            d[i] = s[i].saturating_add(mul_div255_u8(u16::from(bg[i]), inv));
        }
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
