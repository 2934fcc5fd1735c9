use rayon::prelude::*;

use crate::foundation::core::Rect;
use crate::foundation::error::{ReelmixError, ReelmixResult};
use crate::render::frame::FrameRGBA;

/// Resample `crop` of `src` to fill `dst`, optionally mirrored horizontally.
///
/// Bilinear filtering on premultiplied bytes, pixel centers mapped to pixel centers. Rows are
/// processed in parallel.
pub fn sample_crop(src: &FrameRGBA, crop: Rect, flip: bool, dst: &mut FrameRGBA) -> ReelmixResult<()> {
    if src.width == 0 || src.height == 0 || dst.width == 0 || dst.height == 0 {
        return Err(ReelmixError::validation("cannot sample an empty frame"));
    }
    if crop.width() <= 0.0 || crop.height() <= 0.0 {
        return Err(ReelmixError::validation(format!(
            "crop rect must have positive size, got {crop:?}"
        )));
    }
    if src.data.len() != src.canvas().rgba_len() || dst.data.len() != dst.canvas().rgba_len() {
        return Err(ReelmixError::validation(
            "sample_crop expects tightly packed rgba8 buffers",
        ));
    }

    let src_w = src.width as usize;
    let src_h = src.height as usize;
    let max_x = (src_w - 1) as f64;
    let max_y = (src_h - 1) as f64;
    let out_w = dst.width as usize;
    let sx_scale = crop.width() / dst.width as f64;
    let sy_scale = crop.height() / dst.height as f64;
    let src_data = &src.data;

    dst.data
        .par_chunks_exact_mut(out_w * 4)
        .enumerate()
        .for_each(|(oy, row)| {
            let sy = (crop.y0 + (oy as f64 + 0.5) * sy_scale - 0.5).clamp(0.0, max_y);
            let y0 = sy.floor() as usize;
            let y1 = (y0 + 1).min(src_h - 1);
            let fy = sy - y0 as f64;

            for (ox, px) in row.chunks_exact_mut(4).enumerate() {
                let col = if flip { out_w - 1 - ox } else { ox };
                let sx = (crop.x0 + (col as f64 + 0.5) * sx_scale - 0.5).clamp(0.0, max_x);
                let x0 = sx.floor() as usize;
                let x1 = (x0 + 1).min(src_w - 1);
                let fx = sx - x0 as f64;

                let i00 = (y0 * src_w + x0) * 4;
                let i10 = (y0 * src_w + x1) * 4;
                let i01 = (y1 * src_w + x0) * 4;
                let i11 = (y1 * src_w + x1) * 4;
                for c in 0..4 {
                    let top = lerp(f64::from(src_data[i00 + c]), f64::from(src_data[i10 + c]), fx);
                    let bottom =
                        lerp(f64::from(src_data[i01 + c]), f64::from(src_data[i11 + c]), fx);
                    px[c] = lerp(top, bottom, fy).round().clamp(0.0, 255.0) as u8;
                }
            }
        });
    dst.premultiplied = true;
    Ok(())
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
#[path = "../../tests/unit/render/sample.rs"]
mod tests;
