use rand::Rng;

use crate::config::EffectParameters;
use crate::foundation::core::{Canvas, Rect};
use crate::foundation::math::{chance_pct, uniform};

/// Largest centered rect of the source with the output's aspect ratio.
///
/// Sources wider than the output keep their full height, taller ones their full width; the crop
/// is never letterboxed.
pub fn base_crop(source_width: u32, source_height: u32, canvas: Canvas) -> Rect {
    let w = f64::from(source_width);
    let h = f64::from(source_height);
    let out_aspect = canvas.aspect();
    if w / h > out_aspect {
        let cw = h * out_aspect;
        let x0 = (w - cw) / 2.0;
        Rect::new(x0, 0.0, x0 + cw, h)
    } else {
        let ch = w / out_aspect;
        let y0 = (h - ch) / 2.0;
        Rect::new(0.0, y0, w, y0 + ch)
    }
}

/// Per-clip visual transform, in source pixel space.
///
/// Chosen once when a clip starts and held for its whole duration.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct TransformConfig {
    pub base_crop: Rect,
    /// Region actually sampled: `base_crop`, or the zoom window inside it.
    pub crop: Rect,
    pub zoom_factor: f64,
    pub zoom_applied: bool,
    pub flip_applied: bool,
}

impl TransformConfig {
    /// Plain aspect crop, no zoom or flip.
    pub fn identity(source_width: u32, source_height: u32, canvas: Canvas) -> Self {
        let base = base_crop(source_width, source_height, canvas);
        Self {
            base_crop: base,
            crop: base,
            zoom_factor: 1.0,
            zoom_applied: false,
            flip_applied: false,
        }
    }

    /// Draw a transform for one clip.
    ///
    /// Random values are consumed in a fixed order (zoom decision, factor, x offset, y offset,
    /// flip decision) so a seeded run reproduces its transforms.
    pub fn sample<R: Rng + ?Sized>(
        source_width: u32,
        source_height: u32,
        canvas: Canvas,
        effects: &EffectParameters,
        rng: &mut R,
    ) -> Self {
        let mut cfg = Self::identity(source_width, source_height, canvas);
        let base = cfg.base_crop;

        if chance_pct(rng, effects.zoom_probability) {
            let factor = uniform(rng, effects.min_zoom, effects.max_zoom) / 100.0;
            let zw = base.width() / factor;
            let zh = base.height() / factor;
            let x0 = base.x0 + uniform(rng, 0.0, (base.width() - zw).max(0.0));
            let y0 = base.y0 + uniform(rng, 0.0, (base.height() - zh).max(0.0));
            cfg.crop = Rect::new(x0, y0, x0 + zw, y0 + zh);
            cfg.zoom_factor = factor;
            cfg.zoom_applied = true;
        }

        cfg.flip_applied = chance_pct(rng, effects.flip_probability);
        cfg
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/transform.rs"]
mod tests;
