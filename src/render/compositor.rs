use crate::config::DissolveMode;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelmixError, ReelmixResult};
use crate::media::decoder::DecodedFrame;
use crate::render::composite::{fill, over_in_place};
use crate::render::frame::FrameRGBA;
use crate::render::sample::sample_crop;
use crate::render::transform::TransformConfig;

/// Everything needed to draw one output frame of a clip.
#[derive(Clone, Copy, Debug)]
pub struct ComposeInput<'a> {
    /// Current source frame.
    pub frame: &'a DecodedFrame,
    pub transform: &'a TransformConfig,
    /// Source time at which the clip starts.
    pub clip_start_sec: f64,
    /// Last composited frame of the previous clip, if any.
    pub previous: Option<&'a FrameRGBA>,
}

/// Draws output frames onto an owned canvas buffer.
///
/// During the first `overlap_sec` of a clip's source time the previous clip's held frame is drawn
/// underneath the current one. [`DissolveMode::Overlay`] then draws the current frame opaque on
/// top; [`DissolveMode::Blend`] ramps its opacity from 0 to 1 across the window.
#[derive(Debug)]
pub struct Compositor {
    canvas: Canvas,
    dissolve: DissolveMode,
    overlap_sec: f64,
    background: Option<[u8; 4]>,
    buffer: FrameRGBA,
    layer: FrameRGBA,
}

impl Compositor {
    pub fn new(canvas: Canvas, dissolve: DissolveMode, overlap_sec: f64) -> Self {
        Self {
            canvas,
            dissolve,
            overlap_sec,
            background: None,
            buffer: FrameRGBA::blank(canvas.width, canvas.height),
            layer: FrameRGBA::blank(canvas.width, canvas.height),
        }
    }

    /// Paint `color` (premultiplied) under every frame instead of clearing to transparent.
    pub fn with_background(mut self, color: Option<[u8; 4]>) -> Self {
        self.background = color;
        self
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Whether `pts_sec` falls inside the overlap window of a clip starting at `clip_start_sec`.
    pub fn in_overlap(&self, pts_sec: f64, clip_start_sec: f64) -> bool {
        pts_sec < clip_start_sec + self.overlap_sec
    }

    /// Opacity of the current frame at `pts_sec`.
    pub fn current_opacity(&self, pts_sec: f64, clip_start_sec: f64, has_previous: bool) -> f32 {
        match self.dissolve {
            DissolveMode::Overlay => 1.0,
            DissolveMode::Blend => {
                if !has_previous || self.overlap_sec <= 0.0 || !self.in_overlap(pts_sec, clip_start_sec)
                {
                    return 1.0;
                }
                (((pts_sec - clip_start_sec) / self.overlap_sec).clamp(0.0, 1.0)) as f32
            }
        }
    }

    /// Draw one output frame and hand out a copy of it.
    pub fn compose(&mut self, input: ComposeInput<'_>) -> ReelmixResult<FrameRGBA> {
        match self.background {
            Some(color) => fill(&mut self.buffer.data, color),
            None => self.buffer.data.fill(0),
        }

        let pts = input.frame.pts_sec;
        let previous = input
            .previous
            .filter(|_| self.in_overlap(pts, input.clip_start_sec));
        if let Some(prev) = previous {
            if prev.canvas() != self.canvas {
                return Err(ReelmixError::validation(format!(
                    "held frame is {}x{}, canvas is {}x{}",
                    prev.width, prev.height, self.canvas.width, self.canvas.height
                )));
            }
            over_in_place(&mut self.buffer.data, &prev.data, 1.0)?;
        }

        let t = input.transform;
        sample_crop(&input.frame.image, t.crop, t.flip_applied, &mut self.layer)?;
        let opacity = self.current_opacity(pts, input.clip_start_sec, previous.is_some());
        over_in_place(&mut self.buffer.data, &self.layer.data, opacity)?;

        Ok(self.buffer.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
