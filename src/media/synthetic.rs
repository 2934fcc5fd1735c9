use std::collections::HashMap;

use crate::foundation::error::{ReelmixError, ReelmixResult};
use crate::foundation::math::Fnv1a64;
use crate::media::decoder::{DecodedFrame, DecoderFactory, SourceMetadata, VideoDecoder};
use crate::media::source::SourceFile;
use crate::render::frame::FrameRGBA;

/// Where a [`SyntheticDecoder`] should fail for a given source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntheticFault {
    Metadata,
    Seek,
    Play,
}

/// Factory for [`SyntheticDecoder`]s, for tests and debugging.
#[derive(Clone, Debug)]
pub struct SyntheticDecoderFactory {
    frame_rate: f64,
    faults: HashMap<String, SyntheticFault>,
}

impl Default for SyntheticDecoderFactory {
    fn default() -> Self {
        Self::new(30.0)
    }
}

impl SyntheticDecoderFactory {
    pub fn new(frame_rate: f64) -> Self {
        Self {
            frame_rate,
            faults: HashMap::new(),
        }
    }

    /// Make every decoder fail at `fault` when bound to the source called `source_name`.
    pub fn with_fault(mut self, source_name: impl Into<String>, fault: SyntheticFault) -> Self {
        self.faults.insert(source_name.into(), fault);
        self
    }
}

impl DecoderFactory for SyntheticDecoderFactory {
    fn create_decoder(&self, _slot: usize) -> ReelmixResult<Box<dyn VideoDecoder>> {
        Ok(Box::new(SyntheticDecoder {
            frame_rate: self.frame_rate,
            faults: self.faults.clone(),
            bound: None,
            position_sec: None,
            playing: false,
            current: None,
        }))
    }
}

#[derive(Debug)]
struct Bound {
    name: String,
    width: u32,
    height: u32,
    duration_sec: f64,
    color: [u8; 3],
}

/// Decoder that paints frames procedurally instead of reading a file.
///
/// Each source gets a flat color derived from its name, with a white column whose position
/// follows the frame timestamp. Frames are fully opaque.
#[derive(Debug)]
pub struct SyntheticDecoder {
    frame_rate: f64,
    faults: HashMap<String, SyntheticFault>,
    bound: Option<Bound>,
    position_sec: Option<f64>,
    playing: bool,
    current: Option<DecodedFrame>,
}

impl SyntheticDecoder {
    fn fault(&self, name: &str, at: SyntheticFault) -> bool {
        self.faults.get(name) == Some(&at)
    }

    fn bound(&self) -> ReelmixResult<&Bound> {
        self.bound
            .as_ref()
            .ok_or_else(|| fault_err("synthetic decoder has no bound source"))
    }

    fn quantize(&self, duration_sec: f64, t: f64) -> f64 {
        let frame = 1.0 / self.frame_rate;
        let last = (duration_sec - frame).max(0.0);
        ((t.max(0.0) / frame + 1e-9).floor() * frame).min(last)
    }
}

fn fault_err(msg: impl std::fmt::Display) -> ReelmixError {
    ReelmixError::Other(anyhow::anyhow!("{msg}"))
}

/// Paint one synthetic frame.
pub fn synthetic_frame(
    width: u32,
    height: u32,
    color: [u8; 3],
    duration_sec: f64,
    pts_sec: f64,
) -> FrameRGBA {
    let mut frame = FrameRGBA::blank(width, height);
    let progress = if duration_sec > 0.0 {
        (pts_sec / duration_sec).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let marker_x = ((f64::from(width.saturating_sub(1))) * progress).round() as u32;
    for (i, px) in frame.data.chunks_exact_mut(4).enumerate() {
        let x = (i as u32) % width;
        if x == marker_x {
            px.copy_from_slice(&[255, 255, 255, 255]);
        } else {
            px.copy_from_slice(&[color[0], color[1], color[2], 255]);
        }
    }
    frame
}

/// Flat color assigned to a synthetic source.
pub fn synthetic_color(name: &str) -> [u8; 3] {
    let mut h = Fnv1a64::new_default();
    h.write_bytes(name.as_bytes());
    let v = h.finish().to_le_bytes();
    // Keep clear of pure white so the time marker stays distinguishable.
    [v[0] % 224, v[1] % 224, v[2] % 224]
}

impl VideoDecoder for SyntheticDecoder {
    fn load(&mut self, source: &SourceFile) -> ReelmixResult<SourceMetadata> {
        self.bound = None;
        self.position_sec = None;
        self.playing = false;
        self.current = None;

        if self.fault(&source.name, SyntheticFault::Metadata) {
            return Err(fault_err("synthetic metadata fault"));
        }
        self.bound = Some(Bound {
            name: source.name.clone(),
            width: source.width,
            height: source.height,
            duration_sec: source.duration_sec,
            color: synthetic_color(&source.name),
        });
        Ok(SourceMetadata {
            width: source.width,
            height: source.height,
            duration_sec: source.duration_sec,
        })
    }

    fn seek(&mut self, time_sec: f64) -> ReelmixResult<()> {
        let b = self.bound()?;
        if self.fault(&b.name, SyntheticFault::Seek) {
            return Err(fault_err("synthetic seek fault"));
        }
        if time_sec > b.duration_sec {
            return Err(fault_err(format!(
                "seek to {time_sec:.3}s past end of {:.3}s source",
                b.duration_sec
            )));
        }
        self.position_sec = Some(time_sec);
        self.playing = false;
        self.current = None;
        Ok(())
    }

    fn play(&mut self) -> ReelmixResult<()> {
        let b = self.bound()?;
        if self.fault(&b.name, SyntheticFault::Play) {
            return Err(fault_err("synthetic play fault"));
        }
        if self.position_sec.is_none() {
            return Err(fault_err("play requested before seek"));
        }
        self.playing = true;
        Ok(())
    }

    fn frame_at(&mut self, time_sec: f64) -> ReelmixResult<&DecodedFrame> {
        if !self.playing {
            return Err(fault_err("frame requested before play"));
        }
        let b = self.bound()?;
        let pts = self.quantize(b.duration_sec, time_sec);
        let stale = self
            .current
            .as_ref()
            .is_none_or(|f| (f.pts_sec - pts).abs() > f64::EPSILON);
        if stale {
            let image = synthetic_frame(b.width, b.height, b.color, b.duration_sec, pts);
            self.current = Some(DecodedFrame {
                pts_sec: pts,
                image,
            });
        }
        self.current
            .as_ref()
            .ok_or_else(|| fault_err("synthetic frame missing"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/synthetic.rs"]
mod tests;
