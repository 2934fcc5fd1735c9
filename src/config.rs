//! Run parameters.
//!
//! Everything here is supplied once at run start and stays read-only while the engine runs.
//! [`RunConfig::validate`] is the boundary where malformed input is rejected; the engine itself
//! assumes a validated config.

use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelmixError, ReelmixResult};

/// Number of decode slots in the preload ring when not configured.
pub const DEFAULT_SLOTS: usize = 4;

/// Leading window of each clip during which the previous clip is composited underneath.
pub const DEFAULT_OVERLAP_SEC: f64 = 1.0;

/// Clip length bounds as percentages of each source's duration.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ClipBounds {
    /// Minimum clip length, percent of source duration.
    pub min_pct: f64,
    /// Maximum clip length, percent of source duration.
    pub max_pct: f64,
}

impl Default for ClipBounds {
    fn default() -> Self {
        Self {
            min_pct: 10.0,
            max_pct: 30.0,
        }
    }
}

/// Process-wide effect parameters, all percentages.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EffectParameters {
    /// Chance that a clip gets a static zoom window.
    pub zoom_probability: f64,
    /// Smallest zoom, in percent (100 = no magnification).
    pub min_zoom: f64,
    /// Largest zoom, in percent.
    pub max_zoom: f64,
    /// Chance that a clip is mirrored horizontally.
    pub flip_probability: f64,
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            zoom_probability: 30.0,
            min_zoom: 110.0,
            max_zoom: 150.0,
            flip_probability: 20.0,
        }
    }
}

/// How the previous clip's held frame is combined with the incoming clip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DissolveMode {
    /// Previous frame underneath, incoming frame fully opaque on top.
    #[default]
    Overlay,
    /// Incoming frame opacity ramps from 0 to 1 across the overlap window.
    Blend,
}

/// Output frame geometry and rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub fps: Fps,
    /// Premultiplied RGBA fill painted under every frame. `None` clears to transparent black.
    pub background: Option<[u8; 4]>,
}

impl OutputSettings {
    pub fn canvas(self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: Fps::default(),
            background: None,
        }
    }
}

/// Complete set of run parameters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Requested output duration in seconds.
    pub target_duration_sec: f64,
    pub clip: ClipBounds,
    pub effects: EffectParameters,
    pub output: OutputSettings,
    /// Size of the decode slot ring.
    pub slots: usize,
    /// Cross-dissolve window in seconds of clip source time.
    pub overlap_sec: f64,
    pub dissolve: DissolveMode,
    /// Seed for planning and per-clip transforms. `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_duration_sec: 30.0,
            clip: ClipBounds::default(),
            effects: EffectParameters::default(),
            output: OutputSettings::default(),
            slots: DEFAULT_SLOTS,
            overlap_sec: DEFAULT_OVERLAP_SEC,
            dissolve: DissolveMode::default(),
            seed: None,
        }
    }
}

impl RunConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> ReelmixResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read run config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes)
            .map_err(|e| ReelmixError::validation(format!("invalid run config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ReelmixResult<()> {
        finite("target_duration_sec", self.target_duration_sec)?;
        if self.target_duration_sec <= 0.0 {
            return Err(ReelmixError::validation(
                "target_duration_sec must be positive",
            ));
        }

        percent("clip.min_pct", self.clip.min_pct)?;
        percent("clip.max_pct", self.clip.max_pct)?;
        if self.clip.min_pct > self.clip.max_pct {
            return Err(ReelmixError::validation(
                "clip.min_pct must be <= clip.max_pct",
            ));
        }
        if self.clip.max_pct <= 0.0 {
            return Err(ReelmixError::validation(
                "clip.max_pct must be > 0 (zero-length clips never reach the target)",
            ));
        }

        let fx = &self.effects;
        percent("effects.zoom_probability", fx.zoom_probability)?;
        percent("effects.flip_probability", fx.flip_probability)?;
        finite("effects.min_zoom", fx.min_zoom)?;
        finite("effects.max_zoom", fx.max_zoom)?;
        if fx.min_zoom < 100.0 {
            // Below 100% the zoom window would be larger than the crop it must sit inside.
            return Err(ReelmixError::validation("effects.min_zoom must be >= 100"));
        }
        if fx.min_zoom > fx.max_zoom {
            return Err(ReelmixError::validation(
                "effects.min_zoom must be <= effects.max_zoom",
            ));
        }

        if self.output.width == 0 || self.output.height == 0 {
            return Err(ReelmixError::validation(
                "output width/height must be non-zero",
            ));
        }
        Fps::new(self.output.fps.num, self.output.fps.den)?;

        if self.slots < 2 {
            return Err(ReelmixError::validation(
                "slots must be >= 2 (one rendering, one preloading)",
            ));
        }
        finite("overlap_sec", self.overlap_sec)?;
        if self.overlap_sec < 0.0 {
            return Err(ReelmixError::validation("overlap_sec must be >= 0"));
        }
        Ok(())
    }
}

fn finite(name: &str, v: f64) -> ReelmixResult<()> {
    if !v.is_finite() {
        return Err(ReelmixError::validation(format!("{name} must be finite")));
    }
    Ok(())
}

fn percent(name: &str, v: f64) -> ReelmixResult<()> {
    finite(name, v)?;
    if !(0.0..=100.0).contains(&v) {
        return Err(ReelmixError::validation(format!(
            "{name} must be within 0..=100, got {v}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
