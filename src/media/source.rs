use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::error::{ReelmixError, ReelmixResult};

/// A decodable video asset.
///
/// Immutable once loaded. The caller owns the pool; the engine holds `Arc` references.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SourceFile {
    /// Human-readable identifier (file name for probed sources).
    pub name: String,
    /// Location handed to decoders.
    pub path: PathBuf,
    /// Total duration in seconds.
    pub duration_sec: f64,
    /// Native width in pixels.
    pub width: u32,
    /// Native height in pixels.
    pub height: u32,
}

impl SourceFile {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        duration_sec: f64,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            duration_sec,
            width,
            height,
        }
    }

    /// Probe a file on disk through `ffprobe`.
    pub fn probe(path: impl AsRef<Path>) -> ReelmixResult<Self> {
        let path = path.as_ref();
        let info = probe_video(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        tracing::info!(
            source = %name,
            duration_sec = info.duration_sec,
            width = info.width,
            height = info.height,
            "loaded source metadata"
        );
        Ok(Self {
            name,
            path: path.to_path_buf(),
            duration_sec: info.duration_sec,
            width: info.width,
            height: info.height,
        })
    }

    /// Check the preconditions the scheduler relies on.
    pub fn validate(&self) -> ReelmixResult<()> {
        if !self.duration_sec.is_finite() || self.duration_sec <= 0.0 {
            return Err(ReelmixError::validation(format!(
                "source '{}' must have a positive finite duration, got {}",
                self.name, self.duration_sec
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ReelmixError::validation(format!(
                "source '{}' has zero pixel dimensions",
                self.name
            )));
        }
        Ok(())
    }
}

/// Validate a whole pool before planning.
pub fn validate_sources(sources: &[Arc<SourceFile>]) -> ReelmixResult<()> {
    if sources.is_empty() {
        return Err(ReelmixError::validation(
            "at least one source file is required",
        ));
    }
    for s in sources {
        s.validate()?;
    }
    Ok(())
}

/// Stream metadata reported by `ffprobe`.
///
/// `width`/`height` are display dimensions: a stream carrying a 90 or 270 degree rotation has
/// its coded size swapped, matching the frames `ffmpeg` emits when it auto-rotates.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoSourceInfo {
    pub width: u32,
    pub height: u32,
    pub duration_sec: f64,
    /// Display rotation in degrees, normalized to `0..360`.
    pub rotation_deg: u32,
}

/// Probe source video metadata through `ffprobe`.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> ReelmixResult<VideoSourceInfo> {
    let name = source_path.display().to_string();
    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| probe_err(&name, format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(probe_err(
            &name,
            format!("ffprobe failed: {}", String::from_utf8_lossy(&out.stderr).trim()),
        ));
    }
    parse_probe_json(&name, &out.stdout)
}

#[cfg(feature = "media-ffmpeg")]
fn probe_err(name: &str, msg: String) -> ReelmixError {
    ReelmixError::decode(name, crate::foundation::error::DecodeStage::Metadata, msg)
}

/// Extract video metadata from `ffprobe -show_streams -show_format` JSON output.
#[cfg(feature = "media-ffmpeg")]
pub fn parse_probe_json(name: &str, json: &[u8]) -> ReelmixResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeSideData {
        rotation: Option<f64>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeTags {
        rotate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        duration: Option<String>,
        tags: Option<ProbeTags>,
        #[serde(default)]
        side_data_list: Vec<ProbeSideData>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| probe_err(name, format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| probe_err(name, "no video stream found".to_owned()))?;
    let width = video_stream
        .width
        .ok_or_else(|| probe_err(name, "missing video width from ffprobe".to_owned()))?;
    let height = video_stream
        .height
        .ok_or_else(|| probe_err(name, "missing video height from ffprobe".to_owned()))?;

    // Container duration first; some muxers only fill the stream-level one.
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video_stream.duration.as_deref())
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| probe_err(name, "missing duration from ffprobe".to_owned()))?;

    // Display matrix side data on current ffprobe, the `rotate` tag on older builds.
    let rotation = video_stream
        .side_data_list
        .iter()
        .find_map(|d| d.rotation)
        .or_else(|| {
            video_stream
                .tags
                .as_ref()
                .and_then(|t| t.rotate.as_deref())
                .and_then(|r| r.trim().parse::<f64>().ok())
        })
        .unwrap_or(0.0);
    let rotation_deg = normalize_rotation(rotation);
    let (width, height) = if rotation_deg % 180 == 90 {
        (height, width)
    } else {
        (width, height)
    };

    Ok(VideoSourceInfo {
        width,
        height,
        duration_sec,
        rotation_deg,
    })
}

/// Snap a rotation in degrees to a quarter turn within `0..360`.
pub fn normalize_rotation(degrees: f64) -> u32 {
    if !degrees.is_finite() {
        return 0;
    }
    let quarter_turns = (degrees / 90.0).round() as i64;
    (quarter_turns.rem_euclid(4) * 90) as u32
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Probe source video metadata through `ffprobe`.
///
/// Returns an error when `media-ffmpeg` feature is disabled.
pub fn probe_video(_source_path: &Path) -> ReelmixResult<VideoSourceInfo> {
    Err(ReelmixError::validation(
        "probing video files requires the 'media-ffmpeg' feature",
    ))
}
