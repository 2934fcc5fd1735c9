use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelmixError, ReelmixResult};
use crate::render::frame::FrameRGBA;

/// Configuration provided to a [`FrameSink`] when recording starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Finished recording: encoded bytes in arrival order, tagged with their content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaArtifact {
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// Number of encoder chunks the bytes were assembled from.
    pub chunk_count: usize,
}

impl MediaArtifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Container-derived file name offered for download.
    pub fn suggested_file_name(&self) -> &'static str {
        let essence = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        match essence {
            "video/mp4" => "final_video.mp4",
            "video/webm" => "final_video.webm",
            "video/x-raw" => "final_video.rgba",
            _ => "final_video.bin",
        }
    }

    /// Write the bytes to `path`, creating parent directories.
    pub fn write_to(&self, path: impl AsRef<Path>) -> ReelmixResult<()> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("failed to write artifact '{}'", path.display()))?;
        Ok(())
    }
}

/// Sink contract for consuming composited frames in output order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order between
/// one `begin` and one `end`.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> ReelmixResult<()>;
    /// Push one frame in strictly increasing output order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelmixResult<()>;
    /// Called once after the last frame; returns the finished recording.
    fn end(&mut self) -> ReelmixResult<MediaArtifact>;
}

/// In-memory sink for tests and debugging.
///
/// Keeps every frame; the artifact it returns carries no bytes.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Whether `end` has been called since the last `begin`.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelmixResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelmixResult<()> {
        if self.cfg.is_none() || self.ended {
            return Err(ReelmixError::encode("in-memory sink is not recording"));
        }
        if let Some((last, _)) = self.frames.last()
            && idx <= *last
        {
            return Err(ReelmixError::encode(
                "in-memory sink received out-of-order frame index",
            ));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> ReelmixResult<MediaArtifact> {
        if self.cfg.is_none() {
            return Err(ReelmixError::encode("in-memory sink not started"));
        }
        self.ended = true;
        Ok(MediaArtifact {
            bytes: Vec::new(),
            content_type: "application/x-reelmix-frames".to_owned(),
            chunk_count: 0,
        })
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelmixResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
