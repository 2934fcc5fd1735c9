use std::sync::Arc;

use crate::encode::sink::{FrameSink, MediaArtifact, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelmixError, ReelmixResult};
use crate::render::frame::FrameRGBA;
use crate::session::events::{RunEvent, RunObserver};

/// Codec request handed to an [`Encoder`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CodecConfig {
    /// Codec string, e.g. `avc1.42E01E`.
    pub codec: String,
    /// Full MIME type of the produced stream.
    pub mime_type: String,
    pub bitrate_bps: u64,
}

impl CodecConfig {
    /// H.264 Baseline level 3.0 in MP4 at 8 Mbit/s.
    pub fn h264_baseline() -> Self {
        Self {
            codec: "avc1.42E01E".to_owned(),
            mime_type: "video/mp4; codecs=\"avc1.42E01E\"".to_owned(),
            bitrate_bps: 8_000_000,
        }
    }

    /// Uncompressed RGBA.
    pub fn rawvideo() -> Self {
        Self {
            codec: "rawvideo".to_owned(),
            mime_type: "video/x-raw".to_owned(),
            bitrate_bps: 0,
        }
    }
}

/// Encoding capability behind [`RecordingSink`].
///
/// Encoded output is delivered as byte chunks through the `chunks` callback whenever the encoder
/// has some ready; chunks must be emitted in stream order.
pub trait Encoder: Send {
    /// Prepare to encode. `codec: None` selects the encoder's defaults. Returns the content type
    /// of the stream that will be produced, or [`ReelmixError::CodecRejected`] when the codec
    /// cannot be honored.
    fn open(&mut self, cfg: &SinkConfig, codec: Option<&CodecConfig>) -> ReelmixResult<String>;
    /// Encode one frame.
    fn encode(
        &mut self,
        idx: FrameIndex,
        frame: &FrameRGBA,
        chunks: &mut dyn FnMut(Vec<u8>),
    ) -> ReelmixResult<()>;
    /// Flush everything still buffered and close the stream.
    fn finish(&mut self, chunks: &mut dyn FnMut(Vec<u8>)) -> ReelmixResult<()>;
}

struct ChunkCollector {
    observer: Arc<dyn RunObserver>,
    bytes: Vec<u8>,
    count: usize,
}

impl ChunkCollector {
    fn push(&mut self, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        self.observer
            .on_event(&RunEvent::ChunkReceived { bytes: chunk.len() });
        self.bytes.extend_from_slice(&chunk);
        self.count += 1;
    }
}

/// [`FrameSink`] that records through an [`Encoder`].
///
/// Opens the encoder with the preferred codec and falls back to the encoder's defaults when the
/// codec is rejected. Chunks are accumulated in arrival order; `end` returns their
/// concatenation tagged with the negotiated content type.
pub struct RecordingSink<E: Encoder> {
    encoder: E,
    preferred: Option<CodecConfig>,
    collector: ChunkCollector,
    cfg: Option<SinkConfig>,
    content_type: Option<String>,
    last_idx: Option<FrameIndex>,
}

impl<E: Encoder> RecordingSink<E> {
    /// Sink preferring H.264 Baseline.
    pub fn new(encoder: E, observer: Arc<dyn RunObserver>) -> Self {
        Self::with_codec(encoder, Some(CodecConfig::h264_baseline()), observer)
    }

    pub fn with_codec(
        encoder: E,
        preferred: Option<CodecConfig>,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        Self {
            encoder,
            preferred,
            collector: ChunkCollector {
                observer,
                bytes: Vec::new(),
                count: 0,
            },
            cfg: None,
            content_type: None,
            last_idx: None,
        }
    }

    /// Content type negotiated in `begin`.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }
}

impl<E: Encoder> FrameSink for RecordingSink<E> {
    fn begin(&mut self, cfg: SinkConfig) -> ReelmixResult<()> {
        let content_type = match self.encoder.open(&cfg, self.preferred.as_ref()) {
            Ok(ct) => ct,
            Err(ReelmixError::CodecRejected(reason)) => {
                let preferred = self
                    .preferred
                    .as_ref()
                    .map(|c| c.codec.clone())
                    .unwrap_or_default();
                tracing::warn!(%preferred, %reason, "preferred codec rejected, using encoder defaults");
                self.collector.observer.on_event(&RunEvent::CodecFallback {
                    preferred,
                    reason,
                });
                self.encoder.open(&cfg, None)?
            }
            Err(e) => return Err(e),
        };

        self.collector.bytes.clear();
        self.collector.count = 0;
        self.content_type = Some(content_type);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelmixResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelmixError::encode("recording sink not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(ReelmixError::encode(
                "recording sink received out-of-order frame index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ReelmixError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.last_idx = Some(idx);

        let Self {
            encoder, collector, ..
        } = self;
        encoder.encode(idx, frame, &mut |chunk| collector.push(chunk))
    }

    fn end(&mut self) -> ReelmixResult<MediaArtifact> {
        if self.cfg.take().is_none() {
            return Err(ReelmixError::encode("recording sink not started"));
        }
        let Self {
            encoder, collector, ..
        } = self;
        encoder.finish(&mut |chunk| collector.push(chunk))?;

        let content_type = self
            .content_type
            .take()
            .unwrap_or_else(|| "application/octet-stream".to_owned());
        Ok(MediaArtifact {
            bytes: std::mem::take(&mut self.collector.bytes),
            content_type,
            chunk_count: std::mem::take(&mut self.collector.count),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/recorder.rs"]
mod tests;
