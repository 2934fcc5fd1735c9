use crate::encode::recorder::{CodecConfig, Encoder};
use crate::encode::sink::SinkConfig;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelmixError, ReelmixResult};
use crate::render::composite::flatten_over_bg;
use crate::render::frame::FrameRGBA;

/// In-process encoder producing uncompressed RGBA frames.
///
/// Frames are flattened over opaque black and emitted as one chunk each. Only the `rawvideo`
/// codec is accepted, so a request for anything else goes through the recording sink's fallback.
#[derive(Debug, Default)]
pub struct RawEncoder {
    cfg: Option<SinkConfig>,
    frames_encoded: u64,
}

impl RawEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_encoded(&self) -> u64 {
        self.frames_encoded
    }
}

impl Encoder for RawEncoder {
    fn open(&mut self, cfg: &SinkConfig, codec: Option<&CodecConfig>) -> ReelmixResult<String> {
        if let Some(codec) = codec
            && codec.codec != "rawvideo"
        {
            return Err(ReelmixError::codec_rejected(format!(
                "raw encoder cannot produce '{}'",
                codec.codec
            )));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ReelmixError::validation(
                "raw encoder width/height must be non-zero",
            ));
        }
        self.cfg = Some(*cfg);
        self.frames_encoded = 0;
        Ok(format!(
            "video/x-raw; format=rgba; width={}; height={}; framerate={}/{}",
            cfg.width, cfg.height, cfg.fps.num, cfg.fps.den
        ))
    }

    fn encode(
        &mut self,
        _idx: FrameIndex,
        frame: &FrameRGBA,
        chunks: &mut dyn FnMut(Vec<u8>),
    ) -> ReelmixResult<()> {
        if self.cfg.is_none() {
            return Err(ReelmixError::encode("raw encoder not opened"));
        }
        let mut out = vec![0u8; frame.data.len()];
        flatten_over_bg(&frame.data, &mut out, [0, 0, 0, 255])?;
        chunks(out);
        self.frames_encoded += 1;
        Ok(())
    }

    fn finish(&mut self, _chunks: &mut dyn FnMut(Vec<u8>)) -> ReelmixResult<()> {
        self.cfg
            .take()
            .map(|_| ())
            .ok_or_else(|| ReelmixError::encode("raw encoder not opened"))
    }
}
