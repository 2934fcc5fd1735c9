use crate::foundation::error::ReelmixResult;
use crate::media::source::SourceFile;
use crate::render::frame::FrameRGBA;

/// Properties a decoder reports once it has bound to a source.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct SourceMetadata {
    /// Decoded frame width in pixels.
    pub width: u32,
    /// Decoded frame height in pixels.
    pub height: u32,
    /// Duration in seconds as seen by the decoder.
    pub duration_sec: f64,
}

/// One decoded source frame.
#[derive(Clone, Debug)]
pub struct DecodedFrame {
    /// Presentation time in source seconds.
    pub pts_sec: f64,
    pub image: FrameRGBA,
}

/// Decode/seek capability for one slot.
///
/// A decoder is bound to one source at a time. The preload pipeline calls [`load`] then
/// [`seek`]; both must succeed before the slot counts as ready. The driver then calls [`play`]
/// once and pulls frames with [`frame_at`] at non-decreasing source times.
///
/// [`load`]: VideoDecoder::load
/// [`seek`]: VideoDecoder::seek
/// [`play`]: VideoDecoder::play
/// [`frame_at`]: VideoDecoder::frame_at
pub trait VideoDecoder: Send {
    /// Bind to `source` and read its metadata. Replaces any previous binding.
    fn load(&mut self, source: &SourceFile) -> ReelmixResult<SourceMetadata>;

    /// Position the decoder at `time_sec`; returns once a frame at that position is decodable.
    fn seek(&mut self, time_sec: f64) -> ReelmixResult<()>;

    /// Begin playback from the seek position.
    fn play(&mut self) -> ReelmixResult<()>;

    /// The latest frame whose timestamp is `<= time_sec` (or the first frame when `time_sec`
    /// precedes it). Holds the last frame once the source runs out.
    fn frame_at(&mut self, time_sec: f64) -> ReelmixResult<&DecodedFrame>;
}

/// Creates one decoder per decode slot.
pub trait DecoderFactory {
    fn create_decoder(&self, slot: usize) -> ReelmixResult<Box<dyn VideoDecoder>>;
}
