//! Reelmix assembles a randomized montage from a pool of source videos.
//!
//! A run has two halves:
//!
//! - Plan a [`ScheduledSequence`] of random sub-clips whose lengths sum to the target duration
//! - Play that plan through a ring of preloaded decoders, compositing every output frame on the
//!   CPU and handing it to a [`FrameSink`]
//!
//! [`Engine`] drives both halves and reports progress through a [`RunObserver`].
#![forbid(unsafe_code)]

mod foundation;

/// Run parameters.
pub mod config;
/// Recording sinks and encoders.
pub mod encode;
/// Sources and decoders.
pub mod media;
/// Decode slot ring and background preloading.
pub mod pipeline;
/// Clip planning.
pub mod plan;
/// Per-frame compositing.
pub mod render;
/// Run orchestration.
pub mod session;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Rect};
pub use crate::foundation::error::{DecodeStage, ReelmixError, ReelmixResult};

pub use crate::config::{ClipBounds, DissolveMode, EffectParameters, OutputSettings, RunConfig};
#[cfg(feature = "media-ffmpeg")]
pub use crate::encode::ffmpeg::{FfmpegEncoder, FfmpegEncoderOpts};
pub use crate::encode::raw::RawEncoder;
pub use crate::encode::recorder::{CodecConfig, Encoder, RecordingSink};
pub use crate::encode::sink::{FrameSink, InMemorySink, MediaArtifact, SinkConfig};
pub use crate::media::decoder::{DecodedFrame, DecoderFactory, SourceMetadata, VideoDecoder};
#[cfg(feature = "media-ffmpeg")]
pub use crate::media::ffmpeg::FfmpegDecoderFactory;
pub use crate::media::source::SourceFile;
pub use crate::media::synthetic::{SyntheticDecoderFactory, SyntheticFault};
pub use crate::plan::scheduler::{ClipPlan, ScheduledSequence, build_sequence};
pub use crate::render::frame::FrameRGBA;
pub use crate::render::transform::TransformConfig;
pub use crate::session::clock::{Clock, ManualClock, SystemClock};
pub use crate::session::engine::{ClipReport, Completion, Engine, RunOutcome, RunStats};
pub use crate::session::events::{
    EventLog, NullObserver, RunEvent, RunObserver, RunPhase, TracingObserver,
};
