use std::fmt;

/// Result alias used across the crate.
pub type ReelmixResult<T> = Result<T, ReelmixError>;

/// The step of a preload that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeStage {
    /// Binding the decoder to the source and reading its metadata.
    Metadata,
    /// Seeking to the clip start offset.
    Seek,
    /// Pulling frames while the clip plays.
    Frame,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Metadata => "metadata",
            Self::Seek => "seek",
            Self::Frame => "frame",
        })
    }
}

/// Crate error type.
#[derive(thiserror::Error, Debug)]
pub enum ReelmixError {
    /// Malformed or missing run parameters. The run never starts.
    #[error("validation error: {0}")]
    Validation(String),

    /// A source failed to load metadata, seek or decode. Fatal for the run.
    #[error("decode error ({stage}) for '{source_name}': {message}")]
    Decode {
        /// Name of the offending source.
        source_name: String,
        /// Which acknowledgement failed.
        stage: DecodeStage,
        /// Decoder message.
        message: String,
    },

    /// A bound clip failed to begin playback. Fatal for the run.
    #[error("playback start error for '{source_name}': {message}")]
    PlaybackStart {
        /// Name of the offending source.
        source_name: String,
        /// Decoder message.
        message: String,
    },

    /// The encoder cannot honor the requested codec configuration.
    #[error("codec rejected: {0}")]
    CodecRejected(String),

    /// Encoder/muxer failure.
    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelmixError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decode(source_name: impl Into<String>, stage: DecodeStage, err: impl fmt::Display) -> Self {
        Self::Decode {
            source_name: source_name.into(),
            stage,
            message: err.to_string(),
        }
    }

    pub fn playback_start(source_name: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::PlaybackStart {
            source_name: source_name.into(),
            message: err.to_string(),
        }
    }

    pub fn codec_rejected(msg: impl Into<String>) -> Self {
        Self::CodecRejected(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// `true` for errors that abort a run because a source misbehaved.
    pub fn is_source_failure(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::PlaybackStart { .. })
    }
}
