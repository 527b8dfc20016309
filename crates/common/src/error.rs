//! Error types shared across Dynso crates.

use std::path::PathBuf;

/// Top-level error type for Dynso operations.
#[derive(Debug, thiserror::Error)]
pub enum DynsoError {
    #[error("Frame dimensions changed: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Collaborator unavailable: {message}")]
    CollaboratorUnavailable { message: String },

    /// A volume was requested for a channel that is not playing yet.
    ///
    /// Callers on the volume path swallow this; it never ends a session.
    #[error("Channel {channel} is not playing yet")]
    NotPlayingYet { channel: u32 },

    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Audio error: {message}")]
    Audio { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using DynsoError.
pub type DynsoResult<T> = Result<T, DynsoError>;

impl DynsoError {
    pub fn dimension_mismatch(expected: (u32, u32), actual: (u32, u32)) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::CollaboratorUnavailable {
            message: msg.into(),
        }
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: msg.into(),
        }
    }

    /// Whether this error must end a running capture loop.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NotPlayingYet { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_message_names_both_sizes() {
        let err = DynsoError::dimension_mismatch((640, 480), (320, 240));
        let msg = err.to_string();
        assert!(msg.contains("(640, 480)"));
        assert!(msg.contains("(320, 240)"));
    }

    #[test]
    fn not_playing_yet_is_not_fatal() {
        assert!(!DynsoError::NotPlayingYet { channel: 2 }.is_fatal());
        assert!(DynsoError::capture("camera gone").is_fatal());
    }
}
