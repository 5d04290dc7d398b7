// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera session
//!
//! Every variant here is recoverable. The session absorbs them, logs them,
//! and at most shows a notice; none of them ends the process.

use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Umbrella error for the binary and collaborators
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
    #[error(transparent)]
    Recording(#[from] RecordingError),
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// Camera and feed errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CameraError {
    /// No feed API, permission denied, or acquisition timed out
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("capability query failed: {0}")]
    CapabilityQueryFailed(String),
    #[error("frame capture failed: {0}")]
    CaptureFailed(String),
    /// A zoom/torch control was rejected by the device
    #[error("camera control failed: {0}")]
    ControlFailed(String),
}

/// Recognition collaborator failures
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("recognition request failed: {0}")]
    Transport(String),
    #[error("recognition service returned {code}: {message}")]
    Status { code: u16, message: String },
    #[error("could not decode recognition response: {0}")]
    Decode(String),
    #[error("recognition service is not configured")]
    NotConfigured,
}

impl From<reqwest::Error> for RecognitionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Recording errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordingError {
    /// No container encoder could be constructed for the feed
    #[error("encoder unavailable: {0}")]
    EncoderUnavailable(String),
    #[error("no recording in progress")]
    NotRecording,
    #[error("recording already in progress")]
    AlreadyRecording,
}

/// Zoom/flash control errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("flash is not supported by this camera")]
    FlashUnsupported,
}

/// Settings file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Other(s)
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Other(s.to_string())
    }
}
