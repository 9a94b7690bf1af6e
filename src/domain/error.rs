//! Domain error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Direction, StreamConfig};

/// Errors returned by every control-context operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    #[error("Audio platform unavailable: {0}")]
    PlatformUnavailable(String),

    #[error("Host not found: {0}")]
    HostNotFound(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("No default {0} device found")]
    NoDefaultDevice(Direction),

    #[error("No supported {direction} config for device {device}")]
    NoSupportedConfig { device: String, direction: Direction },

    #[error("Unsupported stream config: {0}")]
    UnsupportedConfig(StreamConfig),

    #[error("Invalid stream config: {0}")]
    InvalidConfig(String),

    #[error("Input streams require a data callback")]
    InvalidCallback,

    #[error("Invalid buffer size: {0}")]
    InvalidBufferSize(String),

    #[error("Stream not found: {0}")]
    StreamNotFound(String),

    #[error("Stream is not active: {0}")]
    StreamNotActive(String),

    #[error("Failed to write to stream: buffer full ({requested} samples requested, {available} free)")]
    BufferFull { requested: usize, available: usize },

    #[error("Cannot write to {stream}: it is an {direction} stream")]
    WrongDirection { stream: String, direction: Direction },

    #[error("Audio backend error: {0}")]
    Backend(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Stable error code for callers on the other side of a binding layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    PlatformUnavailable,
    HostNotFound,
    DeviceNotFound,
    NoDefaultDevice,
    NoSupportedConfig,
    UnsupportedConfig,
    InvalidConfig,
    InvalidCallback,
    InvalidBufferSize,
    StreamNotFound,
    StreamNotActive,
    BufferFull,
    WrongDirection,
    Backend,
    Config,
}

impl AudioError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PlatformUnavailable(_) => ErrorKind::PlatformUnavailable,
            Self::HostNotFound(_) => ErrorKind::HostNotFound,
            Self::DeviceNotFound(_) => ErrorKind::DeviceNotFound,
            Self::NoDefaultDevice(_) => ErrorKind::NoDefaultDevice,
            Self::NoSupportedConfig { .. } => ErrorKind::NoSupportedConfig,
            Self::UnsupportedConfig(_) => ErrorKind::UnsupportedConfig,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::InvalidCallback => ErrorKind::InvalidCallback,
            Self::InvalidBufferSize(_) => ErrorKind::InvalidBufferSize,
            Self::StreamNotFound(_) => ErrorKind::StreamNotFound,
            Self::StreamNotActive(_) => ErrorKind::StreamNotActive,
            Self::BufferFull { .. } => ErrorKind::BufferFull,
            Self::WrongDirection { .. } => ErrorKind::WrongDirection,
            Self::Backend(_) => ErrorKind::Backend,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

/// Result type alias for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
