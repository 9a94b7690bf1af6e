//! Command handlers: the string-token boundary
//!
//! Binding layers (FFI, IPC, a scripting host) call these. Handles cross as
//! opaque strings, sample data as flat interleaved `f32`, and failures as a
//! serializable [`CommandError`] carrying a stable kind.

pub mod config;
pub mod devices;
pub mod streams;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{AudioError, DeviceId, ErrorKind, StreamId};

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct CommandError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<AudioError> for CommandError {
    fn from(err: AudioError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// A token that doesn't parse names no device
fn parse_device(token: &str) -> Result<DeviceId, AudioError> {
    token
        .parse()
        .map_err(|_| AudioError::DeviceNotFound(token.to_string()))
}

/// A token that doesn't parse names no stream
fn parse_stream(token: &str) -> Result<StreamId, AudioError> {
    token
        .parse()
        .map_err(|_| AudioError::StreamNotFound(token.to_string()))
}
