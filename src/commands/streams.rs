//! Stream commands
//!
//! Thin wrappers over the engine that speak string handles. Validation order
//! matters for callers: an empty write is `InvalidBufferSize` even when the
//! handle is garbage.

use super::{parse_device, parse_stream, CommandResult};
use crate::domain::{AudioError, AudioSample, Direction, StreamConfig, StreamOptions};
use crate::engine::StreamInfo;
use crate::ports::StreamDataHandler;
use crate::state::AudioState;

/// Open a stream and return its handle token
pub fn create_stream(
    state: &AudioState,
    device_id: &str,
    is_input: bool,
    config: StreamConfig,
    on_data: Option<Box<dyn StreamDataHandler>>,
) -> CommandResult<String> {
    create_stream_with_options(
        state,
        device_id,
        is_input,
        config,
        on_data,
        StreamOptions::default(),
    )
}

pub fn create_stream_with_options(
    state: &AudioState,
    device_id: &str,
    is_input: bool,
    config: StreamConfig,
    on_data: Option<Box<dyn StreamDataHandler>>,
    options: StreamOptions,
) -> CommandResult<String> {
    let id = state.streams.create_stream_with_options(
        parse_device(device_id)?,
        Direction::from_is_input(is_input),
        config,
        on_data,
        options,
    )?;
    Ok(id.to_string())
}

pub fn write_to_stream(
    state: &AudioState,
    handle: &str,
    samples: &[AudioSample],
) -> CommandResult<()> {
    if samples.is_empty() {
        return Err(AudioError::InvalidBufferSize("buffer cannot be empty".into()).into());
    }
    Ok(state.streams.write_to_stream(parse_stream(handle)?, samples)?)
}

pub fn pause_stream(state: &AudioState, handle: &str) -> CommandResult<()> {
    Ok(state.streams.pause_stream(parse_stream(handle)?)?)
}

pub fn resume_stream(state: &AudioState, handle: &str) -> CommandResult<()> {
    Ok(state.streams.resume_stream(parse_stream(handle)?)?)
}

pub fn close_stream(state: &AudioState, handle: &str) -> CommandResult<()> {
    Ok(state.streams.close_stream(parse_stream(handle)?)?)
}

pub fn is_stream_active(state: &AudioState, handle: &str) -> CommandResult<bool> {
    Ok(state.streams.is_stream_active(parse_stream(handle)?)?)
}

pub fn stream_info(state: &AudioState, handle: &str) -> CommandResult<StreamInfo> {
    Ok(state.streams.stream_info(parse_stream(handle)?)?)
}
