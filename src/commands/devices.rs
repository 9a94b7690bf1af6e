//! Device commands: hosts, devices and their capabilities

use super::{parse_device, CommandResult};
use crate::domain::{ConfigRange, Device, Direction, Host, SampleFormat, StreamConfig};
use crate::state::AudioState;

pub fn list_hosts(state: &AudioState) -> CommandResult<Vec<Host>> {
    Ok(state.devices.list_hosts()?)
}

/// Devices of `host_id`, or of the default host
pub fn list_devices(state: &AudioState, host_id: Option<&str>) -> CommandResult<Vec<Device>> {
    Ok(state.devices.list_devices(host_id)?)
}

pub fn default_input_device(state: &AudioState) -> CommandResult<Device> {
    Ok(state.devices.default_input_device()?)
}

pub fn default_output_device(state: &AudioState) -> CommandResult<Device> {
    Ok(state.devices.default_output_device()?)
}

pub fn describe_device(state: &AudioState, device_id: &str) -> CommandResult<Device> {
    Ok(state.devices.describe_device(parse_device(device_id)?)?)
}

fn supported_configs(
    state: &AudioState,
    device_id: &str,
    direction: Direction,
) -> CommandResult<Vec<ConfigRange>> {
    Ok(state
        .devices
        .supported_configs(parse_device(device_id)?, direction)?)
}

pub fn supported_input_configs(
    state: &AudioState,
    device_id: &str,
) -> CommandResult<Vec<ConfigRange>> {
    supported_configs(state, device_id, Direction::Input)
}

pub fn supported_output_configs(
    state: &AudioState,
    device_id: &str,
) -> CommandResult<Vec<ConfigRange>> {
    supported_configs(state, device_id, Direction::Output)
}

fn default_config(
    state: &AudioState,
    device_id: &str,
    direction: Direction,
) -> CommandResult<StreamConfig> {
    Ok(state
        .devices
        .default_config(parse_device(device_id)?, direction)?)
}

pub fn default_input_config(state: &AudioState, device_id: &str) -> CommandResult<StreamConfig> {
    default_config(state, device_id, Direction::Input)
}

pub fn default_output_config(state: &AudioState, device_id: &str) -> CommandResult<StreamConfig> {
    default_config(state, device_id, Direction::Output)
}

pub fn supported_formats(state: &AudioState, device_id: &str) -> CommandResult<Vec<SampleFormat>> {
    Ok(state.devices.supported_formats(parse_device(device_id)?)?)
}

pub fn supported_sample_rates(state: &AudioState, device_id: &str) -> CommandResult<Vec<u32>> {
    Ok(state
        .devices
        .supported_sample_rates(parse_device(device_id)?)?)
}

pub fn max_channels(state: &AudioState, device_id: &str) -> CommandResult<u16> {
    Ok(state.devices.max_channels(parse_device(device_id)?)?)
}
