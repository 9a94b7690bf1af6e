//! Engine configuration commands
//!
//! Read the running configuration, or persist one as pretty JSON so it can
//! be picked up again through `HOSTAUDIO_CONFIG`.

use std::path::Path;

use super::CommandResult;
use crate::domain::EngineConfig;
use crate::state::AudioState;

pub fn engine_config(state: &AudioState) -> EngineConfig {
    state.streams.config().clone()
}

pub fn save_engine_config(state: &AudioState, path: &Path) -> CommandResult<()> {
    Ok(state.streams.config().save(path)?)
}

/// Parse and validate a config file without applying it
pub fn load_engine_config(path: &Path) -> CommandResult<EngineConfig> {
    Ok(EngineConfig::load(path)?)
}
