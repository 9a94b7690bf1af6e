//! Engine configuration
//!
//! Tunables for buffer sizing and the input delivery thread. Stored as a JSON
//! file; every field has a default so partial files load fine.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{AudioError, AudioResult};
use super::types::StreamConfig;

/// Env var pointing at a JSON config file
pub const CONFIG_PATH_ENV: &str = "HOSTAUDIO_CONFIG";
/// Env var overriding `target_latency_ms`
pub const LATENCY_ENV: &str = "HOSTAUDIO_LATENCY_MS";

/// Upper bound on any transport latency, config file or per stream
pub const MAX_TARGET_LATENCY_MS: u32 = 10_000;
/// Upper bound on `min_buffer_frames` and `scratch_frames`
pub const MAX_BUFFER_FRAMES: usize = 1 << 20;

fn default_target_latency_ms() -> u32 {
    100
}

fn default_min_buffer_frames() -> usize {
    1024
}

fn default_scratch_frames() -> usize {
    1024
}

fn default_delivery_poll_ms() -> u64 {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Transport buffer length, in milliseconds of audio
    #[serde(default = "default_target_latency_ms")]
    pub target_latency_ms: u32,
    /// Lower bound on transport buffer length, in frames
    #[serde(default = "default_min_buffer_frames")]
    pub min_buffer_frames: usize,
    /// Frames converted per step inside the realtime callback.
    /// Preallocated once per stream.
    #[serde(default = "default_scratch_frames")]
    pub scratch_frames: usize,
    /// How long the input delivery thread waits for a wakeup before re-checking
    #[serde(default = "default_delivery_poll_ms")]
    pub delivery_poll_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_latency_ms: default_target_latency_ms(),
            min_buffer_frames: default_min_buffer_frames(),
            scratch_frames: default_scratch_frames(),
            delivery_poll_ms: default_delivery_poll_ms(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> AudioResult<()> {
        if self.target_latency_ms == 0 {
            return Err(AudioError::Config("targetLatencyMs must be positive".into()));
        }
        if self.target_latency_ms > MAX_TARGET_LATENCY_MS {
            return Err(AudioError::Config(format!(
                "targetLatencyMs must be at most {MAX_TARGET_LATENCY_MS}"
            )));
        }
        if !(1..=MAX_BUFFER_FRAMES).contains(&self.min_buffer_frames) {
            return Err(AudioError::Config(format!(
                "minBufferFrames must be between 1 and {MAX_BUFFER_FRAMES}"
            )));
        }
        if !(1..=MAX_BUFFER_FRAMES).contains(&self.scratch_frames) {
            return Err(AudioError::Config(format!(
                "scratchFrames must be between 1 and {MAX_BUFFER_FRAMES}"
            )));
        }
        if self.delivery_poll_ms == 0 {
            return Err(AudioError::Config("deliveryPollMs must be positive".into()));
        }
        Ok(())
    }

    /// Transport buffer capacity in samples for a stream at `config`.
    ///
    /// `sample_rate × channels × latency`, never below `min_buffer_frames` frames.
    /// Latencies over `MAX_TARGET_LATENCY_MS` are `InvalidConfig`.
    pub fn buffer_capacity(
        &self,
        config: &StreamConfig,
        latency_ms: Option<u32>,
    ) -> AudioResult<usize> {
        let latency_ms = latency_ms.unwrap_or(self.target_latency_ms);
        if latency_ms > MAX_TARGET_LATENCY_MS {
            return Err(AudioError::InvalidConfig(format!(
                "target latency {latency_ms} ms exceeds {MAX_TARGET_LATENCY_MS} ms"
            )));
        }

        let too_large = || AudioError::InvalidConfig(format!("{config}: transport buffer too large"));
        let frames = usize::try_from(config.sample_rate as u64 * latency_ms as u64 / 1000)
            .map_err(|_| too_large())?;
        frames
            .max(self.min_buffer_frames)
            .checked_mul(config.channels as usize)
            .ok_or_else(too_large)
    }

    pub fn load(path: &Path) -> AudioResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AudioError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| {
            AudioError::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> AudioResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AudioError::Config(format!("Serialization error: {e}")))?;
        std::fs::write(path, json).map_err(|e| {
            AudioError::Config(format!("Failed to write {}: {e}", path.display()))
        })
    }

    /// Defaults, then `HOSTAUDIO_CONFIG` if set, then `HOSTAUDIO_LATENCY_MS`
    pub fn from_env() -> AudioResult<Self> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };

        if let Ok(latency) = std::env::var(LATENCY_ENV) {
            config.target_latency_ms = latency
                .trim()
                .parse()
                .map_err(|_| AudioError::Config(format!("{LATENCY_ENV} is not a number: {latency}")))?;
        }

        config.validate()?;
        Ok(config)
    }
}
