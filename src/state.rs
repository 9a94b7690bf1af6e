//! Application state
//!
//! One `AudioState` per process: the device registry plus the stream engine
//! sharing the same backend. The `commands` layer takes it by reference.

use std::sync::Arc;

use crate::adapters;
use crate::devices::DeviceRegistry;
use crate::domain::{AudioResult, EngineConfig};
use crate::engine::StreamEngine;
use crate::ports::AudioBackend;

pub struct AudioState {
    pub devices: Arc<DeviceRegistry>,
    pub streams: StreamEngine,
}

impl AudioState {
    /// Backend from `HOSTAUDIO_MOCK`, config from `HOSTAUDIO_CONFIG` / `HOSTAUDIO_LATENCY_MS`
    pub fn new() -> AudioResult<Self> {
        Ok(Self::with_backend(
            adapters::default_backend(),
            EngineConfig::from_env()?,
        ))
    }

    pub fn with_backend(backend: Arc<dyn AudioBackend>, config: EngineConfig) -> Self {
        let devices = Arc::new(DeviceRegistry::new(backend));
        let streams = StreamEngine::new(Arc::clone(&devices), config);
        Self { devices, streams }
    }
}
