//! Adapters: implementations of the port traits
//!
//! - `cpal_backend` - real hardware through cpal
//! - `mock_backend` - in-memory devices for development and tests

pub mod cpal_backend;
pub mod mock_backend;

use std::sync::Arc;

use crate::ports::AudioBackend;

/// Env var selecting the in-memory backend
pub const MOCK_ENV: &str = "HOSTAUDIO_MOCK";

/// The mock backend when `HOSTAUDIO_MOCK=1`, cpal otherwise
pub fn default_backend() -> Arc<dyn AudioBackend> {
    if std::env::var(MOCK_ENV).as_deref() == Ok("1") {
        log::info!("{MOCK_ENV}=1, using the mock audio backend");
        Arc::new(mock_backend::MockBackend::new())
    } else {
        Arc::new(cpal_backend::CpalBackend::new())
    }
}
