//! hostaudio
//!
//! Cross-platform audio device I/O: enumerate hosts and devices, open input
//! and output streams at a chosen configuration, and move interleaved `f32`
//! samples between the application and the OS audio thread.
//!
//! ## Architecture (Hexagonal / Ports & Adapters)
//!
//! - `domain/` - Pure domain types, errors and engine configuration
//! - `ports/` - Trait definitions for the platform audio backend
//! - `convert/` - Sample format and channel layout conversion (pure functions)
//! - `adapters/` - Implementations of ports (cpal, in-memory mock)
//! - `devices/` - Device registry and opaque device ids
//! - `engine/` - Stream lifecycle, transport buffers and realtime callbacks
//! - `commands/` - String-token boundary for binding layers
//! - `state` - Process-wide state tying the registry and engine together

// Core domain (pure, no I/O)
pub mod arena;
pub mod convert;
pub mod domain;
pub mod ports;

// Adapters (external I/O)
pub mod adapters;

// Core services
pub mod devices;
pub mod engine;

// Boundary
pub mod commands;
pub mod logging;
pub mod state;

pub use devices::DeviceRegistry;
pub use domain::{AudioError, AudioResult};
pub use engine::{ChannelHandler, StreamEngine, StreamInfo, StreamState};
pub use state::AudioState;
