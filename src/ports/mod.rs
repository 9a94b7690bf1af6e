//! Port traits (interfaces)
//!
//! These traits define the boundary between the engine and the platform
//! audio API. Adapters implement them for real hardware or for tests.

pub mod audio;

pub use audio::*;
