//! Core domain types
//!
//! Pure types with no I/O dependencies: formats, capability ranges, handles,
//! errors and engine configuration.

pub mod buffer;
pub mod config;
pub mod error;
pub mod ids;
pub mod types;

pub use buffer::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use types::*;
