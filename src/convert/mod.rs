//! Sample conversion (pure functions, no I/O)
//!
//! - `sample` - per-sample rescaling between device formats and `f32`
//! - `channels` - channel layout adaptation
//! - `buffer` - owned format-tagged buffers and the combined `convert`

pub mod buffer;
pub mod channels;
pub mod sample;

pub use buffer::{convert, SampleBuffer};
pub use channels::{adapt_channels, adapt_channels_into};
pub use sample::{decode_into, encode_into, silence, DeviceSample};
