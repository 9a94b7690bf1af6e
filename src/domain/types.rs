//! Core domain types
//!
//! Pure value types describing hosts, devices and stream formats. No I/O here;
//! the registry and engine build on these.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::DeviceId;

/// Audio sample type used at every API boundary (32-bit float, nominal range -1.0 to 1.0)
pub type AudioSample = f32;

/// Direction of an audio stream relative to the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Device → application (capture)
    Input,
    /// Application → device (playback)
    Output,
}

impl Direction {
    pub fn from_is_input(is_input: bool) -> Self {
        if is_input {
            Self::Input
        } else {
            Self::Output
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Device-native sample encoding.
///
/// The engine always works in `f32` internally; these are the formats a
/// device can be opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    I8,
    U8,
    I16,
    U16,
    I32,
    F32,
}

impl SampleFormat {
    pub const ALL: [SampleFormat; 6] = [
        Self::I8,
        Self::U8,
        Self::I16,
        Self::U16,
        Self::I32,
        Self::F32,
    ];

    /// Wire name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::F32 => "f32",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| format!("unknown sample format: {s}"))
    }
}

/// A platform audio backend (ALSA, CoreAudio, WASAPI, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub id: String,
    pub name: String,
}

/// A device as reported by the platform backend, before the registry assigns it an id.
///
/// `key` identifies the device within its host. It only needs to be stable
/// for as long as the platform keeps the device around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDevice {
    pub key: String,
    pub name: String,
    pub is_default_input: bool,
    pub is_default_output: bool,
}

/// Everything a backend needs to re-resolve a device handle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceKey {
    pub host_id: String,
    pub key: String,
}

/// A discoverable audio endpoint.
///
/// A descriptor only: it owns no OS resource. The config lists are `None`
/// until requested through `DeviceRegistry::describe_device`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(rename = "deviceId")]
    pub id: DeviceId,
    pub name: String,
    pub host_id: String,
    pub is_default_input: bool,
    pub is_default_output: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub input_configs: Option<Vec<ConfigRange>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub output_configs: Option<Vec<ConfigRange>>,
}

/// Concrete configuration a stream runs at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_format: SampleFormat,
}

impl StreamConfig {
    pub fn new(sample_rate: u32, channels: u16, sample_format: SampleFormat) -> Self {
        Self {
            sample_rate,
            channels,
            sample_format,
        }
    }

    /// Rejects configurations that no device could ever support
    pub fn is_valid(&self) -> bool {
        self.sample_rate > 0 && self.channels > 0
    }

    /// Number of interleaved samples needed to hold `frames` frames
    pub fn samples_for_frames(&self, frames: usize) -> usize {
        frames * self.channels as usize
    }
}

impl fmt::Display for StreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {} ch, {}",
            self.sample_rate, self.channels, self.sample_format
        )
    }
}

/// One supported capability band reported by a device driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRange {
    pub min_sample_rate: u32,
    pub max_sample_rate: u32,
    pub channels: u16,
    #[serde(rename = "format")]
    pub sample_format: SampleFormat,
}

impl ConfigRange {
    pub fn new(
        min_sample_rate: u32,
        max_sample_rate: u32,
        channels: u16,
        sample_format: SampleFormat,
    ) -> Self {
        Self {
            min_sample_rate: min_sample_rate.min(max_sample_rate),
            max_sample_rate: max_sample_rate.max(min_sample_rate),
            channels,
            sample_format,
        }
    }

    /// Whether `config` lies inside this band
    pub fn supports(&self, config: &StreamConfig) -> bool {
        config.channels == self.channels
            && config.sample_format == self.sample_format
            && (self.min_sample_rate..=self.max_sample_rate).contains(&config.sample_rate)
    }

    /// Pin this band to a concrete rate, clamped into range
    pub fn with_sample_rate(&self, sample_rate: u32) -> StreamConfig {
        StreamConfig {
            sample_rate: sample_rate.clamp(self.min_sample_rate, self.max_sample_rate),
            channels: self.channels,
            sample_format: self.sample_format,
        }
    }
}

/// Per-stream options beyond the device configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamOptions {
    /// Channel count of the buffers the application writes or receives.
    /// Defaults to the device channel count.
    pub client_channels: Option<u16>,
    /// Overrides `EngineConfig::target_latency_ms` for this stream
    pub target_latency_ms: Option<u32>,
}
