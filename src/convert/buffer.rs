//! Owned, format-tagged sample buffers

use crate::domain::{InputBuffer, OutputBuffer, SampleFormat};

use super::channels::adapt_channels;
use super::sample::DeviceSample;

/// Interleaved samples in one of the device-native formats
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
}

fn encode<T: DeviceSample>(samples: &[f32]) -> Vec<T> {
    samples.iter().map(|&s| T::from_f32(s)).collect()
}

fn decode<T: DeviceSample>(samples: &[T]) -> Vec<f32> {
    samples.iter().map(|&s| s.to_f32()).collect()
}

impl SampleBuffer {
    /// A buffer of `len` silent samples
    pub fn silent(format: SampleFormat, len: usize) -> Self {
        match format {
            SampleFormat::I8 => Self::I8(vec![i8::EQUILIBRIUM; len]),
            SampleFormat::U8 => Self::U8(vec![u8::EQUILIBRIUM; len]),
            SampleFormat::I16 => Self::I16(vec![i16::EQUILIBRIUM; len]),
            SampleFormat::U16 => Self::U16(vec![u16::EQUILIBRIUM; len]),
            SampleFormat::I32 => Self::I32(vec![i32::EQUILIBRIUM; len]),
            SampleFormat::F32 => Self::F32(vec![f32::EQUILIBRIUM; len]),
        }
    }

    /// Encode canonical samples as `format`
    pub fn from_f32(format: SampleFormat, samples: &[f32]) -> Self {
        match format {
            SampleFormat::I8 => Self::I8(encode(samples)),
            SampleFormat::U8 => Self::U8(encode(samples)),
            SampleFormat::I16 => Self::I16(encode(samples)),
            SampleFormat::U16 => Self::U16(encode(samples)),
            SampleFormat::I32 => Self::I32(encode(samples)),
            SampleFormat::F32 => Self::F32(samples.to_vec()),
        }
    }

    /// Decode to canonical `f32`
    pub fn to_f32(&self) -> Vec<f32> {
        match self {
            Self::I8(s) => decode(s),
            Self::U8(s) => decode(s),
            Self::I16(s) => decode(s),
            Self::U16(s) => decode(s),
            Self::I32(s) => decode(s),
            Self::F32(s) => s.clone(),
        }
    }

    pub fn format(&self) -> SampleFormat {
        match self {
            Self::I8(_) => SampleFormat::I8,
            Self::U8(_) => SampleFormat::U8,
            Self::I16(_) => SampleFormat::I16,
            Self::U16(_) => SampleFormat::U16,
            Self::I32(_) => SampleFormat::I32,
            Self::F32(_) => SampleFormat::F32,
        }
    }

    pub fn len(&self) -> usize {
        self.as_input().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_output(&mut self) -> OutputBuffer<'_> {
        match self {
            Self::I8(s) => OutputBuffer::I8(s),
            Self::U8(s) => OutputBuffer::U8(s),
            Self::I16(s) => OutputBuffer::I16(s),
            Self::U16(s) => OutputBuffer::U16(s),
            Self::I32(s) => OutputBuffer::I32(s),
            Self::F32(s) => OutputBuffer::F32(s),
        }
    }

    pub fn as_input(&self) -> InputBuffer<'_> {
        match self {
            Self::I8(s) => InputBuffer::I8(s),
            Self::U8(s) => InputBuffer::U8(s),
            Self::I16(s) => InputBuffer::I16(s),
            Self::U16(s) => InputBuffer::U16(s),
            Self::I32(s) => InputBuffer::I32(s),
            Self::F32(s) => InputBuffer::F32(s),
        }
    }
}

/// Convert between any two formats and channel layouts, going through `f32`
pub fn convert(
    samples: &SampleBuffer,
    dst_format: SampleFormat,
    src_channels: u16,
    dst_channels: u16,
) -> SampleBuffer {
    let canonical = samples.to_f32();
    let adapted = adapt_channels(&canonical, src_channels, dst_channels);
    SampleBuffer::from_f32(dst_format, &adapted)
}
