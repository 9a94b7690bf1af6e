//! Per-sample format conversion
//!
//! Linear rescaling between integer fixed-point ranges and `f32` in
//! [-1.0, 1.0]. Integer formats scale by 2^(bits-1) in both directions so a
//! float → int → float round trip stays within half an LSB (one LSB at +1.0,
//! which has to clip to the largest positive code).
//!
//! Nothing here allocates; the realtime callbacks call straight into it.

use crate::domain::{InputBuffer, OutputBuffer, SampleFormat};

/// A sample type a device can be opened with
pub trait DeviceSample: Copy + Send + 'static {
    const FORMAT: SampleFormat;
    /// The value that means silence
    const EQUILIBRIUM: Self;

    fn from_f32(sample: f32) -> Self;
    fn to_f32(self) -> f32;

    fn output_buffer(buffer: &mut [Self]) -> OutputBuffer<'_>;
    fn input_buffer(buffer: &[Self]) -> InputBuffer<'_>;
}

const I8_SCALE: f32 = 128.0;
const I16_SCALE: f32 = 32_768.0;
const I32_SCALE: f64 = 2_147_483_648.0;

impl DeviceSample for i8 {
    const FORMAT: SampleFormat = SampleFormat::I8;
    const EQUILIBRIUM: Self = 0;

    #[inline]
    fn from_f32(sample: f32) -> Self {
        (sample * I8_SCALE).round().clamp(i8::MIN as f32, i8::MAX as f32) as i8
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32 / I8_SCALE
    }

    fn output_buffer(buffer: &mut [Self]) -> OutputBuffer<'_> {
        OutputBuffer::I8(buffer)
    }

    fn input_buffer(buffer: &[Self]) -> InputBuffer<'_> {
        InputBuffer::I8(buffer)
    }
}

impl DeviceSample for u8 {
    const FORMAT: SampleFormat = SampleFormat::U8;
    const EQUILIBRIUM: Self = 128;

    #[inline]
    fn from_f32(sample: f32) -> Self {
        (sample * I8_SCALE + I8_SCALE).round().clamp(0.0, u8::MAX as f32) as u8
    }

    #[inline]
    fn to_f32(self) -> f32 {
        (self as f32 - I8_SCALE) / I8_SCALE
    }

    fn output_buffer(buffer: &mut [Self]) -> OutputBuffer<'_> {
        OutputBuffer::U8(buffer)
    }

    fn input_buffer(buffer: &[Self]) -> InputBuffer<'_> {
        InputBuffer::U8(buffer)
    }
}

impl DeviceSample for i16 {
    const FORMAT: SampleFormat = SampleFormat::I16;
    const EQUILIBRIUM: Self = 0;

    #[inline]
    fn from_f32(sample: f32) -> Self {
        (sample * I16_SCALE).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32 / I16_SCALE
    }

    fn output_buffer(buffer: &mut [Self]) -> OutputBuffer<'_> {
        OutputBuffer::I16(buffer)
    }

    fn input_buffer(buffer: &[Self]) -> InputBuffer<'_> {
        InputBuffer::I16(buffer)
    }
}

impl DeviceSample for u16 {
    const FORMAT: SampleFormat = SampleFormat::U16;
    const EQUILIBRIUM: Self = 32_768;

    #[inline]
    fn from_f32(sample: f32) -> Self {
        (sample * I16_SCALE + I16_SCALE).round().clamp(0.0, u16::MAX as f32) as u16
    }

    #[inline]
    fn to_f32(self) -> f32 {
        (self as f32 - I16_SCALE) / I16_SCALE
    }

    fn output_buffer(buffer: &mut [Self]) -> OutputBuffer<'_> {
        OutputBuffer::U16(buffer)
    }

    fn input_buffer(buffer: &[Self]) -> InputBuffer<'_> {
        InputBuffer::U16(buffer)
    }
}

impl DeviceSample for i32 {
    const FORMAT: SampleFormat = SampleFormat::I32;
    const EQUILIBRIUM: Self = 0;

    // f32 only has a 24-bit mantissa, so go through f64 for the 32-bit range
    #[inline]
    fn from_f32(sample: f32) -> Self {
        (sample as f64 * I32_SCALE).round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
    }

    #[inline]
    fn to_f32(self) -> f32 {
        (self as f64 / I32_SCALE) as f32
    }

    fn output_buffer(buffer: &mut [Self]) -> OutputBuffer<'_> {
        OutputBuffer::I32(buffer)
    }

    fn input_buffer(buffer: &[Self]) -> InputBuffer<'_> {
        InputBuffer::I32(buffer)
    }
}

/// Float samples pass through untouched, including NaN and ±∞
impl DeviceSample for f32 {
    const FORMAT: SampleFormat = SampleFormat::F32;
    const EQUILIBRIUM: Self = 0.0;

    #[inline]
    fn from_f32(sample: f32) -> Self {
        sample
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    fn output_buffer(buffer: &mut [Self]) -> OutputBuffer<'_> {
        OutputBuffer::F32(buffer)
    }

    fn input_buffer(buffer: &[Self]) -> InputBuffer<'_> {
        InputBuffer::F32(buffer)
    }
}

/// Encode canonical samples into a device buffer. Extra destination samples are left alone.
#[inline]
pub fn encode_into<T: DeviceSample>(src: &[f32], dst: &mut [T]) {
    for (out, &sample) in dst.iter_mut().zip(src) {
        *out = T::from_f32(sample);
    }
}

/// Decode device samples into canonical `f32`
#[inline]
pub fn decode_into<T: DeviceSample>(src: &[T], dst: &mut [f32]) {
    for (out, &sample) in dst.iter_mut().zip(src) {
        *out = sample.to_f32();
    }
}

/// Fill a device buffer with silence
#[inline]
pub fn silence<T: DeviceSample>(dst: &mut [T]) {
    dst.fill(T::EQUILIBRIUM);
}
