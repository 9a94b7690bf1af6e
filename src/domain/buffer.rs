//! Borrowed views of device-native sample buffers
//!
//! The platform hands the realtime callback a slice in whatever format the
//! device was opened with. These enums carry that slice across the port
//! boundary without copying.

use super::types::SampleFormat;

/// Buffer the device wants filled (output streams)
#[derive(Debug)]
pub enum OutputBuffer<'a> {
    I8(&'a mut [i8]),
    U8(&'a mut [u8]),
    I16(&'a mut [i16]),
    U16(&'a mut [u16]),
    I32(&'a mut [i32]),
    F32(&'a mut [f32]),
}

/// Buffer the device just captured (input streams)
#[derive(Debug, Clone, Copy)]
pub enum InputBuffer<'a> {
    I8(&'a [i8]),
    U8(&'a [u8]),
    I16(&'a [i16]),
    U16(&'a [u16]),
    I32(&'a [i32]),
    F32(&'a [f32]),
}

impl OutputBuffer<'_> {
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
        match self {
            Self::I8(b) => b.len(),
            Self::U8(b) => b.len(),
            Self::I16(b) => b.len(),
            Self::U16(b) => b.len(),
            Self::I32(b) => b.len(),
            Self::F32(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InputBuffer<'_> {
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
        match self {
            Self::I8(b) => b.len(),
            Self::U8(b) => b.len(),
            Self::I16(b) => b.len(),
            Self::U16(b) => b.len(),
            Self::I32(b) => b.len(),
            Self::F32(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
