//! Realtime callbacks
//!
//! These run on the platform's audio thread. They touch only the transport
//! half they own, the atomic lifecycle state and a scratch buffer allocated
//! when the stream was created. No locks, no allocation, no logging.

use std::sync::Arc;

use super::delivery::WakeSignal;
use super::lifecycle::AtomicStreamState;
use super::transport::{TransportReader, TransportWriter};
use crate::convert::{decode_into, encode_into, silence, DeviceSample};
use crate::domain::{InputBuffer, OutputBuffer};
use crate::ports::RealtimeCallback;

/// Pulls samples from the transport and encodes them into the device buffer
pub struct OutputRenderer {
    reader: TransportReader,
    state: Arc<AtomicStreamState>,
    scratch: Vec<f32>,
}

impl OutputRenderer {
    pub fn new(reader: TransportReader, state: Arc<AtomicStreamState>, scratch_len: usize) -> Self {
        Self {
            reader,
            state,
            scratch: vec![0.0; scratch_len.max(1)],
        }
    }

    pub fn render(&mut self, buffer: OutputBuffer<'_>) {
        match buffer {
            OutputBuffer::I8(out) => self.fill(out),
            OutputBuffer::U8(out) => self.fill(out),
            OutputBuffer::I16(out) => self.fill(out),
            OutputBuffer::U16(out) => self.fill(out),
            OutputBuffer::I32(out) => self.fill(out),
            OutputBuffer::F32(out) => self.fill(out),
        }
    }

    fn fill<T: DeviceSample>(&mut self, out: &mut [T]) {
        // Paused, not yet started or closing: silence, ring untouched
        if !self.state.is_running() {
            silence(out);
            return;
        }

        for chunk in out.chunks_mut(self.scratch.len()) {
            let scratch = &mut self.scratch[..chunk.len()];
            self.reader.pop_or_silence(scratch);
            encode_into(scratch, chunk);
        }
    }

    pub fn into_callback(mut self) -> RealtimeCallback {
        RealtimeCallback::Output(Box::new(move |buffer: OutputBuffer<'_>| self.render(buffer)))
    }
}

/// Decodes captured device samples into the transport and wakes the delivery thread
pub struct InputCapturer {
    writer: TransportWriter,
    state: Arc<AtomicStreamState>,
    scratch: Vec<f32>,
    wake: WakeSignal,
}

impl InputCapturer {
    pub fn new(
        writer: TransportWriter,
        state: Arc<AtomicStreamState>,
        scratch_len: usize,
        wake: WakeSignal,
    ) -> Self {
        Self {
            writer,
            state,
            scratch: vec![0.0; scratch_len.max(1)],
            wake,
        }
    }

    pub fn capture(&mut self, buffer: InputBuffer<'_>) {
        match buffer {
            InputBuffer::I8(data) => self.push(data),
            InputBuffer::U8(data) => self.push(data),
            InputBuffer::I16(data) => self.push(data),
            InputBuffer::U16(data) => self.push(data),
            InputBuffer::I32(data) => self.push(data),
            InputBuffer::F32(data) => self.push(data),
        }
    }

    fn push<T: DeviceSample>(&mut self, data: &[T]) {
        if !self.state.is_running() || data.is_empty() {
            return;
        }

        for chunk in data.chunks(self.scratch.len()) {
            let scratch = &mut self.scratch[..chunk.len()];
            decode_into(chunk, scratch);
            self.writer.push_lossy(scratch);
        }

        self.wake.notify();
    }

    pub fn into_callback(mut self) -> RealtimeCallback {
        RealtimeCallback::Input(Box::new(move |buffer: InputBuffer<'_>| self.capture(buffer)))
    }
}
