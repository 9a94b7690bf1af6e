//! Audio port traits

use crate::domain::{
    AudioResult, AudioSample, ConfigRange, DeviceKey, Direction, Host, InputBuffer, OutputBuffer,
    PlatformDevice, StreamConfig,
};

/// Realtime callback for output streams: fill the buffer the device hands over
pub type OutputCallback = Box<dyn FnMut(OutputBuffer<'_>) + Send + 'static>;

/// Realtime callback for input streams: consume the buffer the device captured
pub type InputCallback = Box<dyn FnMut(InputBuffer<'_>) + Send + 'static>;

/// Called by the platform when a stream fails after it was opened
pub type ErrorCallback = Box<dyn FnMut(String) + Send + 'static>;

/// The callback installed on a platform stream. Its variant must match the stream direction.
pub enum RealtimeCallback {
    Input(InputCallback),
    Output(OutputCallback),
}

impl RealtimeCallback {
    pub fn direction(&self) -> Direction {
        match self {
            Self::Input(_) => Direction::Input,
            Self::Output(_) => Direction::Output,
        }
    }
}

/// Platform audio backend (CoreAudio, WASAPI, ALSA, or an in-memory fake)
///
/// Implementations must be shareable across threads: the registry and the
/// engine both call into it from whatever thread the application uses.
pub trait AudioBackend: Send + Sync {
    /// List the backends available on this machine
    fn enumerate_hosts(&self) -> AudioResult<Vec<Host>>;

    /// Id of the host used when the caller doesn't name one
    fn default_host_id(&self) -> AudioResult<String>;

    /// List devices of one host
    fn enumerate_devices(&self, host_id: &str) -> AudioResult<Vec<PlatformDevice>>;

    /// Capability bands for one direction. `DeviceNotFound` if the device is gone.
    fn device_supported_configs(
        &self,
        device: &DeviceKey,
        direction: Direction,
    ) -> AudioResult<Vec<ConfigRange>>;

    /// The platform's preferred configuration for one direction
    fn device_default_config(
        &self,
        device: &DeviceKey,
        direction: Direction,
    ) -> AudioResult<StreamConfig>;

    /// Open and start a stream, driving `callback` from the platform's audio thread
    fn open_stream(
        &self,
        device: &DeviceKey,
        config: &StreamConfig,
        callback: RealtimeCallback,
        on_error: ErrorCallback,
    ) -> AudioResult<Box<dyn PlatformStream>>;
}

/// A running platform stream
pub trait PlatformStream: Send {
    /// Stop the stream and release the callback.
    ///
    /// Blocks until any in-flight callback invocation has returned; no
    /// invocation happens after this returns. Calling it twice is harmless.
    fn stop(&mut self);
}

/// Receives captured audio for an input stream.
///
/// Called from the engine's delivery thread, never from the realtime thread,
/// so implementations are free to allocate or block briefly.
pub trait StreamDataHandler: Send + 'static {
    fn on_data(&mut self, samples: &[AudioSample]);
}

impl<F> StreamDataHandler for F
where
    F: FnMut(&[AudioSample]) + Send + 'static,
{
    fn on_data(&mut self, samples: &[AudioSample]) {
        self(samples)
    }
}
