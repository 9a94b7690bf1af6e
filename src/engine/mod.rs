//! Stream engine
//!
//! Owns every live stream and mediates between the control context (the
//! caller's threads) and the realtime context (the platform's audio thread).
//!
//! Each stream is wired like this:
//!
//! ```text
//! output:  write_to_stream ─▶ TransportWriter ═ring═ TransportReader ─▶ OutputRenderer ─▶ device
//! input:   device ─▶ InputCapturer ─▶ TransportWriter ═ring═ TransportReader ─▶ DeliveryWorker ─▶ handler
//! ```
//!
//! The realtime side only sees its transport half, the atomic lifecycle state
//! and a preallocated scratch buffer. The stream table mutex is only ever
//! taken by control operations.

pub mod callback;
pub mod delivery;
pub mod lifecycle;
pub mod stream;
pub mod transport;

pub use delivery::ChannelHandler;
pub use lifecycle::StreamState;
pub use stream::StreamInfo;

use std::borrow::Cow;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use crate::arena::Arena;
use crate::convert::adapt_channels;
use crate::devices::DeviceRegistry;
use crate::domain::{
    AudioError, AudioResult, AudioSample, DeviceId, Direction, EngineConfig, StreamConfig,
    StreamId, StreamOptions, MAX_TARGET_LATENCY_MS,
};
use crate::ports::{ErrorCallback, StreamDataHandler};
use callback::{InputCapturer, OutputRenderer};
use delivery::{DeliveryWorker, WakeSignal};
use lifecycle::AtomicStreamState;
use stream::Stream;
use transport::transport;

pub struct StreamEngine {
    devices: Arc<DeviceRegistry>,
    streams: Mutex<Arena<Arc<Stream>>>,
    config: EngineConfig,
}

impl StreamEngine {
    pub fn new(devices: Arc<DeviceRegistry>, config: EngineConfig) -> Self {
        Self {
            devices,
            streams: Mutex::new(Arena::new()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn lock_streams(&self) -> MutexGuard<'_, Arena<Arc<Stream>>> {
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a stream whose client buffers match the device layout
    pub fn create_stream(
        &self,
        device: DeviceId,
        direction: Direction,
        config: StreamConfig,
        on_data: Option<Box<dyn StreamDataHandler>>,
    ) -> AudioResult<StreamId> {
        self.create_stream_with_options(device, direction, config, on_data, StreamOptions::default())
    }

    /// Open a stream and start it.
    ///
    /// Input streams need `on_data`; output streams ignore it. The returned
    /// handle is already `Running`.
    pub fn create_stream_with_options(
        &self,
        device: DeviceId,
        direction: Direction,
        config: StreamConfig,
        on_data: Option<Box<dyn StreamDataHandler>>,
        options: StreamOptions,
    ) -> AudioResult<StreamId> {
        if !config.is_valid() {
            return Err(AudioError::InvalidConfig(format!(
                "{config}: sample rate and channel count must be positive"
            )));
        }
        if options.client_channels == Some(0) {
            return Err(AudioError::InvalidConfig("client channel count must be positive".into()));
        }
        if options.target_latency_ms == Some(0) {
            return Err(AudioError::InvalidConfig("target latency must be positive".into()));
        }
        if let Some(latency_ms) = options
            .target_latency_ms
            .filter(|ms| *ms > MAX_TARGET_LATENCY_MS)
        {
            return Err(AudioError::InvalidConfig(format!(
                "target latency {latency_ms} ms exceeds {MAX_TARGET_LATENCY_MS} ms"
            )));
        }
        if direction == Direction::Input && on_data.is_none() {
            return Err(AudioError::InvalidCallback);
        }

        let key = self.devices.resolve(device)?;
        let backend = self.devices.backend();
        let ranges = backend.device_supported_configs(&key, direction)?;
        if !ranges.iter().any(|range| range.supports(&config)) {
            return Err(AudioError::UnsupportedConfig(config));
        }

        let client_channels = options.client_channels.unwrap_or(config.channels);
        let capacity = self.config.buffer_capacity(&config, options.target_latency_ms)?;
        let scratch_len = config.samples_for_frames(self.config.scratch_frames);
        let (writer, reader, stats) = transport(capacity);
        let state = Arc::new(AtomicStreamState::new(StreamState::Created));
        let fault = Arc::new(OnceLock::new());

        let (callback, writer, delivery) = match direction {
            Direction::Output => {
                let renderer = OutputRenderer::new(reader, Arc::clone(&state), scratch_len);
                (renderer.into_callback(), Some(writer), None)
            }
            Direction::Input => {
                let handler = on_data.ok_or(AudioError::InvalidCallback)?;
                let (wake, wake_rx) = WakeSignal::channel();
                let capturer =
                    InputCapturer::new(writer, Arc::clone(&state), scratch_len, wake.clone());
                let worker = DeliveryWorker::spawn(
                    reader,
                    handler,
                    config.channels,
                    client_channels,
                    (wake, wake_rx),
                    Duration::from_millis(self.config.delivery_poll_ms),
                )?;
                (capturer.into_callback(), None, Some(worker))
            }
        };

        let on_error: ErrorCallback = {
            let state = Arc::clone(&state);
            let fault = Arc::clone(&fault);
            Box::new(move |message: String| {
                log::error!("Audio stream error: {message}");
                let _ = fault.set(message);
                state.close();
            })
        };

        let platform = backend.open_stream(&key, &config, callback, on_error)?;
        state.start();

        let stream = Stream {
            device,
            direction,
            config,
            client_channels,
            capacity,
            state,
            stats,
            fault,
            writer: Mutex::new(writer),
            platform: Mutex::new(Some(platform)),
            delivery: Mutex::new(delivery),
        };

        let id = StreamId(self.lock_streams().insert(Arc::new(stream)));
        log::info!("Opened {direction} stream {id} on {device} ({config}, {capacity} sample buffer)");
        Ok(id)
    }

    /// Fetch a live stream, reaping it if the platform reported a fault
    fn lookup(&self, id: StreamId) -> AudioResult<Arc<Stream>> {
        let mut streams = self.lock_streams();
        let stream = streams
            .get(id.index())
            .cloned()
            .ok_or_else(|| AudioError::StreamNotFound(id.to_string()))?;

        if let Some(reason) = stream.fault.get() {
            streams.remove(id.index());
            drop(streams);
            log::warn!("Reaping stream {id} after platform error: {reason}");
            stream.shutdown();
            return Err(AudioError::StreamNotFound(id.to_string()));
        }
        Ok(stream)
    }

    /// Queue interleaved samples for an output stream.
    ///
    /// Never blocks: if the whole buffer doesn't fit, nothing is queued and
    /// `BufferFull` is returned.
    pub fn write_to_stream(&self, id: StreamId, samples: &[AudioSample]) -> AudioResult<()> {
        if samples.is_empty() {
            return Err(AudioError::InvalidBufferSize("buffer cannot be empty".into()));
        }

        let stream = self.lookup(id)?;
        if stream.direction == Direction::Input {
            return Err(AudioError::WrongDirection {
                stream: id.to_string(),
                direction: Direction::Input,
            });
        }
        match stream.state.load() {
            StreamState::Running => {}
            StreamState::Closed => return Err(AudioError::StreamNotFound(id.to_string())),
            _ => return Err(AudioError::StreamNotActive(id.to_string())),
        }
        if samples.len() % stream.client_channels as usize != 0 {
            return Err(AudioError::InvalidBufferSize(format!(
                "{} samples is not a whole number of {}-channel frames",
                samples.len(),
                stream.client_channels
            )));
        }

        let samples: Cow<'_, [AudioSample]> = if stream.client_channels == stream.config.channels {
            Cow::Borrowed(samples)
        } else {
            Cow::Owned(adapt_channels(samples, stream.client_channels, stream.config.channels))
        };

        let mut writer = stream.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let writer = writer
            .as_mut()
            .ok_or_else(|| AudioError::StreamNotFound(id.to_string()))?;
        writer
            .push_all(&samples)
            .map_err(|available| AudioError::BufferFull {
                requested: samples.len(),
                available,
            })
    }

    /// `Running → Paused`. Pausing a paused stream is a no-op.
    pub fn pause_stream(&self, id: StreamId) -> AudioResult<()> {
        let stream = self.lookup(id)?;
        if stream.state.pause() {
            log::debug!("Paused stream {id}");
            return Ok(());
        }
        Err(Self::transition_error(id, stream.state.load()))
    }

    /// `Paused → Running`. Resuming a running stream is a no-op.
    pub fn resume_stream(&self, id: StreamId) -> AudioResult<()> {
        let stream = self.lookup(id)?;
        if stream.state.resume() {
            log::debug!("Resumed stream {id}");
            return Ok(());
        }
        Err(Self::transition_error(id, stream.state.load()))
    }

    fn transition_error(id: StreamId, state: StreamState) -> AudioError {
        match state {
            StreamState::Closed => AudioError::StreamNotFound(id.to_string()),
            _ => AudioError::StreamNotActive(id.to_string()),
        }
    }

    /// Stop the platform stream, release the transport and forget the handle.
    ///
    /// Blocks until any in-flight realtime callback has returned.
    pub fn close_stream(&self, id: StreamId) -> AudioResult<()> {
        let stream = self.lookup(id)?;
        let removed = self.lock_streams().remove(id.index());
        if removed.is_none() {
            // Lost a race with another close
            return Err(AudioError::StreamNotFound(id.to_string()));
        }
        stream.shutdown();
        log::info!("Closed stream {id}");
        Ok(())
    }

    /// True iff the stream is `Running`.
    ///
    /// Handles this engine issued but has since closed (or lost to a platform
    /// fault) report `false`; only tokens it never issued are `StreamNotFound`.
    pub fn is_stream_active(&self, id: StreamId) -> AudioResult<bool> {
        match self.lookup(id) {
            Ok(stream) => Ok(stream.state.is_running()),
            Err(AudioError::StreamNotFound(_)) if self.lock_streams().was_issued(id.index()) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub fn stream_info(&self, id: StreamId) -> AudioResult<StreamInfo> {
        Ok(self.lookup(id)?.info(id))
    }

    /// Handles of every stream not yet closed
    pub fn streams(&self) -> Vec<StreamId> {
        self.lock_streams()
            .iter()
            .map(|(index, _)| StreamId(index))
            .collect()
    }

    /// Close every stream, returning how many there were
    pub fn close_all(&self) -> usize {
        let streams = self.lock_streams().drain_where(|_| true);
        for stream in &streams {
            stream.shutdown();
        }
        if !streams.is_empty() {
            log::info!("Closed {} streams", streams.len());
        }
        streams.len()
    }
}

impl Drop for StreamEngine {
    fn drop(&mut self) {
        self.close_all();
    }
}
