//! CPAL audio adapter: implements AudioBackend with the cpal crate
//!
//! cpal talks to the OS audio system (CoreAudio on macOS, WASAPI on Windows,
//! ALSA on Linux) and drives our realtime callbacks from its own audio thread.
//!
//! `cpal::Stream` is `!Send`, so it can't sit in the engine's stream table.
//! Each opened stream gets a dedicated thread that builds the cpal stream,
//! keeps it alive, and drops it when told to stop. The handle we return only
//! holds the stop channel and the thread's JoinHandle.
//!
//! Devices are keyed by name, the only identifier cpal 0.15 exposes.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::convert::DeviceSample;
use crate::domain::{
    AudioError, AudioResult, ConfigRange, DeviceKey, Direction, Host, PlatformDevice,
    SampleFormat, StreamConfig,
};
use crate::ports::{AudioBackend, ErrorCallback, PlatformStream, RealtimeCallback};

pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn to_sample_format(format: cpal::SampleFormat) -> Option<SampleFormat> {
    match format {
        cpal::SampleFormat::I8 => Some(SampleFormat::I8),
        cpal::SampleFormat::U8 => Some(SampleFormat::U8),
        cpal::SampleFormat::I16 => Some(SampleFormat::I16),
        cpal::SampleFormat::U16 => Some(SampleFormat::U16),
        cpal::SampleFormat::I32 => Some(SampleFormat::I32),
        cpal::SampleFormat::F32 => Some(SampleFormat::F32),
        // 64-bit and u32 formats are not offered to callers
        _ => None,
    }
}

fn find_host(host_id: &str) -> AudioResult<cpal::Host> {
    let id = cpal::available_hosts()
        .into_iter()
        .find(|id| id.name() == host_id)
        .ok_or_else(|| AudioError::HostNotFound(host_id.to_string()))?;
    cpal::host_from_id(id)
        .map_err(|e| AudioError::PlatformUnavailable(format!("Failed to initialize host {host_id}: {e}")))
}

fn find_device(key: &DeviceKey) -> AudioResult<cpal::Device> {
    let host = find_host(&key.host_id)?;
    host.devices()
        .map_err(|e| AudioError::Backend(format!("Failed to enumerate devices: {e}")))?
        .find(|device| device.name().map(|name| name == key.key).unwrap_or(false))
        .ok_or_else(|| AudioError::DeviceNotFound(key.key.clone()))
}

impl AudioBackend for CpalBackend {
    fn enumerate_hosts(&self) -> AudioResult<Vec<Host>> {
        Ok(cpal::available_hosts()
            .into_iter()
            .map(|id| Host {
                id: id.name().to_string(),
                name: id.name().to_string(),
            })
            .collect())
    }

    fn default_host_id(&self) -> AudioResult<String> {
        Ok(cpal::default_host().id().name().to_string())
    }

    fn enumerate_devices(&self, host_id: &str) -> AudioResult<Vec<PlatformDevice>> {
        let host = find_host(host_id)?;

        let default_input = host.default_input_device().and_then(|d| d.name().ok());
        let default_output = host.default_output_device().and_then(|d| d.name().ok());

        let devices = host
            .devices()
            .map_err(|e| AudioError::Backend(format!("Failed to enumerate devices: {e}")))?;

        let mut found: Vec<PlatformDevice> = Vec::new();
        for device in devices {
            let Ok(name) = device.name() else {
                continue;
            };
            // Some drivers list the same endpoint twice
            if found.iter().any(|pd| pd.key == name) {
                continue;
            }
            found.push(PlatformDevice {
                is_default_input: default_input.as_deref() == Some(name.as_str()),
                is_default_output: default_output.as_deref() == Some(name.as_str()),
                key: name.clone(),
                name,
            });
        }
        Ok(found)
    }

    fn device_supported_configs(
        &self,
        device: &DeviceKey,
        direction: Direction,
    ) -> AudioResult<Vec<ConfigRange>> {
        let handle = find_device(device)?;

        let ranges: Vec<cpal::SupportedStreamConfigRange> = match direction {
            Direction::Input => handle.supported_input_configs().map(|it| it.collect()),
            Direction::Output => handle.supported_output_configs().map(|it| it.collect()),
        }
        .or_else(|e| match e {
            cpal::SupportedStreamConfigsError::DeviceNotAvailable => {
                Err(AudioError::DeviceNotFound(device.key.clone()))
            }
            other => {
                // Output-only devices on some backends error instead of listing nothing
                log::debug!("No {direction} configs for {}: {other}", device.key);
                Ok(Vec::new())
            }
        })?;

        Ok(ranges
            .iter()
            .filter_map(|range| {
                Some(ConfigRange::new(
                    range.min_sample_rate().0,
                    range.max_sample_rate().0,
                    range.channels(),
                    to_sample_format(range.sample_format())?,
                ))
            })
            .collect())
    }

    fn device_default_config(
        &self,
        device: &DeviceKey,
        direction: Direction,
    ) -> AudioResult<StreamConfig> {
        let handle = find_device(device)?;

        let config = match direction {
            Direction::Input => handle.default_input_config(),
            Direction::Output => handle.default_output_config(),
        }
        .map_err(|e| match e {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => {
                AudioError::DeviceNotFound(device.key.clone())
            }
            cpal::DefaultStreamConfigError::StreamTypeNotSupported => AudioError::NoSupportedConfig {
                device: device.key.clone(),
                direction,
            },
            other => AudioError::Backend(format!("Failed to get default config: {other}")),
        })?;

        let format = to_sample_format(config.sample_format()).ok_or_else(|| {
            AudioError::NoSupportedConfig {
                device: device.key.clone(),
                direction,
            }
        })?;
        Ok(StreamConfig::new(config.sample_rate().0, config.channels(), format))
    }

    fn open_stream(
        &self,
        device: &DeviceKey,
        config: &StreamConfig,
        callback: RealtimeCallback,
        on_error: ErrorCallback,
    ) -> AudioResult<Box<dyn PlatformStream>> {
        let (ready_tx, ready_rx) = bounded::<AudioResult<()>>(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let key = device.clone();
        let config = *config;

        let thread = thread::Builder::new()
            .name("hostaudio-cpal".into())
            .spawn(move || run_stream_thread(key, config, callback, on_error, ready_tx, stop_rx))
            .map_err(|e| AudioError::Backend(format!("Failed to spawn audio thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(CpalStream {
                stop_tx: Some(stop_tx),
                thread: Some(thread),
            })),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(AudioError::Backend("Audio thread exited before the stream started".into()))
            }
        }
    }
}

/// Owns the `!Send` cpal stream for its whole life
fn run_stream_thread(
    key: DeviceKey,
    config: StreamConfig,
    callback: RealtimeCallback,
    on_error: ErrorCallback,
    ready: Sender<AudioResult<()>>,
    stop: Receiver<()>,
) {
    let stream = match start_stream(&key, &config, callback, on_error) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    // Blocks until stop() sends or drops the sender
    let _ = stop.recv();
    drop(stream);
    log::debug!("cpal stream on {} released", key.key);
}

fn start_stream(
    key: &DeviceKey,
    config: &StreamConfig,
    callback: RealtimeCallback,
    on_error: ErrorCallback,
) -> AudioResult<cpal::Stream> {
    let device = find_device(key)?;
    let stream_config = cpal::StreamConfig {
        channels: config.channels,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = match config.sample_format {
        SampleFormat::I8 => build_stream::<i8>(&device, &stream_config, callback, on_error),
        SampleFormat::U8 => build_stream::<u8>(&device, &stream_config, callback, on_error),
        SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, callback, on_error),
        SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, callback, on_error),
        SampleFormat::I32 => build_stream::<i32>(&device, &stream_config, callback, on_error),
        SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, callback, on_error),
    }
    .map_err(|e| match e {
        cpal::BuildStreamError::DeviceNotAvailable => AudioError::DeviceNotFound(key.key.clone()),
        cpal::BuildStreamError::StreamConfigNotSupported => AudioError::UnsupportedConfig(*config),
        other => AudioError::Backend(format!("Failed to build stream: {other}")),
    })?;

    stream
        .play()
        .map_err(|e| AudioError::Backend(format!("Failed to start stream: {e}")))?;

    log::debug!("cpal stream running on {} ({config})", key.key);
    Ok(stream)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    callback: RealtimeCallback,
    mut on_error: ErrorCallback,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + DeviceSample,
{
    let error_callback = move |err: cpal::StreamError| on_error(err.to_string());

    match callback {
        RealtimeCallback::Output(mut callback) => device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| callback(T::output_buffer(data)),
            error_callback,
            None,
        ),
        RealtimeCallback::Input(mut callback) => device.build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| callback(T::input_buffer(data)),
            error_callback,
            None,
        ),
    }
}

/// Handle to a stream living on its own thread
pub struct CpalStream {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl PlatformStream for CpalStream {
    fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("cpal stream thread panicked");
            }
        }
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.stop();
    }
}
