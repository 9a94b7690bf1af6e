//! In-memory audio backend for development and testing without hardware.
//!
//! Activate by setting HOSTAUDIO_MOCK=1 in the environment:
//!
//!   HOSTAUDIO_MOCK=1 RUST_LOG=hostaudio=info cargo run
//!
//! No audio thread exists here. Every opened stream is recorded as a
//! [`MockStreamProbe`], and tests drive the realtime callback by hand with
//! `render` / `capture`, or simulate a driver failure with `fail`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::convert::SampleBuffer;
use crate::domain::{
    AudioError, AudioResult, ConfigRange, DeviceKey, Direction, Host, PlatformDevice,
    SampleFormat, StreamConfig,
};
use crate::ports::{AudioBackend, ErrorCallback, PlatformStream, RealtimeCallback};

pub const MOCK_HOST_ID: &str = "mock";
pub const MOCK_SPEAKERS: &str = "speakers";
pub const MOCK_MICROPHONE: &str = "microphone";

/// Rate the mock picks for default configs when the band allows it
const PREFERRED_RATE: u32 = 48_000;

#[derive(Debug, Clone)]
pub struct MockDevice {
    pub key: String,
    pub name: String,
    pub is_default_input: bool,
    pub is_default_output: bool,
    pub input_configs: Vec<ConfigRange>,
    pub output_configs: Vec<ConfigRange>,
}

impl MockDevice {
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            is_default_input: false,
            is_default_output: false,
            input_configs: Vec::new(),
            output_configs: Vec::new(),
        }
    }

    pub fn with_input(mut self, range: ConfigRange) -> Self {
        self.input_configs.push(range);
        self
    }

    pub fn with_output(mut self, range: ConfigRange) -> Self {
        self.output_configs.push(range);
        self
    }

    pub fn default_input(mut self) -> Self {
        self.is_default_input = true;
        self
    }

    pub fn default_output(mut self) -> Self {
        self.is_default_output = true;
        self
    }

    fn configs(&self, direction: Direction) -> &[ConfigRange] {
        match direction {
            Direction::Input => &self.input_configs,
            Direction::Output => &self.output_configs,
        }
    }
}

struct MockHost {
    id: String,
    name: String,
    devices: Vec<MockDevice>,
}

struct Inner {
    hosts: Vec<MockHost>,
    unavailable: bool,
    fail_next_open: Option<String>,
    streams: Vec<MockStreamProbe>,
}

pub struct MockBackend {
    inner: Mutex<Inner>,
}

impl MockBackend {
    /// One host with a stereo output device and a microphone
    pub fn new() -> Self {
        let speakers = MockDevice::new(MOCK_SPEAKERS, "Mock Speakers")
            .default_output()
            .with_output(ConfigRange::new(8_000, 192_000, 2, SampleFormat::F32))
            .with_output(ConfigRange::new(8_000, 192_000, 2, SampleFormat::I16))
            .with_output(ConfigRange::new(44_100, 48_000, 1, SampleFormat::F32));

        let microphone = MockDevice::new(MOCK_MICROPHONE, "Mock Microphone")
            .default_input()
            .with_input(ConfigRange::new(8_000, 96_000, 1, SampleFormat::F32))
            .with_input(ConfigRange::new(8_000, 96_000, 1, SampleFormat::I16))
            .with_input(ConfigRange::new(44_100, 48_000, 2, SampleFormat::F32));

        log::info!("[MOCK AUDIO] Initialized with host '{MOCK_HOST_ID}'");
        Self {
            inner: Mutex::new(Inner {
                hosts: vec![MockHost {
                    id: MOCK_HOST_ID.to_string(),
                    name: "Mock Audio".to_string(),
                    devices: vec![speakers, microphone],
                }],
                unavailable: false,
                fail_next_open: None,
                streams: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_host(&self, id: &str, name: &str) {
        self.lock().hosts.push(MockHost {
            id: id.to_string(),
            name: name.to_string(),
            devices: Vec::new(),
        });
    }

    /// Returns false if the host doesn't exist
    pub fn add_device(&self, host_id: &str, device: MockDevice) -> bool {
        let mut inner = self.lock();
        match inner.hosts.iter_mut().find(|host| host.id == host_id) {
            Some(host) => {
                log::info!("[MOCK AUDIO] Plugged in {} on {host_id}", device.name);
                host.devices.push(device);
                true
            }
            None => false,
        }
    }

    /// Simulate unplugging a device. Returns false if it wasn't there.
    pub fn remove_device(&self, host_id: &str, key: &str) -> bool {
        let mut inner = self.lock();
        let Some(host) = inner.hosts.iter_mut().find(|host| host.id == host_id) else {
            return false;
        };
        let before = host.devices.len();
        host.devices.retain(|device| device.key != key);
        let removed = host.devices.len() != before;
        if removed {
            log::info!("[MOCK AUDIO] Unplugged {key} from {host_id}");
        }
        removed
    }

    /// Pretend no audio subsystem is present
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Make the next `open_stream` fail with a backend error
    pub fn fail_next_open(&self, message: &str) {
        self.lock().fail_next_open = Some(message.to_string());
    }

    /// Every stream opened so far, in order
    pub fn streams(&self) -> Vec<MockStreamProbe> {
        self.lock().streams.clone()
    }

    pub fn last_stream(&self) -> Option<MockStreamProbe> {
        self.lock().streams.last().cloned()
    }

    fn with_device<R>(
        &self,
        key: &DeviceKey,
        f: impl FnOnce(&MockDevice) -> AudioResult<R>,
    ) -> AudioResult<R> {
        let inner = self.lock();
        let host = inner
            .hosts
            .iter()
            .find(|host| host.id == key.host_id)
            .ok_or_else(|| AudioError::HostNotFound(key.host_id.clone()))?;
        let device = host
            .devices
            .iter()
            .find(|device| device.key == key.key)
            .ok_or_else(|| AudioError::DeviceNotFound(key.key.clone()))?;
        f(device)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for MockBackend {
    fn enumerate_hosts(&self) -> AudioResult<Vec<Host>> {
        let inner = self.lock();
        if inner.unavailable {
            return Ok(Vec::new());
        }
        Ok(inner
            .hosts
            .iter()
            .map(|host| Host {
                id: host.id.clone(),
                name: host.name.clone(),
            })
            .collect())
    }

    fn default_host_id(&self) -> AudioResult<String> {
        let inner = self.lock();
        if inner.unavailable {
            return Err(AudioError::PlatformUnavailable("mock backend disabled".into()));
        }
        inner
            .hosts
            .first()
            .map(|host| host.id.clone())
            .ok_or_else(|| AudioError::PlatformUnavailable("no mock hosts".into()))
    }

    fn enumerate_devices(&self, host_id: &str) -> AudioResult<Vec<PlatformDevice>> {
        let inner = self.lock();
        let host = inner
            .hosts
            .iter()
            .find(|host| host.id == host_id)
            .ok_or_else(|| AudioError::HostNotFound(host_id.to_string()))?;
        Ok(host
            .devices
            .iter()
            .map(|device| PlatformDevice {
                key: device.key.clone(),
                name: device.name.clone(),
                is_default_input: device.is_default_input,
                is_default_output: device.is_default_output,
            })
            .collect())
    }

    fn device_supported_configs(
        &self,
        device: &DeviceKey,
        direction: Direction,
    ) -> AudioResult<Vec<ConfigRange>> {
        self.with_device(device, |d| Ok(d.configs(direction).to_vec()))
    }

    fn device_default_config(
        &self,
        device: &DeviceKey,
        direction: Direction,
    ) -> AudioResult<StreamConfig> {
        self.with_device(device, |d| {
            d.configs(direction)
                .first()
                .map(|range| range.with_sample_rate(PREFERRED_RATE))
                .ok_or_else(|| AudioError::NoSupportedConfig {
                    device: d.key.clone(),
                    direction,
                })
        })
    }

    fn open_stream(
        &self,
        device: &DeviceKey,
        config: &StreamConfig,
        callback: RealtimeCallback,
        on_error: ErrorCallback,
    ) -> AudioResult<Box<dyn PlatformStream>> {
        let direction = callback.direction();
        self.with_device(device, |d| {
            if d.configs(direction).iter().any(|range| range.supports(config)) {
                Ok(())
            } else {
                Err(AudioError::UnsupportedConfig(*config))
            }
        })?;

        let mut inner = self.lock();
        if let Some(message) = inner.fail_next_open.take() {
            return Err(AudioError::Backend(message));
        }

        let probe = MockStreamProbe {
            shared: Arc::new(ProbeShared {
                device: device.clone(),
                config: *config,
                direction,
                callback: Mutex::new(Some(callback)),
                on_error: Mutex::new(Some(on_error)),
                stopped: AtomicBool::new(false),
            }),
        };
        inner.streams.push(probe.clone());
        log::info!("[MOCK AUDIO] Opened {direction} stream on {} ({config})", device.key);

        Ok(Box::new(MockPlatformStream { probe }))
    }
}

struct ProbeShared {
    device: DeviceKey,
    config: StreamConfig,
    direction: Direction,
    callback: Mutex<Option<RealtimeCallback>>,
    on_error: Mutex<Option<ErrorCallback>>,
    stopped: AtomicBool,
}

/// Test-side view of a stream opened on the mock backend
#[derive(Clone)]
pub struct MockStreamProbe {
    shared: Arc<ProbeShared>,
}

impl MockStreamProbe {
    pub fn device(&self) -> &DeviceKey {
        &self.shared.device
    }

    pub fn config(&self) -> StreamConfig {
        self.shared.config
    }

    pub fn direction(&self) -> Direction {
        self.shared.direction
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }

    /// Run one output callback for `frames` frames and return what the device got.
    ///
    /// `None` once the stream is stopped or if this is an input stream.
    pub fn render(&self, frames: usize) -> Option<SampleBuffer> {
        let config = self.shared.config;
        let mut callback = self
            .shared
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match callback.as_mut()? {
            RealtimeCallback::Output(render) => {
                let mut buffer =
                    SampleBuffer::silent(config.sample_format, config.samples_for_frames(frames));
                render(buffer.as_output());
                Some(buffer)
            }
            RealtimeCallback::Input(_) => None,
        }
    }

    /// Run one input callback with `samples` as the captured data.
    ///
    /// Returns false once the stream is stopped or if this is an output stream.
    pub fn capture(&self, samples: &SampleBuffer) -> bool {
        let mut callback = self
            .shared
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match callback.as_mut() {
            Some(RealtimeCallback::Input(capture)) => {
                capture(samples.as_input());
                true
            }
            _ => false,
        }
    }

    /// Report a driver error, as the platform would from its own thread
    pub fn fail(&self, message: &str) {
        let mut on_error = self
            .shared
            .on_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(on_error) = on_error.as_mut() {
            log::info!("[MOCK AUDIO] Injecting stream error: {message}");
            on_error(message.to_string());
        }
    }
}

struct MockPlatformStream {
    probe: MockStreamProbe,
}

impl PlatformStream for MockPlatformStream {
    fn stop(&mut self) {
        let shared = &self.probe.shared;
        if shared.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        // Waits for an in-flight render/capture, then releases the callback
        shared
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        shared
            .on_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        log::info!("[MOCK AUDIO] Stopped stream on {}", shared.device.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OutputBuffer;

    fn speakers() -> DeviceKey {
        DeviceKey {
            host_id: MOCK_HOST_ID.into(),
            key: MOCK_SPEAKERS.into(),
        }
    }

    #[test]
    fn test_default_config_prefers_48k() {
        let backend = MockBackend::new();
        let config = backend
            .device_default_config(&speakers(), Direction::Output)
            .unwrap();
        assert_eq!(config, StreamConfig::new(48_000, 2, SampleFormat::F32));
    }

    #[test]
    fn test_speakers_have_no_input_config() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.device_default_config(&speakers(), Direction::Input),
            Err(AudioError::NoSupportedConfig { .. })
        ));
    }

    #[test]
    fn test_render_drives_callback_until_stopped() {
        let backend = MockBackend::new();
        let callback = RealtimeCallback::Output(Box::new(|buffer: OutputBuffer<'_>| {
            if let OutputBuffer::F32(out) = buffer {
                out.fill(0.5);
            }
        }));
        let config = StreamConfig::new(48_000, 2, SampleFormat::F32);
        let mut stream = backend
            .open_stream(&speakers(), &config, callback, Box::new(|_| {}))
            .unwrap();

        let probe = backend.last_stream().unwrap();
        assert_eq!(probe.render(2), Some(SampleBuffer::F32(vec![0.5; 4])));

        stream.stop();
        stream.stop();
        assert!(probe.is_stopped());
        assert_eq!(probe.render(2), None);
    }

    #[test]
    fn test_fail_next_open() {
        let backend = MockBackend::new();
        backend.fail_next_open("driver busy");
        let callback = RealtimeCallback::Output(Box::new(|_: OutputBuffer<'_>| {}));
        let config = StreamConfig::new(48_000, 2, SampleFormat::F32);
        let result = backend.open_stream(&speakers(), &config, callback, Box::new(|_| {}));
        assert!(matches!(result, Err(AudioError::Backend(_))));
        assert!(backend.streams().is_empty());
    }

    #[test]
    fn test_remove_device() {
        let backend = MockBackend::new();
        assert!(backend.remove_device(MOCK_HOST_ID, MOCK_SPEAKERS));
        assert!(!backend.remove_device(MOCK_HOST_ID, MOCK_SPEAKERS));
        assert!(matches!(
            backend.device_supported_configs(&speakers(), Direction::Output),
            Err(AudioError::DeviceNotFound(_))
        ));
    }
}
