//! Integration tests: stream lifecycle and data transport
//!
//! Everything runs against `MockBackend`, whose stream probes let the test
//! play the part of the OS audio thread: `render` pulls one output buffer,
//! `capture` pushes one input buffer, `fail` reports a driver error.
//!
//! Run with: cargo test --test stream_lifecycle

use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use hostaudio::adapters::mock_backend::{MockBackend, MockStreamProbe};
use hostaudio::commands::{devices, streams, CommandError};
use hostaudio::convert::SampleBuffer;
use hostaudio::domain::{
    AudioError, EngineConfig, ErrorKind, SampleFormat, StreamConfig, StreamOptions,
    MAX_TARGET_LATENCY_MS,
};
use hostaudio::{AudioState, ChannelHandler, StreamState};

fn setup() -> (Arc<MockBackend>, AudioState) {
    let backend = Arc::new(MockBackend::new());
    let state = AudioState::with_backend(backend.clone(), EngineConfig::default());
    (backend, state)
}

fn speakers(state: &AudioState) -> String {
    devices::default_output_device(state).unwrap().id.to_string()
}

fn microphone(state: &AudioState) -> String {
    devices::default_input_device(state).unwrap().id.to_string()
}

fn stereo_f32() -> StreamConfig {
    StreamConfig::new(48_000, 2, SampleFormat::F32)
}

fn open_output(state: &AudioState, config: StreamConfig) -> String {
    streams::create_stream(state, &speakers(state), false, config, None).unwrap()
}

/// `frames` frames of a sine, same value on every channel
fn sine(freq: f32, sample_rate: u32, channels: u16, frames: usize) -> Vec<f32> {
    (0..frames)
        .flat_map(|n| {
            let value = (2.0 * PI * freq * n as f32 / sample_rate as f32).sin() * 0.5;
            std::iter::repeat(value).take(channels as usize)
        })
        .collect()
}

fn kind<T: std::fmt::Debug>(result: Result<T, CommandError>) -> ErrorKind {
    result.unwrap_err().kind
}

/// Collect delivered batches until `len` samples have arrived
fn collect(batches: &Receiver<Vec<f32>>, len: usize) -> Vec<f32> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut out = Vec::new();
    while out.len() < len {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match batches.recv_timeout(remaining) {
            Ok(batch) => out.extend(batch),
            Err(_) => panic!("timed out with {} of {len} samples", out.len()),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn sine_playback_pause_resume_close() {
    let (_backend, state) = setup();
    let handle = open_output(&state, stereo_f32());
    let tone = sine(440.0, 48_000, 2, 1024);

    assert!(streams::write_to_stream(&state, &handle, &tone).is_ok());
    assert!(streams::is_stream_active(&state, &handle).unwrap());

    streams::pause_stream(&state, &handle).unwrap();
    assert!(!streams::is_stream_active(&state, &handle).unwrap());
    assert_eq!(
        kind(streams::write_to_stream(&state, &handle, &tone)),
        ErrorKind::StreamNotActive
    );

    streams::resume_stream(&state, &handle).unwrap();
    assert!(streams::write_to_stream(&state, &handle, &tone).is_ok());

    streams::close_stream(&state, &handle).unwrap();
    assert_eq!(
        kind(streams::write_to_stream(&state, &handle, &tone)),
        ErrorKind::StreamNotFound
    );
}

#[test]
fn new_stream_is_immediately_active() {
    let (_backend, state) = setup();
    for config in [
        stereo_f32(),
        StreamConfig::new(44_100, 2, SampleFormat::I16),
        StreamConfig::new(44_100, 1, SampleFormat::F32),
    ] {
        let handle = open_output(&state, config);
        assert!(streams::is_stream_active(&state, &handle).unwrap());
    }
}

#[test]
fn pause_and_resume_are_idempotent() {
    let (_backend, state) = setup();
    let handle = open_output(&state, stereo_f32());

    streams::resume_stream(&state, &handle).unwrap();
    streams::resume_stream(&state, &handle).unwrap();
    assert!(streams::is_stream_active(&state, &handle).unwrap());

    streams::pause_stream(&state, &handle).unwrap();
    streams::pause_stream(&state, &handle).unwrap();
    assert!(!streams::is_stream_active(&state, &handle).unwrap());
}

#[test]
fn closed_handle_fails_everything_but_is_active() {
    let (_backend, state) = setup();
    let handle = open_output(&state, stereo_f32());
    streams::close_stream(&state, &handle).unwrap();

    assert_eq!(kind(streams::pause_stream(&state, &handle)), ErrorKind::StreamNotFound);
    assert_eq!(kind(streams::resume_stream(&state, &handle)), ErrorKind::StreamNotFound);
    assert_eq!(kind(streams::close_stream(&state, &handle)), ErrorKind::StreamNotFound);
    assert_eq!(kind(streams::stream_info(&state, &handle)), ErrorKind::StreamNotFound);
    assert_eq!(streams::is_stream_active(&state, &handle), Ok(false));
}

#[test]
fn never_issued_handles_are_not_found() {
    let (_backend, state) = setup();
    assert_eq!(
        kind(streams::is_stream_active(&state, "stream-42-0")),
        ErrorKind::StreamNotFound
    );
    assert_eq!(
        kind(streams::is_stream_active(&state, "not-a-handle")),
        ErrorKind::StreamNotFound
    );
    assert_eq!(kind(streams::pause_stream(&state, "stream-0-0")), ErrorKind::StreamNotFound);
}

#[test]
fn empty_write_is_invalid_for_any_handle() {
    let (_backend, state) = setup();
    let live = open_output(&state, stereo_f32());
    let closed = open_output(&state, stereo_f32());
    streams::close_stream(&state, &closed).unwrap();

    for handle in [live.as_str(), closed.as_str(), "stream-9-9", "garbage"] {
        assert_eq!(
            kind(streams::write_to_stream(&state, handle, &[])),
            ErrorKind::InvalidBufferSize
        );
    }
}

#[test]
fn close_stops_the_platform_stream() {
    let (backend, state) = setup();
    let handle = open_output(&state, stereo_f32());
    let probe = backend.last_stream().unwrap();

    assert!(probe.render(16).is_some());
    streams::close_stream(&state, &handle).unwrap();

    assert!(probe.is_stopped());
    assert!(probe.render(16).is_none());
}

#[test]
fn dropping_the_state_closes_every_stream() {
    let (backend, state) = setup();
    open_output(&state, stereo_f32());
    open_output(&state, stereo_f32());
    let probes: Vec<MockStreamProbe> = backend.streams();

    drop(state);
    assert!(probes.iter().all(MockStreamProbe::is_stopped));
}

// ---------------------------------------------------------------------------
// Creation errors
// ---------------------------------------------------------------------------

#[test]
fn create_validates_its_inputs() {
    let (backend, state) = setup();
    let out = speakers(&state);
    let mic = microphone(&state);

    let zero_channels = StreamConfig::new(48_000, 0, SampleFormat::F32);
    assert_eq!(
        kind(streams::create_stream(&state, &out, false, zero_channels, None)),
        ErrorKind::InvalidConfig
    );

    let mono = StreamConfig::new(48_000, 1, SampleFormat::F32);
    assert_eq!(
        kind(streams::create_stream(&state, &mic, true, mono, None)),
        ErrorKind::InvalidCallback
    );

    let too_fast = StreamConfig::new(384_000, 2, SampleFormat::F32);
    assert_eq!(
        kind(streams::create_stream(&state, &out, false, too_fast, None)),
        ErrorKind::UnsupportedConfig
    );

    assert_eq!(
        kind(streams::create_stream(&state, "device-77-0", false, stereo_f32(), None)),
        ErrorKind::DeviceNotFound
    );

    assert!(backend.streams().is_empty());
}

#[test]
fn oversized_latency_is_rejected_before_allocating() {
    let (backend, state) = setup();
    let out = speakers(&state);

    for latency in [MAX_TARGET_LATENCY_MS + 1, u32::MAX] {
        let options = StreamOptions {
            client_channels: None,
            target_latency_ms: Some(latency),
        };
        let result =
            streams::create_stream_with_options(&state, &out, false, stereo_f32(), None, options);
        assert_eq!(kind(result), ErrorKind::InvalidConfig);
    }
    assert!(backend.streams().is_empty());

    let options = StreamOptions {
        client_channels: None,
        target_latency_ms: Some(MAX_TARGET_LATENCY_MS),
    };
    let handle =
        streams::create_stream_with_options(&state, &out, false, stereo_f32(), None, options)
            .unwrap();
    assert_eq!(streams::stream_info(&state, &handle).unwrap().capacity, 960_000);
}

#[test]
fn unvalidated_engine_latency_fails_stream_creation() {
    let backend = Arc::new(MockBackend::new());
    let config = EngineConfig {
        target_latency_ms: u32::MAX,
        ..EngineConfig::default()
    };
    let state = AudioState::with_backend(backend.clone(), config);

    let result = streams::create_stream(&state, &speakers(&state), false, stereo_f32(), None);
    assert_eq!(kind(result), ErrorKind::InvalidConfig);
    assert!(backend.streams().is_empty());
}

#[test]
fn backend_open_failure_registers_nothing() {
    let (backend, state) = setup();
    backend.fail_next_open("device busy");

    let result = streams::create_stream(&state, &speakers(&state), false, stereo_f32(), None);
    assert_eq!(kind(result), ErrorKind::Backend);
    assert!(state.streams.streams().is_empty());

    // The failure was one-shot
    open_output(&state, stereo_f32());
}

// ---------------------------------------------------------------------------
// Output transport
// ---------------------------------------------------------------------------

#[test]
fn tight_loop_writes_eventually_fill_the_buffer() {
    let (_backend, state) = setup();
    let handle = open_output(&state, stereo_f32());
    let block = sine(440.0, 48_000, 2, 1024);

    let mut accepted = 0;
    let err = loop {
        match state
            .streams
            .write_to_stream(handle.parse().unwrap(), &block)
        {
            Ok(()) => accepted += 1,
            Err(e) => break e,
        }
        assert!(accepted < 100, "buffer never filled");
    };

    // 100 ms at 48 kHz stereo is 9600 samples: four blocks fit, the fifth doesn't
    assert_eq!(accepted, 4);
    assert_eq!(
        err,
        AudioError::BufferFull {
            requested: 2048,
            available: 9600 - 4 * 2048,
        }
    );

    // The rejected write enqueued nothing
    let info = streams::stream_info(&state, &handle).unwrap();
    assert_eq!(info.buffered, 4 * 2048);
}

#[test]
fn render_converts_to_device_format() {
    let (backend, state) = setup();
    let handle = open_output(&state, StreamConfig::new(48_000, 2, SampleFormat::I16));
    let probe = backend.last_stream().unwrap();

    streams::write_to_stream(&state, &handle, &[0.5, -0.5, 0.25, -0.25]).unwrap();
    assert_eq!(
        probe.render(2),
        Some(SampleBuffer::I16(vec![16384, -16384, 8192, -8192]))
    );
}

#[test]
fn starved_output_plays_silence_and_counts_underruns() {
    let (backend, state) = setup();
    let handle = open_output(&state, stereo_f32());
    let probe = backend.last_stream().unwrap();

    streams::write_to_stream(&state, &handle, &[0.1, 0.2]).unwrap();
    assert_eq!(
        probe.render(2),
        Some(SampleBuffer::F32(vec![0.1, 0.2, 0.0, 0.0]))
    );

    let info = streams::stream_info(&state, &handle).unwrap();
    assert_eq!(info.underrun_samples, 2);
    assert_eq!(info.buffered, 0);
}

#[test]
fn paused_output_is_silent_and_keeps_queued_audio() {
    let (backend, state) = setup();
    let handle = open_output(&state, stereo_f32());
    let probe = backend.last_stream().unwrap();

    streams::write_to_stream(&state, &handle, &[0.3, 0.4]).unwrap();
    streams::pause_stream(&state, &handle).unwrap();

    assert_eq!(probe.render(1), Some(SampleBuffer::F32(vec![0.0, 0.0])));
    assert_eq!(streams::stream_info(&state, &handle).unwrap().buffered, 2);

    streams::resume_stream(&state, &handle).unwrap();
    assert_eq!(probe.render(1), Some(SampleBuffer::F32(vec![0.3, 0.4])));
}

#[test]
fn non_finite_samples_pass_through_to_float_devices() {
    let (backend, state) = setup();
    let handle = open_output(&state, stereo_f32());
    let probe = backend.last_stream().unwrap();

    streams::write_to_stream(&state, &handle, &[f32::NAN, f32::INFINITY]).unwrap();
    let Some(SampleBuffer::F32(out)) = probe.render(1) else {
        panic!("expected an f32 buffer");
    };
    assert!(out[0].is_nan());
    assert_eq!(out[1], f32::INFINITY);
}

#[test]
fn mono_client_on_stereo_device_is_upmixed() {
    let (backend, state) = setup();
    let options = StreamOptions {
        client_channels: Some(1),
        target_latency_ms: None,
    };
    let handle = streams::create_stream_with_options(
        &state,
        &speakers(&state),
        false,
        stereo_f32(),
        None,
        options,
    )
    .unwrap();
    let probe = backend.last_stream().unwrap();

    streams::write_to_stream(&state, &handle, &[0.25, 0.5]).unwrap();
    assert_eq!(
        probe.render(2),
        Some(SampleBuffer::F32(vec![0.25, 0.25, 0.5, 0.5]))
    );
}

#[test]
fn partial_frames_are_rejected() {
    let (_backend, state) = setup();
    let handle = open_output(&state, stereo_f32());
    assert_eq!(
        kind(streams::write_to_stream(&state, &handle, &[0.1, 0.2, 0.3])),
        ErrorKind::InvalidBufferSize
    );
}

#[test]
fn stream_info_reports_configuration() {
    let (_backend, state) = setup();
    let device = speakers(&state);
    let options = StreamOptions {
        client_channels: None,
        target_latency_ms: Some(50),
    };
    let handle =
        streams::create_stream_with_options(&state, &device, false, stereo_f32(), None, options)
            .unwrap();

    let info = streams::stream_info(&state, &handle).unwrap();
    assert_eq!(info.id.to_string(), handle);
    assert_eq!(info.device_id.to_string(), device);
    assert_eq!(info.config, stereo_f32());
    assert_eq!(info.client_channels, 2);
    assert_eq!(info.state, StreamState::Running);
    // 50 ms at 48 kHz is 2400 frames, above the 1024-frame floor
    assert_eq!(info.capacity, 4800);

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["state"], "running");
    assert_eq!(json["direction"], "output");
    assert_eq!(json["deviceId"], device);
}

// ---------------------------------------------------------------------------
// Input transport
// ---------------------------------------------------------------------------

#[test]
fn captured_audio_reaches_the_handler() {
    let (backend, state) = setup();
    let (handler, batches) = ChannelHandler::bounded(64);
    let config = StreamConfig::new(48_000, 1, SampleFormat::F32);
    streams::create_stream(&state, &microphone(&state), true, config, Some(Box::new(handler)))
        .unwrap();
    let probe = backend.last_stream().unwrap();

    assert!(probe.capture(&SampleBuffer::F32(vec![0.1, 0.2, 0.3])));
    assert!(probe.capture(&SampleBuffer::F32(vec![0.4])));

    assert_eq!(collect(&batches, 4), vec![0.1, 0.2, 0.3, 0.4]);
}

#[test]
fn closure_handlers_work_too() {
    let (backend, state) = setup();
    let (tx, rx) = crossbeam_channel::unbounded();
    let handler = move |samples: &[f32]| {
        let _ = tx.send(samples.len());
    };
    let config = StreamConfig::new(16_000, 1, SampleFormat::I16);
    streams::create_stream(&state, &microphone(&state), true, config, Some(Box::new(handler)))
        .unwrap();

    let probe = backend.last_stream().unwrap();
    probe.capture(&SampleBuffer::I16(vec![0; 160]));

    let mut total = 0;
    while total < 160 {
        total += rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }
    assert_eq!(total, 160);
}

#[test]
fn integer_input_is_decoded_and_upmixed_for_the_client() {
    let (backend, state) = setup();
    let (handler, batches) = ChannelHandler::bounded(64);
    let options = StreamOptions {
        client_channels: Some(2),
        target_latency_ms: None,
    };
    streams::create_stream_with_options(
        &state,
        &microphone(&state),
        true,
        StreamConfig::new(48_000, 1, SampleFormat::I16),
        Some(Box::new(handler)),
        options,
    )
    .unwrap();

    let probe = backend.last_stream().unwrap();
    probe.capture(&SampleBuffer::I16(vec![16384, -16384]));

    assert_eq!(collect(&batches, 4), vec![0.5, 0.5, -0.5, -0.5]);
}

#[test]
fn paused_input_drops_captured_audio() {
    let (backend, state) = setup();
    let (handler, batches) = ChannelHandler::bounded(64);
    let config = StreamConfig::new(48_000, 1, SampleFormat::F32);
    let handle =
        streams::create_stream(&state, &microphone(&state), true, config, Some(Box::new(handler)))
            .unwrap();
    let probe = backend.last_stream().unwrap();

    streams::pause_stream(&state, &handle).unwrap();
    probe.capture(&SampleBuffer::F32(vec![0.9; 32]));
    streams::resume_stream(&state, &handle).unwrap();
    probe.capture(&SampleBuffer::F32(vec![0.1; 4]));

    assert_eq!(collect(&batches, 4), vec![0.1; 4]);
    assert!(batches.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn handler_can_close_its_own_stream() {
    let backend = Arc::new(MockBackend::new());
    let state = Arc::new(AudioState::with_backend(backend.clone(), EngineConfig::default()));
    let handle: Arc<OnceLock<String>> = Arc::default();
    let (result_tx, result_rx) = crossbeam_channel::bounded(1);

    let handler = {
        let state = Arc::clone(&state);
        let handle = Arc::clone(&handle);
        move |_: &[f32]| {
            if let Some(id) = handle.get() {
                let _ = result_tx.try_send(streams::close_stream(&state, id));
            }
        }
    };
    let config = StreamConfig::new(48_000, 1, SampleFormat::F32);
    let id =
        streams::create_stream(&state, &microphone(&state), true, config, Some(Box::new(handler)))
            .unwrap();
    handle.set(id.clone()).unwrap();

    let probe = backend.last_stream().unwrap();
    probe.capture(&SampleBuffer::F32(vec![0.1; 8]));

    let closed = result_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(closed, Ok(()));
    assert!(probe.is_stopped());
    assert_eq!(streams::is_stream_active(&state, &id), Ok(false));
    assert_eq!(kind(streams::close_stream(&state, &id)), ErrorKind::StreamNotFound);
}

#[test]
fn writing_to_an_input_stream_is_rejected() {
    let (_backend, state) = setup();
    let (handler, _batches) = ChannelHandler::bounded(4);
    let config = StreamConfig::new(48_000, 1, SampleFormat::F32);
    let handle =
        streams::create_stream(&state, &microphone(&state), true, config, Some(Box::new(handler)))
            .unwrap();

    assert_eq!(
        kind(streams::write_to_stream(&state, &handle, &[0.0])),
        ErrorKind::WrongDirection
    );
}

// ---------------------------------------------------------------------------
// Realtime faults and concurrency
// ---------------------------------------------------------------------------

#[test]
fn platform_fault_closes_the_stream() {
    let (backend, state) = setup();
    let handle = open_output(&state, stereo_f32());
    let probe = backend.last_stream().unwrap();

    probe.fail("device unplugged");

    assert_eq!(
        kind(streams::write_to_stream(&state, &handle, &[0.0, 0.0])),
        ErrorKind::StreamNotFound
    );
    assert!(probe.is_stopped());
    assert_eq!(streams::is_stream_active(&state, &handle), Ok(false));
    assert!(state.streams.streams().is_empty());
}

#[test]
fn faulted_stream_is_reaped_by_is_active() {
    let (backend, state) = setup();
    let handle = open_output(&state, stereo_f32());
    backend.last_stream().unwrap().fail("driver reset");

    assert_eq!(streams::is_stream_active(&state, &handle), Ok(false));
    assert_eq!(kind(streams::close_stream(&state, &handle)), ErrorKind::StreamNotFound);
}

#[test]
fn control_operations_race_safely_with_the_audio_thread() {
    let (backend, state) = setup();
    let handle = open_output(&state, stereo_f32());
    let probe = backend.last_stream().unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let audio_thread = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut callbacks = 0u32;
            while !done.load(Ordering::Acquire) {
                if probe.render(256).is_none() {
                    break;
                }
                callbacks += 1;
            }
            callbacks
        })
    };

    let block = sine(440.0, 48_000, 2, 256);
    for i in 0..200 {
        match streams::write_to_stream(&state, &handle, &block) {
            Ok(()) => {}
            Err(e) => assert!(
                matches!(e.kind, ErrorKind::BufferFull | ErrorKind::StreamNotActive),
                "unexpected error: {e}"
            ),
        }
        if i % 10 == 0 {
            streams::pause_stream(&state, &handle).unwrap();
        } else if i % 10 == 5 {
            streams::resume_stream(&state, &handle).unwrap();
        }
    }

    streams::close_stream(&state, &handle).unwrap();
    done.store(true, Ordering::Release);
    audio_thread.join().unwrap();
}
