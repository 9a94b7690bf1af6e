//! Input delivery thread
//!
//! The realtime callback only deposits captured samples into the transport.
//! A per-stream worker drains whole frames from it, adapts them to the
//! client's channel count and hands them to the application's
//! [`StreamDataHandler`], so a slow handler can never stall the audio thread.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::transport::TransportReader;
use crate::convert::adapt_channels_into;
use crate::domain::{AudioError, AudioResult, AudioSample};
use crate::ports::StreamDataHandler;

/// Coalescing wakeup from the realtime callback to the delivery thread.
///
/// Only the first notification after the delivery thread last woke reaches
/// the channel; the rest are a single atomic swap.
#[derive(Clone)]
pub struct WakeSignal {
    pending: Arc<AtomicBool>,
    sender: Sender<()>,
}

impl WakeSignal {
    pub fn channel() -> (Self, Receiver<()>) {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let signal = Self {
            pending: Arc::new(AtomicBool::new(false)),
            sender,
        };
        (signal, receiver)
    }

    pub fn notify(&self) {
        if !self.pending.swap(true, Ordering::AcqRel) {
            let _ = self.sender.try_send(());
        }
    }

    /// Re-arm before draining, so samples pushed after this point notify again
    fn rearm(&self) {
        self.pending.store(false, Ordering::Release);
    }

    /// Unconditional nudge, used on shutdown
    fn nudge(&self) {
        let _ = self.sender.try_send(());
    }
}

pub struct DeliveryWorker {
    shutdown: Arc<AtomicBool>,
    wake: WakeSignal,
    thread: Option<JoinHandle<()>>,
}

struct DeliveryLoop {
    shutdown: Arc<AtomicBool>,
    reader: TransportReader,
    handler: Box<dyn StreamDataHandler>,
    device_channels: usize,
    client_channels: u16,
    batch: Vec<f32>,
    adapted: Vec<f32>,
}

impl DeliveryWorker {
    pub fn spawn(
        reader: TransportReader,
        handler: Box<dyn StreamDataHandler>,
        device_channels: u16,
        client_channels: u16,
        wake: (WakeSignal, Receiver<()>),
        poll: Duration,
    ) -> AudioResult<Self> {
        let (signal, wake_rx) = wake;
        let shutdown = Arc::new(AtomicBool::new(false));
        let capacity = reader.capacity();

        let mut worker = DeliveryLoop {
            shutdown: Arc::clone(&shutdown),
            reader,
            handler,
            device_channels: device_channels.max(1) as usize,
            client_channels,
            batch: vec![0.0; capacity],
            adapted: Vec::with_capacity(capacity),
        };

        let flag = Arc::clone(&shutdown);
        let rearm = signal.clone();
        let thread = thread::Builder::new()
            .name("hostaudio-delivery".into())
            .spawn(move || {
                while !flag.load(Ordering::Acquire) {
                    match wake_rx.recv_timeout(poll) {
                        Ok(()) | Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                    if flag.load(Ordering::Acquire) {
                        break;
                    }
                    rearm.rearm();
                    worker.drain();
                }
                log::debug!("Delivery thread exiting");
            })
            .map_err(|e| AudioError::Backend(format!("Failed to spawn delivery thread: {e}")))?;

        Ok(Self {
            shutdown,
            wake: signal,
            thread: Some(thread),
        })
    }

    /// Stop delivering and join the thread. Samples still buffered are discarded.
    ///
    /// Called from the handler itself, the thread is detached instead and
    /// exits once the handler returns.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.wake.nudge();
        if let Some(thread) = self.thread.take() {
            if thread.thread().id() == thread::current().id() {
                log::debug!("Delivery stopped from its own handler, detaching");
                return;
            }
            if thread.join().is_err() {
                log::error!("Delivery thread panicked");
            }
        }
    }
}

impl Drop for DeliveryWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl DeliveryLoop {
    fn drain(&mut self) {
        while !self.shutdown.load(Ordering::Acquire) {
            let frames = self.reader.buffered() / self.device_channels;
            if frames == 0 {
                return;
            }

            let len = frames * self.device_channels;
            let read = self.reader.pop_into(&mut self.batch[..len]);
            let samples = &self.batch[..read];

            if self.client_channels as usize == self.device_channels {
                self.handler.on_data(samples);
            } else {
                self.adapted.clear();
                adapt_channels_into(
                    samples,
                    self.device_channels as u16,
                    self.client_channels,
                    &mut self.adapted,
                );
                self.handler.on_data(&self.adapted);
            }
        }
    }
}

/// Forwards each delivered batch into a bounded channel.
///
/// Batches are dropped when the receiver falls behind.
pub struct ChannelHandler {
    sender: Sender<Vec<AudioSample>>,
    dropped: u64,
}

impl ChannelHandler {
    pub fn new(sender: Sender<Vec<AudioSample>>) -> Self {
        Self { sender, dropped: 0 }
    }

    /// Handler plus the receiving end, holding at most `batches` pending batches
    pub fn bounded(batches: usize) -> (Self, Receiver<Vec<AudioSample>>) {
        let (sender, receiver) = crossbeam_channel::bounded(batches);
        (Self::new(sender), receiver)
    }
}

impl StreamDataHandler for ChannelHandler {
    fn on_data(&mut self, samples: &[AudioSample]) {
        match self.sender.try_send(samples.to_vec()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                if self.dropped.is_power_of_two() {
                    log::warn!("Input receiver is behind, {} batches dropped", self.dropped);
                }
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}
