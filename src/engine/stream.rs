//! A live stream and everything it owns

use serde::Serialize;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use super::delivery::DeliveryWorker;
use super::lifecycle::{AtomicStreamState, StreamState};
use super::transport::{TransportStats, TransportWriter};
use crate::domain::{DeviceId, Direction, StreamConfig, StreamId};
use crate::ports::PlatformStream;

/// Snapshot of a stream for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub id: StreamId,
    pub device_id: DeviceId,
    pub direction: Direction,
    pub config: StreamConfig,
    pub client_channels: u16,
    pub state: StreamState,
    /// Transport capacity in samples
    pub capacity: usize,
    /// Samples queued for output; zero for input streams
    pub buffered: usize,
    pub underrun_samples: u64,
    pub overrun_samples: u64,
}

pub(crate) struct Stream {
    pub device: DeviceId,
    pub direction: Direction,
    pub config: StreamConfig,
    pub client_channels: u16,
    pub capacity: usize,
    pub state: Arc<AtomicStreamState>,
    pub stats: Arc<TransportStats>,
    /// First error reported by the platform after open
    pub fault: Arc<OnceLock<String>>,
    /// Producer half for output streams
    pub writer: Mutex<Option<TransportWriter>>,
    pub platform: Mutex<Option<Box<dyn PlatformStream>>>,
    pub delivery: Mutex<Option<DeliveryWorker>>,
}

impl Stream {
    pub fn info(&self, id: StreamId) -> StreamInfo {
        let buffered = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, TransportWriter::buffered);

        StreamInfo {
            id,
            device_id: self.device,
            direction: self.direction,
            config: self.config,
            client_channels: self.client_channels,
            state: self.state.load(),
            capacity: self.capacity,
            buffered,
            underrun_samples: self.stats.underrun_samples(),
            overrun_samples: self.stats.overrun_samples(),
        }
    }

    /// Close the stream and release its resources.
    ///
    /// The platform stream is stopped first, so no realtime invocation
    /// happens after this returns and the transport can be dropped safely.
    pub fn shutdown(&self) {
        self.state.close();

        let platform = self
            .platform
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut platform) = platform {
            platform.stop();
        }

        let delivery = self
            .delivery
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut delivery) = delivery {
            delivery.stop();
        }

        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
