//! Stream lifecycle state
//!
//! `Created → Running ⇄ Paused → Closed`. The state lives in one atomic byte
//! shared between the control thread and the realtime callback; the callback
//! only ever loads it.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum StreamState {
    Created = 0,
    Running = 1,
    Paused = 2,
    Closed = 3,
}

impl StreamState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Running,
            2 => Self::Paused,
            _ => Self::Closed,
        }
    }
}

#[derive(Debug)]
pub struct AtomicStreamState(AtomicU8);

impl AtomicStreamState {
    pub fn new(state: StreamState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub fn load(&self) -> StreamState {
        StreamState::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.load() == StreamState::Running
    }

    /// `Created → Running`. Fails if the stream was closed in the meantime.
    pub fn start(&self) -> bool {
        self.transition(StreamState::Created, StreamState::Running)
    }

    /// `Running → Paused`; already paused counts as success
    pub fn pause(&self) -> bool {
        self.transition(StreamState::Running, StreamState::Paused)
            || self.load() == StreamState::Paused
    }

    /// `Paused → Running`; already running counts as success
    pub fn resume(&self) -> bool {
        self.transition(StreamState::Paused, StreamState::Running)
            || self.load() == StreamState::Running
    }

    /// Move to `Closed` from any state, returning the previous one
    pub fn close(&self) -> StreamState {
        StreamState::from_u8(self.0.swap(StreamState::Closed as u8, Ordering::AcqRel))
    }

    fn transition(&self, from: StreamState, to: StreamState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
