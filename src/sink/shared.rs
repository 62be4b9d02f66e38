//! State shared between the control half and the real-time half.
//!
//! The control thread is the only writer of the lifecycle state and the format;
//! the real-time thread is the only writer of the counters. Nothing here blocks
//! or allocates. Bindings don't live here: they travel to the processor over a
//! ring buffer.

use core::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::format::AudioFormat;
use crate::node::LifecycleState;

/// Something the processor noticed, logged later by the control half.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Report {
    /// Pending index outside the buffer table
    InvalidBufferId { id: u32, capacity: u32 },
    /// Pending index pointing at an empty slot
    MissingBuffer { id: u32 },
    /// Periodic totals
    Dropped { frames: u64, buffers: u64 },
}

/// Counters as seen from the control thread.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct StatsSnapshot {
    /// Frames consumed since creation
    pub frames: u64,
    /// Buffers consumed since creation
    pub buffers: u64,
    /// Reports dropped because the report queue was full
    pub lost_reports: u64,
}

pub(crate) struct Shared {
    state: AtomicU8,
    format: AtomicU64,
    frames: AtomicU64,
    buffers: AtomicU64,
    lost_reports: AtomicU64,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Created as u8),
            format: AtomicU64::new(0),
            frames: AtomicU64::new(0),
            buffers: AtomicU64::new(0),
            lost_reports: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn set_state(&self, state: LifecycleState) {
        self.state.store(state as u8, Ordering::Release);
    }

    #[inline]
    pub(crate) fn format(&self) -> Option<AudioFormat> {
        AudioFormat::unpack(self.format.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn set_format(&self, format: Option<AudioFormat>) {
        let bits = format.map_or(0, |f| f.pack());
        self.format.store(bits, Ordering::Release);
    }

    /// Account one consumed buffer; returns the new buffer total.
    ///
    /// Counters wrap on overflow.
    #[inline]
    pub(crate) fn record(&self, frames: u32) -> u64 {
        self.frames.fetch_add(u64::from(frames), Ordering::Relaxed);
        self.buffers.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    #[inline]
    pub(crate) fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn report_lost(&self) {
        self.lost_reports.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            buffers: self.buffers.load(Ordering::Relaxed),
            lost_reports: self.lost_reports.load(Ordering::Relaxed),
        }
    }
}
