//! Engine lifecycle status.
//!
//! The status only moves forward during a run:
//! `Uninitialised -> Ready -> Running -> Quitting -> ShuttingDown`, and
//! returns to `Uninitialised` once shutdown has released everything. It is
//! read by the render task, so it lives behind an atomic.

use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

/// Lifecycle status of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Status {
    Uninitialised = 0,
    Ready = 1,
    Running = 2,
    Quitting = 3,
    ShuttingDown = 4,
}

impl Status {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Status::Ready,
            2 => Status::Running,
            3 => Status::Quitting,
            4 => Status::ShuttingDown,
            _ => Status::Uninitialised,
        }
    }

    /// Whether the frame loop should keep going.
    pub fn is_live(self) -> bool {
        self < Status::ShuttingDown
    }
}

/// Status shared between the simulation side and the render task.
#[derive(Debug, Clone)]
pub struct SharedStatus {
    inner: Arc<AtomicU8>,
}

impl Default for SharedStatus {
    fn default() -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(Status::Uninitialised as u8)),
        }
    }
}

impl SharedStatus {
    pub fn get(&self) -> Status {
        Status::from_u8(self.inner.load(Ordering::Acquire))
    }

    /// Moves to `next` if that is a forward transition. Returns whether the
    /// status changed.
    pub fn advance(&self, next: Status) -> bool {
        self.inner
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                (next as u8 > cur).then_some(next as u8)
            })
            .is_ok()
    }

    /// Returns to `Uninitialised` at the end of shutdown.
    pub(crate) fn reset(&self) {
        self.inner
            .store(Status::Uninitialised as u8, Ordering::Release);
    }
}
