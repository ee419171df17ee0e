//! Progress events and their rate limiting.

use std::time::{Duration, Instant};

/// Progress of one hashing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "protocol", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressEvent {
    /// Percentage complete, 0 to 100.
    pub progress: u8,
    /// Label of the pass that produced the event.
    pub stage: String,
    /// Bytes hashed so far.
    pub processed: u64,
    /// Bytes in the pass.
    pub total: u64,
}

impl ProgressEvent {
    /// Creates an event, deriving the percentage from `processed / total`.
    ///
    /// An empty pass reports 100% once `processed == total`.
    pub fn new(stage: impl Into<String>, processed: u64, total: u64) -> Self {
        Self {
            progress: percent(processed, total),
            stage: stage.into(),
            processed,
            total,
        }
    }

    /// The 0% event that opens a pass, including an empty one.
    pub fn start(stage: impl Into<String>, total: u64) -> Self {
        Self {
            progress: 0,
            stage: stage.into(),
            processed: 0,
            total,
        }
    }
}

/// Floor of `processed * 100 / total`.
fn percent(processed: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (u128::from(processed.min(total)) * 100 / u128::from(total)) as u8
}

/// Receives progress events and yield points from a running pass.
///
/// Any `FnMut(ProgressEvent)` closure is an observer that yields the
/// thread at each yield point.
pub trait Observer {
    /// Called with each progress event that passes the rate limit.
    fn on_progress(&mut self, event: ProgressEvent);

    /// Called at each cooperative yield point.
    ///
    /// This is where a host gets to run pending work, such as delivering a
    /// cancellation request, before the next chunk is hashed.
    fn on_yield(&mut self) {
        std::thread::yield_now();
    }
}

impl<F: FnMut(ProgressEvent)> Observer for F {
    fn on_progress(&mut self, event: ProgressEvent) {
        self(event)
    }
}

/// An observer that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_progress(&mut self, _event: ProgressEvent) {}

    fn on_yield(&mut self) {}
}

/// Decides which progress events are emitted.
///
/// 0% and 100% always pass. Anything in between passes only if `interval`
/// has elapsed since the previous emission.
#[derive(Debug, Clone)]
pub(crate) struct ProgressGate {
    interval: Duration,
    last_emit: Instant,
}

impl ProgressGate {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: Instant::now(),
        }
    }

    /// Returns true if an event at `progress` percent should be emitted now.
    pub(crate) fn admit(&mut self, progress: u8) -> bool {
        self.admit_at(progress, Instant::now())
    }

    pub(crate) fn admit_at(&mut self, progress: u8, now: Instant) -> bool {
        let due = now.saturating_duration_since(self.last_emit) >= self.interval;
        if progress == 0 || progress >= 100 || due {
            self.last_emit = now;
            return true;
        }
        false
    }
}
