//! Chunked hashing passes.
//!
//! - [`ProcessingJob`] - One pass: slice, hash, report, yield, honour cancellation
//! - [`CancellationToken`] - Shared cooperative cancellation flag
//! - [`Observer`] - Receives [`ProgressEvent`]s and yield points

mod cancel;
mod job;
mod progress;

pub use cancel::CancellationToken;
pub use job::{FINALIZING_SUFFIX, ProcessingJob, hash_chunked};
pub use progress::{NoopObserver, Observer, ProgressEvent};

pub(crate) use progress::ProgressGate;
