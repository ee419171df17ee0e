//! docseal
//!
//! Integrity core for documents that carry an embedded validation block.
//!
//! `docseal` hashes a document twice with SHA-256: once as supplied, and once
//! with its validation block (a run of `% KEY: VALUE` lines framed by two
//! fixed markers) cut out. The block's lines are decoded into ordered
//! metadata fields. Both passes are chunked, report rate-limited progress,
//! yield cooperatively and can be cancelled between chunks.
//!
//! The crate intentionally:
//! - does NOT read files or manage paths
//! - does NOT verify hashes against a remote registry
//! - does NOT insert validation blocks into documents
//!
//! It only does one thing: **bytes in → hash with block, hash without block, metadata out**
//!
//! # Sync
//!
//! ```
//! use docseal::{CancellationToken, ProcessConfig, ProgressEvent, Validator};
//!
//! let mut validator = Validator::new(ProcessConfig::default());
//! let doc = b"%PDF-1.7 ...% === VALIDATION BLOCK ===\n% SEAL: 42\n% === END VALIDATION BLOCK ===";
//!
//! let outcome = validator.process(
//!     &doc[..],
//!     &CancellationToken::new(),
//!     &mut |event: ProgressEvent| println!("{} {}%", event.stage, event.progress),
//! )?;
//!
//! if let Some(result) = outcome.done() {
//!     println!("with block:    {}", result.hash_with_block);
//!     println!("without block: {}", result.canonical_hash());
//! }
//! # Ok::<(), docseal::ValidateError>(())
//! ```
//!
//! # Worker (feature = "protocol")
//!
//! ```no_run
//! use std::time::Duration;
//! use docseal::{ProcessConfig, ProtocolOptions, Worker};
//!
//! let worker = Worker::spawn(ProcessConfig::default(), ProtocolOptions::default())?;
//! let bytes = std::fs::read("contract.pdf")?;
//! let outcome = worker.validate_with_timeout(bytes, Duration::from_secs(30), |event| {
//!     println!("{} {}%", event.stage, event.progress);
//! })?;
//! # Ok::<(), docseal::ValidateError>(())
//! ```
//!
//! # Async (feature = "async-io")
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use docseal::{hash_async, CancellationToken, HashEvent, ProcessConfig};
//!
//! async fn demo(bytes: Vec<u8>) -> Result<(), docseal::ValidateError> {
//!     let token = CancellationToken::new();
//!     let mut stream = hash_async(bytes, &ProcessConfig::default(), "hashing", &token)?;
//!
//!     while let Some(event) = stream.next().await {
//!         if let HashEvent::Finished(digest) = event {
//!             println!("{digest}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod block;
mod config;
mod engine;
mod error;
mod hash;
mod pipeline;

mod util; // internal byte search and splicing

#[cfg(feature = "async-io")]
mod async_stream;

#[cfg(feature = "protocol")]
mod protocol;

//
// Public surface
//

pub use block::{
    DECODE_ERROR_KEY, DECODE_ERROR_MESSAGE, END_MARKER, ExtractionResult, MetadataFields,
    START_MARKER, extract_block, find_marker, parse_block, parse_block_with_limit,
};
pub use config::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_BLOCK_LEN, DEFAULT_PROGRESS_INTERVAL, DEFAULT_YIELD_INTERVAL,
    LARGE_INPUT_MIN_CHUNK, LARGE_INPUT_THRESHOLD, MAX_CHUNK_SIZE, ProcessConfig,
};
pub use engine::{
    CancellationToken, FINALIZING_SUFFIX, NoopObserver, Observer, ProcessingJob, ProgressEvent,
    hash_chunked,
};
pub use error::{Outcome, ValidateError};
pub use hash::{BLOCK_SIZE, Digest, Sha256};
pub use pipeline::{
    STAGE_CLEANED, STAGE_FINISHED, STAGE_ORIGINAL, Stage, ValidationResult, Validator,
};

#[cfg(feature = "async-io")]
pub use async_stream::{HashEvent, HashStream, hash_async};

#[cfg(feature = "protocol")]
pub use protocol::{
    CANCELLED_MESSAGE, Inbound, JobId, Outbound, ProtocolOptions, WORKER_NAME, Worker,
};
