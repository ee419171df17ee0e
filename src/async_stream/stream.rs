//! Async stream adapter for a hashing pass.
//!
//! The stream hashes its buffer chunk by chunk from inside `poll_next` and
//! yields [`HashEvent`]s. After every yield interval worth of bytes it
//! returns `Poll::Pending` with the waker already re-armed, handing the
//! executor a chance to run other tasks (including whichever one cancels
//! the token) before the next chunk.
//!
//! # Example
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use docseal::{hash_async, CancellationToken, HashEvent, ProcessConfig};
//!
//! async fn demo(data: bytes::Bytes) -> Result<(), docseal::ValidateError> {
//!     let token = CancellationToken::new();
//!     let mut stream = hash_async(data, &ProcessConfig::default(), "hashing", &token)?;
//!
//!     while let Some(event) = stream.next().await {
//!         match event {
//!             HashEvent::Progress(p) => println!("{}%", p.progress),
//!             HashEvent::Finished(digest) => println!("{digest}"),
//!             HashEvent::Cancelled => println!("cancelled"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;

use crate::config::ProcessConfig;
use crate::engine::{CancellationToken, FINALIZING_SUFFIX, ProgressEvent, ProgressGate};
use crate::error::ValidateError;
use crate::hash::{Digest, Sha256};

/// One item of a [`HashStream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashEvent {
    /// A rate-limited progress update.
    Progress(ProgressEvent),
    /// The digest; always the last item of a completed pass.
    Finished(Digest),
    /// The token was seen set; always the last item of a cancelled pass.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Hashing,
    Finalizing,
    Done,
}

/// A hashing pass driven by polling.
#[derive(Debug)]
pub struct HashStream {
    input: Bytes,
    engine: Sha256,
    stage: String,
    token: CancellationToken,
    gate: ProgressGate,
    chunk_size: usize,
    yield_interval: usize,
    processed: usize,
    since_yield: usize,
    state: State,
}

impl HashStream {
    fn new(
        input: Bytes,
        config: &ProcessConfig,
        stage: String,
        token: CancellationToken,
    ) -> Result<Self, ValidateError> {
        config.validate()?;
        Ok(Self {
            chunk_size: config.effective_chunk_size(input.len() as u64),
            yield_interval: config.yield_interval(),
            gate: ProgressGate::new(config.progress_interval()),
            input,
            engine: Sha256::new(),
            stage,
            token,
            processed: 0,
            since_yield: 0,
            state: State::Start,
        })
    }

    fn total(&self) -> u64 {
        self.input.len() as u64
    }
}

impl Stream for HashStream {
    type Item = HashEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            match this.state {
                State::Start => {
                    this.state = State::Hashing;
                    let event = ProgressEvent::start(this.stage.as_str(), this.total());
                    return Poll::Ready(Some(HashEvent::Progress(event)));
                }
                State::Hashing => {
                    if this.processed == this.input.len() {
                        this.state = State::Finalizing;
                        let stage = format!("{}{}", this.stage, FINALIZING_SUFFIX);
                        let event = ProgressEvent::new(stage, this.total(), this.total());
                        return Poll::Ready(Some(HashEvent::Progress(event)));
                    }

                    if this.since_yield >= this.yield_interval {
                        this.since_yield = 0;
                        cx.waker().wake_by_ref();
                        return Poll::Pending;
                    }

                    if this.token.is_cancelled() {
                        this.state = State::Done;
                        return Poll::Ready(Some(HashEvent::Cancelled));
                    }

                    let end = (this.processed + this.chunk_size).min(this.input.len());
                    this.engine.update(&this.input[this.processed..end]);
                    this.since_yield += end - this.processed;
                    this.processed = end;

                    let processed = this.processed as u64;
                    let event = ProgressEvent::new(this.stage.as_str(), processed, this.total());
                    if this.gate.admit(event.progress) {
                        return Poll::Ready(Some(HashEvent::Progress(event)));
                    }
                }
                State::Finalizing => {
                    this.state = State::Done;
                    return Poll::Ready(Some(HashEvent::Finished(this.engine.finalize())));
                }
                State::Done => return Poll::Ready(None),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.state {
            State::Done => (0, Some(0)),
            State::Finalizing => (1, Some(1)),
            _ => (1, None),
        }
    }
}

/// Creates a hashing pass over `input` that is driven as an async stream.
///
/// Runtime-agnostic: the stream only relies on its waker, so it works on
/// tokio, async-std, smol or any other executor.
///
/// # Arguments
///
/// * `input` - The bytes to hash
/// * `config` - Chunk size, progress interval and yield interval
/// * `stage` - Label carried by every progress event
/// * `token` - Checked before every chunk
///
/// # Returns
///
/// A [`HashStream`], or an error if `config` is invalid.
pub fn hash_async(
    input: impl Into<Bytes>,
    config: &ProcessConfig,
    stage: impl Into<String>,
    token: &CancellationToken,
) -> Result<HashStream, ValidateError> {
    HashStream::new(input.into(), config, stage.into(), token.clone())
}
