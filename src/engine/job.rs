//! One chunked, cancellable hashing pass.

use tracing::debug;

use super::cancel::CancellationToken;
use super::progress::{Observer, ProgressEvent, ProgressGate};
use crate::config::ProcessConfig;
use crate::error::{Outcome, ValidateError};
use crate::hash::{Digest, Sha256};

/// Suffix appended to the stage label of the closing 100% event.
pub const FINALIZING_SUFFIX: &str = " - finalizing";

/// A single hashing pass over one buffer.
///
/// The job borrows its [`Sha256`] mutably for its whole lifetime, so one
/// engine can never serve two jobs at once. The engine is reset when the
/// job is created and is spent when the job completes.
///
/// # Example
///
/// ```
/// use docseal::{CancellationToken, NoopObserver, Outcome, ProcessConfig, ProcessingJob, Sha256};
///
/// let mut engine = Sha256::new();
/// let config = ProcessConfig::default();
/// let token = CancellationToken::new();
///
/// let job = ProcessingJob::new(&mut engine, b"abc", &config, "hashing", &token)?;
/// let outcome = job.run(&mut NoopObserver)?;
///
/// assert_eq!(
///     outcome,
///     Outcome::Done(Sha256::digest(b"abc")),
/// );
/// # Ok::<(), docseal::ValidateError>(())
/// ```
#[derive(Debug)]
pub struct ProcessingJob<'a> {
    engine: &'a mut Sha256,
    input: &'a [u8],
    chunk_size: usize,
    processed: u64,
    since_yield: usize,
    stage: &'a str,
    token: &'a CancellationToken,
    config: &'a ProcessConfig,
}

impl<'a> ProcessingJob<'a> {
    /// Prepares a pass over `input`.
    ///
    /// Returns error if `config` is invalid; nothing is hashed in that case.
    pub fn new(
        engine: &'a mut Sha256,
        input: &'a [u8],
        config: &'a ProcessConfig,
        stage: &'a str,
        token: &'a CancellationToken,
    ) -> Result<Self, ValidateError> {
        config.validate()?;
        engine.reset();

        Ok(Self {
            engine,
            input,
            chunk_size: config.effective_chunk_size(input.len() as u64),
            processed: 0,
            since_yield: 0,
            stage,
            token,
            config,
        })
    }

    /// Chunk size this pass slices its input with.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Bytes hashed so far.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Hashes the whole input, reporting progress to `observer`.
    ///
    /// The token is checked before every chunk. Once it is seen set the pass
    /// stops and returns [`Outcome::Cancelled`]; no digest is produced.
    #[tracing::instrument(
        name = "hash_pass",
        skip(self, observer),
        fields(stage = self.stage, total = self.input.len(), chunk_size = self.chunk_size)
    )]
    pub fn run(mut self, observer: &mut dyn Observer) -> Result<Outcome<Digest>, ValidateError> {
        let total = self.input.len() as u64;
        let mut gate = ProgressGate::new(self.config.progress_interval());

        observer.on_progress(ProgressEvent::start(self.stage, total));

        for chunk in self.input.chunks(self.chunk_size) {
            if self.token.is_cancelled() {
                debug!(processed = self.processed, "pass cancelled");
                return Ok(Outcome::Cancelled);
            }

            self.engine.update(chunk);
            self.processed += chunk.len() as u64;
            self.since_yield += chunk.len();

            let event = ProgressEvent::new(self.stage, self.processed, total);
            if gate.admit(event.progress) {
                observer.on_progress(event);
            }

            if self.since_yield >= self.config.yield_interval() {
                observer.on_yield();
                self.since_yield = 0;
            }
        }

        observer.on_progress(ProgressEvent::new(
            format!("{}{}", self.stage, FINALIZING_SUFFIX),
            total,
            total,
        ));

        let digest = self.engine.finalize();
        debug!(%digest, "pass finished");
        Ok(Outcome::Done(digest))
    }
}

/// Hashes `input` with a fresh engine in one call.
///
/// Convenience wrapper around [`ProcessingJob`] for callers that do not
/// reuse an engine.
pub fn hash_chunked(
    input: &[u8],
    config: &ProcessConfig,
    stage: &str,
    token: &CancellationToken,
    observer: &mut dyn Observer,
) -> Result<Outcome<Digest>, ValidateError> {
    let mut engine = Sha256::new();
    ProcessingJob::new(&mut engine, input, config, stage, token)?.run(observer)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::engine::progress::NoopObserver;

    fn data(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 13) as u8).collect()
    }

    #[test]
    fn test_digest_matches_one_shot() {
        let input = data(10_000);
        let config = ProcessConfig::default().with_chunk_size(1000);
        let outcome =
            hash_chunked(&input, &config, "s", &CancellationToken::new(), &mut NoopObserver)
                .unwrap();
        assert_eq!(outcome, Outcome::Done(Sha256::digest(&input)));
    }

    #[test]
    fn test_chunk_size_rounded_to_block_multiple() {
        let mut engine = Sha256::new();
        let config = ProcessConfig::default().with_chunk_size(100);
        let token = CancellationToken::new();
        let job = ProcessingJob::new(&mut engine, b"x", &config, "s", &token).unwrap();
        assert_eq!(job.chunk_size(), 64);
    }

    #[test]
    fn test_empty_input_reports_zero_then_hundred() {
        let mut events = Vec::new();
        let outcome = hash_chunked(
            b"",
            &ProcessConfig::default(),
            "s",
            &CancellationToken::new(),
            &mut |e: ProgressEvent| events.push(e),
        )
        .unwrap();

        assert_eq!(outcome, Outcome::Done(Sha256::digest(b"")));
        let percents: Vec<u8> = events.iter().map(|e| e.progress).collect();
        assert_eq!(percents, vec![0, 100]);
        assert_eq!(events[1].stage, "s - finalizing");
    }

    #[test]
    fn test_invalid_config_rejected_before_hashing() {
        let mut engine = Sha256::new();
        let config = ProcessConfig::default().with_chunk_size(0);
        let token = CancellationToken::new();
        let err = ProcessingJob::new(&mut engine, b"abc", &config, "s", &token).unwrap_err();
        assert!(matches!(err, ValidateError::InvalidConfig { .. }));
    }

    #[test]
    fn test_pre_cancelled_token() {
        let token = CancellationToken::new();
        token.cancel();
        let outcome = hash_chunked(
            &data(256),
            &ProcessConfig::default(),
            "s",
            &token,
            &mut NoopObserver,
        )
        .unwrap();
        assert!(outcome.is_cancelled());
    }

    #[test]
    fn test_cancel_from_yield_point() {
        struct CancelOnYield {
            token: CancellationToken,
            yields: usize,
        }

        impl Observer for CancelOnYield {
            fn on_progress(&mut self, _event: ProgressEvent) {}

            fn on_yield(&mut self) {
                self.yields += 1;
                self.token.cancel();
            }
        }

        let token = CancellationToken::new();
        let config = ProcessConfig::default()
            .with_chunk_size(64)
            .with_yield_interval(128);
        let mut observer = CancelOnYield {
            token: token.clone(),
            yields: 0,
        };

        let mut engine = Sha256::new();
        let input = data(4096);
        let job = ProcessingJob::new(&mut engine, &input, &config, "s", &token).unwrap();
        let outcome = job.run(&mut observer).unwrap();

        assert!(outcome.is_cancelled());
        assert_eq!(observer.yields, 1);
    }

    #[test]
    fn test_progress_monotonic_and_bounded() {
        let mut events = Vec::new();
        let config = ProcessConfig::default()
            .with_chunk_size(64)
            .with_progress_interval(Duration::ZERO);
        hash_chunked(
            &data(64 * 50),
            &config,
            "s",
            &CancellationToken::new(),
            &mut |e: ProgressEvent| events.push(e),
        )
        .unwrap();

        assert_eq!(events.first().map(|e| e.progress), Some(0));
        assert_eq!(events.last().map(|e| e.progress), Some(100));
        assert!(events.windows(2).all(|w| w[0].progress <= w[1].progress));
        assert!(events.iter().all(|e| e.processed <= e.total));
        assert_eq!(events.len(), 52);
    }

    #[test]
    fn test_engine_reused_across_jobs() {
        let mut engine = Sha256::new();
        let config = ProcessConfig::default();
        let token = CancellationToken::new();

        let first = ProcessingJob::new(&mut engine, b"first", &config, "s", &token)
            .unwrap()
            .run(&mut NoopObserver)
            .unwrap();
        let second = ProcessingJob::new(&mut engine, b"abc", &config, "s", &token)
            .unwrap()
            .run(&mut NoopObserver)
            .unwrap();

        assert_eq!(first, Outcome::Done(Sha256::digest(b"first")));
        assert_eq!(second, Outcome::Done(Sha256::digest(b"abc")));
    }
}
