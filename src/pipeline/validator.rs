//! The dual-hash validator.
//!
//! A job moves through
//! `Idle -> HashingOriginal -> Extracting -> (HashingCleaned ->) Done`,
//! with `Cancelled` reachable from either hashing stage and `Errored` from
//! anywhere. The two passes run strictly one after the other on the same
//! engine.

use bytes::Bytes;
use tracing::{debug, info};

use super::result::{ValidationResult, now_ms};
use crate::block::{extract_block, parse_block_with_limit};
use crate::config::ProcessConfig;
use crate::engine::{CancellationToken, Observer, ProcessingJob, ProgressEvent};
use crate::error::{Outcome, ValidateError};
use crate::hash::Sha256;

/// Stage label of the pass over the document as supplied.
pub const STAGE_ORIGINAL: &str = "hashing original";

/// Stage label of the pass over the document without its block.
pub const STAGE_CLEANED: &str = "hashing without validation block";

/// Stage label of the event closing a successful job.
pub const STAGE_FINISHED: &str = "finished";

/// Where a [`Validator`] is in its current (or last) job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// No job has started.
    Idle,
    /// Hashing the document as supplied.
    HashingOriginal,
    /// Looking for the validation block.
    Extracting,
    /// Hashing the document without its block.
    HashingCleaned,
    /// The last job completed.
    Done,
    /// The last job was cancelled.
    Cancelled,
    /// The last job failed.
    Errored,
}

/// Runs validation jobs, one at a time, on a single owned engine.
///
/// `process` takes `&mut self`, so a validator (and its engine) can never be
/// shared by two jobs in flight. Sequential jobs reuse the engine.
///
/// # Example
///
/// ```
/// use docseal::{CancellationToken, NoopObserver, ProcessConfig, Validator};
///
/// let mut validator = Validator::new(ProcessConfig::default());
/// let input: &[u8] =
///     b"DATA1% === VALIDATION BLOCK ===\n% ENTITY: Acme\n% === END VALIDATION BLOCK ===DATA2";
///
/// let result = validator
///     .process(input, &CancellationToken::new(), &mut NoopObserver)?
///     .done()
///     .expect("not cancelled");
///
/// assert!(result.block_found);
/// assert_eq!(result.metadata_fields.unwrap().get("ENTITY"), Some("Acme"));
/// # Ok::<(), docseal::ValidateError>(())
/// ```
#[derive(Debug)]
pub struct Validator {
    config: ProcessConfig,
    engine: Sha256,
    stage: Stage,
}

impl Validator {
    /// Creates a validator with the given default configuration.
    pub fn new(config: ProcessConfig) -> Self {
        Self {
            config,
            engine: Sha256::new(),
            stage: Stage::Idle,
        }
    }

    /// Returns the default configuration.
    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    /// Returns the stage of the current or last job.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Validates `input` with the default configuration.
    pub fn process(
        &mut self,
        input: impl Into<Bytes>,
        token: &CancellationToken,
        observer: &mut dyn Observer,
    ) -> Result<Outcome<ValidationResult>, ValidateError> {
        let config = self.config;
        self.process_with(input, &config, token, observer)
    }

    /// Validates `input` with an explicit configuration.
    ///
    /// An invalid configuration fails before anything is hashed. A
    /// zero-length input is valid.
    #[tracing::instrument(skip_all, fields(chunk_size = config.chunk_size()))]
    pub fn process_with(
        &mut self,
        input: impl Into<Bytes>,
        config: &ProcessConfig,
        token: &CancellationToken,
        observer: &mut dyn Observer,
    ) -> Result<Outcome<ValidationResult>, ValidateError> {
        let input: Bytes = input.into();
        self.stage = Stage::Idle;

        let result = self.run(&input, config, token, observer);
        self.stage = match &result {
            Ok(Outcome::Done(_)) => Stage::Done,
            Ok(Outcome::Cancelled) => Stage::Cancelled,
            Err(_) => Stage::Errored,
        };
        debug!(stage = ?self.stage, "job ended");
        result
    }

    fn run(
        &mut self,
        input: &Bytes,
        config: &ProcessConfig,
        token: &CancellationToken,
        observer: &mut dyn Observer,
    ) -> Result<Outcome<ValidationResult>, ValidateError> {
        config.validate()?;
        let original_size = input.len() as u64;
        info!(original_size, "validating document");

        self.enter(Stage::HashingOriginal);
        let job = ProcessingJob::new(&mut self.engine, input, config, STAGE_ORIGINAL, token)?;
        let Outcome::Done(hash_with_block) = job.run(observer)? else {
            return Ok(Outcome::Cancelled);
        };

        self.enter(Stage::Extracting);
        let extraction = extract_block(input);
        if token.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        let (Some(block), Some(range)) = (extraction.block, extraction.block_range) else {
            observer.on_progress(ProgressEvent::new(STAGE_FINISHED, original_size, original_size));
            return Ok(Outcome::Done(ValidationResult {
                hash_with_block,
                hash_without_block: None,
                metadata_fields: None,
                block_found: false,
                original_size,
                cleaned_size: original_size,
                block_start: None,
                block_end: None,
                processed_at_ms: now_ms(),
            }));
        };

        self.enter(Stage::HashingCleaned);
        let cleaned = extraction.cleaned;
        let job = ProcessingJob::new(&mut self.engine, &cleaned, config, STAGE_CLEANED, token)?;
        let Outcome::Done(hash_without_block) = job.run(observer)? else {
            return Ok(Outcome::Cancelled);
        };

        let fields = parse_block_with_limit(&block, config.max_block_len());
        observer.on_progress(ProgressEvent::new(STAGE_FINISHED, original_size, original_size));

        Ok(Outcome::Done(ValidationResult {
            hash_with_block,
            hash_without_block: Some(hash_without_block),
            metadata_fields: Some(fields),
            block_found: true,
            original_size,
            cleaned_size: cleaned.len() as u64,
            block_start: Some(range.start as u64),
            block_end: Some(range.end as u64),
            processed_at_ms: now_ms(),
        }))
    }

    fn enter(&mut self, stage: Stage) {
        debug!(from = ?self.stage, to = ?stage, "stage transition");
        self.stage = stage;
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ProcessConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{END_MARKER, START_MARKER};
    use crate::engine::NoopObserver;

    fn sample_with_block() -> Vec<u8> {
        let mut v = b"DATA1".to_vec();
        v.extend_from_slice(START_MARKER);
        v.extend_from_slice(b"\n% ENTITY: Acme\n% BRAND: X\n");
        v.extend_from_slice(END_MARKER);
        v.extend_from_slice(b"DATA2");
        v
    }

    #[test]
    fn test_no_block() {
        let mut validator = Validator::default();
        let input: Vec<u8> = (0..10 * 1024).map(|i| (i * 31 + 7) as u8).collect();

        let result = validator
            .process(input.clone(), &CancellationToken::new(), &mut NoopObserver)
            .unwrap()
            .done()
            .unwrap();

        assert_eq!(result.hash_with_block, Sha256::digest(&input));
        assert!(!result.block_found);
        assert_eq!(result.hash_without_block, None);
        assert_eq!(result.metadata_fields, None);
        assert_eq!(result.cleaned_size, result.original_size);
        assert_eq!(result.canonical_hash(), result.hash_with_block);
        assert_eq!(validator.stage(), Stage::Done);
    }

    #[test]
    fn test_with_block() {
        let mut validator = Validator::default();
        let input = sample_with_block();

        let result = validator
            .process(input.clone(), &CancellationToken::new(), &mut NoopObserver)
            .unwrap()
            .done()
            .unwrap();

        assert!(result.block_found);
        assert_eq!(result.hash_with_block, Sha256::digest(&input));
        assert_eq!(result.hash_without_block, Some(Sha256::digest(b"DATA1DATA2")));
        let fields = result.metadata_fields.as_ref().unwrap();
        assert_eq!(fields.get("ENTITY"), Some("Acme"));
        assert_eq!(fields.get("BRAND"), Some("X"));
        assert_eq!(fields.len(), 2);
        assert_eq!(result.cleaned_size, 10);
        assert_eq!(result.block_start, Some(5));
        assert_eq!(result.block_len(), input.len() as u64 - 10);
        assert_eq!(result.canonical_hash(), Sha256::digest(b"DATA1DATA2"));
    }

    #[test]
    fn test_empty_input_is_valid() {
        let mut validator = Validator::default();
        let result = validator
            .process(Vec::new(), &CancellationToken::new(), &mut NoopObserver)
            .unwrap()
            .done()
            .unwrap();
        assert_eq!(result.hash_with_block, Sha256::digest(b""));
        assert_eq!(result.original_size, 0);
    }

    #[test]
    fn test_invalid_config_errors() {
        let mut validator = Validator::default();
        let config = ProcessConfig::default().with_chunk_size(usize::MAX);
        let err = validator
            .process_with(
                &b"abc"[..],
                &config,
                &CancellationToken::new(),
                &mut NoopObserver,
            )
            .unwrap_err();
        assert!(matches!(err, ValidateError::InvalidConfig { .. }));
        assert_eq!(validator.stage(), Stage::Errored);
    }

    #[test]
    fn test_cancelled_during_first_pass() {
        let mut validator = Validator::default();
        let token = CancellationToken::new();
        let cancel = token.clone();
        let mut observer = move |_event: ProgressEvent| cancel.cancel();

        let outcome = validator
            .process(sample_with_block(), &token, &mut observer)
            .unwrap();
        assert!(outcome.is_cancelled());
        assert_eq!(validator.stage(), Stage::Cancelled);
    }

    #[test]
    fn test_cancelled_during_second_pass() {
        let mut validator = Validator::default();
        let token = CancellationToken::new();
        let cancel = token.clone();
        let mut observer = move |event: ProgressEvent| {
            if event.stage == STAGE_CLEANED {
                cancel.cancel();
            }
        };

        let outcome = validator
            .process(sample_with_block(), &token, &mut observer)
            .unwrap();
        assert!(outcome.is_cancelled());
    }

    #[test]
    fn test_sequential_jobs_reuse_engine() {
        let mut validator = Validator::default();
        let token = CancellationToken::new();

        let first = validator
            .process(sample_with_block(), &token, &mut NoopObserver)
            .unwrap()
            .done()
            .unwrap();
        let second = validator
            .process(sample_with_block(), &token, &mut NoopObserver)
            .unwrap()
            .done()
            .unwrap();

        assert_eq!(first.hash_with_block, second.hash_with_block);
        assert_eq!(first.hash_without_block, second.hash_without_block);
    }
}
