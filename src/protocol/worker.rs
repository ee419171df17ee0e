//! A validator running on its own thread behind a message channel.
//!
//! The worker thread owns one [`Validator`]. While a job runs, the thread
//! drains its inbox at every yield point of the hashing pass, which is where
//! `cancel` and `ping` get answered. A `process` that arrives mid-job is
//! refused with an error rather than queued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, info, warn};

use super::messages::{CANCELLED_MESSAGE, Inbound, JobId, Outbound, ProtocolOptions};
use crate::config::ProcessConfig;
use crate::engine::{CancellationToken, Observer, ProgressEvent};
use crate::error::{Outcome, ValidateError};
use crate::pipeline::{ValidationResult, Validator};

/// Handle to a background validation thread.
///
/// Dropping the handle closes the inbox and joins the thread; a job that is
/// still running is cancelled at its next yield point.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use docseal::{Outcome, ProcessConfig, ProtocolOptions, Worker};
///
/// let worker = Worker::spawn(ProcessConfig::default(), ProtocolOptions::default())?;
/// let outcome = worker.validate_with_timeout(b"abc".to_vec(), Duration::from_secs(60), |_| {})?;
///
/// match outcome {
///     Outcome::Done(result) => assert!(!result.block_found),
///     Outcome::Cancelled => unreachable!(),
/// }
/// # Ok::<(), docseal::ValidateError>(())
/// ```
#[derive(Debug)]
pub struct Worker {
    inbox: Option<Sender<Inbound>>,
    outbox: Receiver<Outbound>,
    thread: Option<JoinHandle<()>>,
    next_id: AtomicU64,
}

impl Worker {
    /// Starts the worker thread.
    pub fn spawn(config: ProcessConfig, options: ProtocolOptions) -> Result<Self, ValidateError> {
        config.validate()?;

        let (inbox_tx, inbox_rx) = flume::unbounded();
        let (outbox_tx, outbox_rx) = flume::unbounded();

        let thread = std::thread::Builder::new()
            .name("docseal-worker".to_string())
            .spawn(move || WorkerLoop::new(config, options, inbox_rx, outbox_tx).run())?;

        info!("worker started");
        Ok(Self {
            inbox: Some(inbox_tx),
            outbox: outbox_rx,
            thread: Some(thread),
            next_id: AtomicU64::new(1),
        })
    }

    /// Sends a message to the worker.
    pub fn send(&self, message: Inbound) -> Result<(), ValidateError> {
        self.inbox
            .as_ref()
            .ok_or(ValidateError::WorkerGone)?
            .send(message)
            .map_err(|_| ValidateError::WorkerGone)
    }

    /// Decodes a JSON message and sends it to the worker.
    pub fn send_json(&self, json: &str) -> Result<(), ValidateError> {
        self.send(Inbound::from_json(json)?)
    }

    /// Waits for the next message from the worker.
    pub fn recv(&self) -> Result<Outbound, ValidateError> {
        self.outbox.recv().map_err(|_| ValidateError::WorkerGone)
    }

    /// Waits up to `timeout` for the next message from the worker.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Outbound>, ValidateError> {
        match self.outbox.recv_timeout(timeout) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(ValidateError::WorkerGone),
        }
    }

    /// Runs one job and waits for its outcome, cancelling it after `timeout`.
    ///
    /// Progress events are passed to `on_progress` as they arrive. Once the
    /// deadline passes a `cancel` is sent and the call keeps waiting for the
    /// job's terminal message, which arrives at the job's next yield point.
    pub fn validate_with_timeout(
        &self,
        file: Vec<u8>,
        timeout: Duration,
        mut on_progress: impl FnMut(ProgressEvent),
    ) -> Result<Outcome<ValidationResult>, ValidateError> {
        let id = JobId::from(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.send(Inbound::process(file, None, Some(id.clone())))?;

        let deadline = Instant::now() + timeout;
        let mut cancel_sent = false;

        loop {
            let message = if cancel_sent {
                self.recv()?
            } else {
                match self.recv_timeout(deadline.saturating_duration_since(Instant::now()))? {
                    Some(message) => message,
                    None => {
                        warn!(?timeout, "job exceeded its deadline; cancelling");
                        self.send(Inbound::Cancel {
                            id: Some(id.clone()),
                        })?;
                        cancel_sent = true;
                        continue;
                    }
                }
            };

            if let Outbound::Progress(event) = message {
                on_progress(event);
                continue;
            }
            if message.id() != Some(&id) {
                continue;
            }

            match message {
                Outbound::Result { result, .. } => return Ok(Outcome::Done(result)),
                Outbound::Cancelled { .. } => return Ok(Outcome::Cancelled),
                Outbound::Error { error, .. } if error == CANCELLED_MESSAGE => {
                    return Ok(Outcome::Cancelled);
                }
                Outbound::Error { error, .. } => {
                    return Err(ValidateError::Failed { message: error });
                }
                _ => {}
            }
        }
    }

    /// Closes the inbox and waits for the thread to exit.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.inbox.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("worker thread panicked");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.close();
    }
}

/// State owned by the worker thread.
struct WorkerLoop {
    validator: Validator,
    options: ProtocolOptions,
    inbox: Receiver<Inbound>,
    outbox: Sender<Outbound>,
}

impl WorkerLoop {
    fn new(
        config: ProcessConfig,
        options: ProtocolOptions,
        inbox: Receiver<Inbound>,
        outbox: Sender<Outbound>,
    ) -> Self {
        Self {
            validator: Validator::new(config),
            options,
            inbox,
            outbox,
        }
    }

    fn run(mut self) {
        while let Ok(message) = self.inbox.recv() {
            match message {
                Inbound::Process {
                    file_buffer,
                    chunk_size,
                    id,
                } => self.run_job(file_buffer, chunk_size, id),
                Inbound::Cancel { id } => {
                    debug!("cancel with no job running");
                    self.emit(Outbound::aborted(id));
                }
                Inbound::Ping => self.emit(Outbound::pong()),
                Inbound::Unknown => warn!("ignoring message of unknown type"),
            }
        }
        debug!("worker inbox closed");
    }

    fn run_job(&mut self, file: Option<Vec<u8>>, chunk_size: Option<usize>, id: Option<JobId>) {
        let Some(file) = file else {
            let err = ValidateError::invalid_input("missing file buffer");
            self.emit(Outbound::error(err.to_string(), id));
            return;
        };

        let mut config = *self.validator.config();
        if let Some(size) = chunk_size {
            config = config.with_chunk_size(size);
        }

        let token = CancellationToken::new();
        let mut host = JobHost {
            inbox: &self.inbox,
            outbox: &self.outbox,
            token: &token,
        };

        let message = match self.validator.process_with(file, &config, &token, &mut host) {
            Ok(Outcome::Done(result)) => Outbound::result(result, id),
            Ok(Outcome::Cancelled) if self.options.legacy_cancel_as_error => {
                Outbound::error(CANCELLED_MESSAGE, id)
            }
            Ok(Outcome::Cancelled) => Outbound::Cancelled { id },
            Err(err) => {
                warn!(error = %err, "job failed");
                Outbound::error(err.to_string(), id)
            }
        };
        self.emit(message);
    }

    fn emit(&self, message: Outbound) {
        if self.outbox.send(message).is_err() {
            debug!("caller dropped the outbox");
        }
    }
}

/// The worker thread's view of a running job.
struct JobHost<'a> {
    inbox: &'a Receiver<Inbound>,
    outbox: &'a Sender<Outbound>,
    token: &'a CancellationToken,
}

impl Observer for JobHost<'_> {
    fn on_progress(&mut self, event: ProgressEvent) {
        let _ = self.outbox.send(Outbound::Progress(event));
    }

    fn on_yield(&mut self) {
        loop {
            match self.inbox.try_recv() {
                Ok(Inbound::Cancel { id }) => {
                    info!("cancel requested");
                    self.token.cancel();
                    let _ = self.outbox.send(Outbound::aborted(id));
                }
                Ok(Inbound::Ping) => {
                    let _ = self.outbox.send(Outbound::pong());
                }
                Ok(Inbound::Process { id, .. }) => {
                    let _ = self
                        .outbox
                        .send(Outbound::error(ValidateError::Busy.to_string(), id));
                }
                Ok(Inbound::Unknown) => warn!("ignoring message of unknown type"),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.token.cancel();
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{END_MARKER, START_MARKER};
    use crate::hash::Sha256;

    fn small_yield_config() -> ProcessConfig {
        ProcessConfig::default()
            .with_chunk_size(64)
            .with_yield_interval(64)
    }

    fn recv_terminal(worker: &Worker) -> Outbound {
        loop {
            let message = worker.recv().unwrap();
            if message.is_terminal() {
                return message;
            }
        }
    }

    #[test]
    fn test_ping_pong() {
        let worker = Worker::spawn(ProcessConfig::default(), ProtocolOptions::default()).unwrap();
        worker.send_json(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(worker.recv().unwrap(), Outbound::pong());
    }

    #[test]
    fn test_process_with_block() {
        let worker = Worker::spawn(ProcessConfig::default(), ProtocolOptions::default()).unwrap();
        let mut file = b"DATA1".to_vec();
        file.extend_from_slice(START_MARKER);
        file.extend_from_slice(b"\n% ENTITY: Acme\n");
        file.extend_from_slice(END_MARKER);
        file.extend_from_slice(b"DATA2");

        worker
            .send(Inbound::process(file, Some(128), Some(JobId::from("job-1"))))
            .unwrap();

        match recv_terminal(&worker) {
            Outbound::Result { success, result, id } => {
                assert!(success);
                assert_eq!(id, Some(JobId::from("job-1")));
                assert_eq!(result.hash_without_block, Some(Sha256::digest(b"DATA1DATA2")));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_buffer_is_error() {
        let worker = Worker::spawn(ProcessConfig::default(), ProtocolOptions::default()).unwrap();
        worker.send_json(r#"{"type":"process","id":3}"#).unwrap();

        match recv_terminal(&worker) {
            Outbound::Error { success, error, id } => {
                assert!(!success);
                assert!(error.contains("missing file buffer"));
                assert_eq!(id, Some(JobId::from(3)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_chunk_size_is_error() {
        let worker = Worker::spawn(ProcessConfig::default(), ProtocolOptions::default()).unwrap();
        worker.send(Inbound::process(b"abc".to_vec(), Some(0), None)).unwrap();
        assert!(matches!(recv_terminal(&worker), Outbound::Error { .. }));
    }

    #[test]
    fn test_cancel_after_first_progress() {
        let worker = Worker::spawn(small_yield_config(), ProtocolOptions::default()).unwrap();
        worker
            .send(Inbound::process(vec![0u8; 16 * 1024 * 1024], None, None))
            .unwrap();

        assert!(matches!(worker.recv().unwrap(), Outbound::Progress(_)));
        worker.send(Inbound::Cancel { id: None }).unwrap();

        let mut saw_aborted = false;
        loop {
            match worker.recv().unwrap() {
                Outbound::Aborted { .. } => saw_aborted = true,
                Outbound::Cancelled { .. } => break,
                Outbound::Result { .. } => panic!("cancelled job produced a result"),
                _ => {}
            }
        }
        assert!(saw_aborted);
    }

    #[test]
    fn test_legacy_cancel_reported_as_error() {
        let options = ProtocolOptions {
            legacy_cancel_as_error: true,
        };
        let worker = Worker::spawn(small_yield_config(), options).unwrap();
        worker
            .send(Inbound::process(vec![0u8; 16 * 1024 * 1024], None, None))
            .unwrap();
        assert!(matches!(worker.recv().unwrap(), Outbound::Progress(_)));
        worker.send(Inbound::Cancel { id: None }).unwrap();

        match recv_terminal(&worker) {
            Outbound::Error { error, .. } => assert_eq!(error, CANCELLED_MESSAGE),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_validate_with_timeout_completes() {
        let worker = Worker::spawn(ProcessConfig::default(), ProtocolOptions::default()).unwrap();
        let mut events = 0;
        let outcome = worker
            .validate_with_timeout(b"abc".to_vec(), Duration::from_secs(60), |_| events += 1)
            .unwrap();

        let result = outcome.done().unwrap();
        assert_eq!(result.hash_with_block, Sha256::digest(b"abc"));
        assert!(events >= 2);
    }

    #[test]
    fn test_validate_with_timeout_cancels() {
        let worker = Worker::spawn(small_yield_config(), ProtocolOptions::default()).unwrap();
        let outcome = worker
            .validate_with_timeout(vec![0u8; 64 * 1024 * 1024], Duration::ZERO, |_| {})
            .unwrap();
        assert!(outcome.is_cancelled());
    }
}
