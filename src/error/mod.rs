//! Error types for docseal.
//!
//! Cancellation is deliberately absent from [`ValidateError`]: a cancelled
//! pass is reported as [`Outcome::Cancelled`], never as a failure.

use thiserror::Error;

/// Errors that terminate a validation job.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// The input is not something that can be hashed.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of what was invalid.
        message: String,
    },

    /// Invalid configuration parameter.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of what was invalid.
        message: String,
    },

    /// A job was submitted while another one was still running.
    #[error("worker busy: a job is already running")]
    Busy,

    /// A job run by the background worker reported an error.
    #[error("job failed: {message}")]
    Failed {
        /// The error text carried by the worker's `error` message.
        message: String,
    },

    /// The background worker thread is no longer reachable.
    #[error("worker disconnected")]
    WorkerGone,

    /// A wire message could not be encoded or decoded.
    #[cfg(feature = "protocol")]
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred while reading input data.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ValidateError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        ValidateError::InvalidConfig {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        ValidateError::InvalidInput {
            message: message.into(),
        }
    }
}

/// Terminal state of a cancellable operation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation ran to completion.
    Done(T),
    /// The cancellation token was observed set before completion.
    Cancelled,
}

impl<T> Outcome<T> {
    /// Returns true if the operation was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// Returns the completed value, if any.
    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }

    /// Maps the completed value, leaving cancellation untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Done(value) => Outcome::Done(f(value)),
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }
}
