//! Messages exchanged with the background worker.
//!
//! The JSON form uses a `type` tag and camelCase field names. Byte
//! payloads travel as arrays of numbers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::ProgressEvent;
use crate::error::ValidateError;
use crate::pipeline::ValidationResult;

/// Opaque caller-chosen job identifier, echoed back on terminal messages.
pub type JobId = Value;

/// Error text used for cancellation when it is reported as an error.
pub const CANCELLED_MESSAGE: &str = "processing cancelled";

/// Name reported in `pong` replies.
pub const WORKER_NAME: &str = "docseal";

/// Messages from the caller to the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inbound {
    /// Start a job.
    #[serde(alias = "processPDF")]
    Process {
        /// The document bytes.
        #[serde(rename = "fileBuffer", default)]
        file_buffer: Option<Vec<u8>>,
        /// Requested chunk size, overriding the worker's default.
        #[serde(rename = "chunkSize", default, skip_serializing_if = "Option::is_none")]
        chunk_size: Option<usize>,
        /// Correlation id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<JobId>,
    },

    /// Cancel the running job.
    #[serde(alias = "abort")]
    Cancel {
        /// Correlation id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<JobId>,
    },

    /// Liveness check.
    Ping,

    /// Any other `type`; logged and ignored.
    #[serde(other, skip_serializing)]
    Unknown,
}

impl Inbound {
    /// Builds a `process` message.
    pub fn process(
        file: impl Into<Vec<u8>>,
        chunk_size: Option<usize>,
        id: Option<JobId>,
    ) -> Self {
        Inbound::Process {
            file_buffer: Some(file.into()),
            chunk_size,
            id,
        }
    }

    /// Decodes a message from JSON.
    pub fn from_json(json: &str) -> Result<Self, ValidateError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encodes the message as JSON.
    pub fn to_json(&self) -> Result<String, ValidateError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Messages from the worker to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outbound {
    /// Rate-limited progress of the running pass.
    Progress(ProgressEvent),

    /// Terminal: the job completed.
    Result {
        /// Always true.
        success: bool,
        /// The job's result.
        result: ValidationResult,
        /// Correlation id of the job.
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<JobId>,
    },

    /// Terminal: the job failed.
    Error {
        /// Always false.
        success: bool,
        /// Error text.
        error: String,
        /// Correlation id of the job.
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<JobId>,
    },

    /// Terminal: the job was cancelled.
    Cancelled {
        /// Correlation id of the job.
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<JobId>,
    },

    /// Acknowledges a `cancel` request.
    Aborted {
        /// Always true.
        success: bool,
        /// Correlation id of the cancel request.
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<JobId>,
    },

    /// Reply to `ping`.
    Pong {
        /// Worker name.
        worker: String,
        /// Whether the worker accepts jobs.
        ready: bool,
    },
}

impl Outbound {
    pub(crate) fn result(result: ValidationResult, id: Option<JobId>) -> Self {
        Outbound::Result {
            success: true,
            result,
            id,
        }
    }

    pub(crate) fn error(error: impl Into<String>, id: Option<JobId>) -> Self {
        Outbound::Error {
            success: false,
            error: error.into(),
            id,
        }
    }

    pub(crate) fn aborted(id: Option<JobId>) -> Self {
        Outbound::Aborted { success: true, id }
    }

    pub(crate) fn pong() -> Self {
        Outbound::Pong {
            worker: WORKER_NAME.to_string(),
            ready: true,
        }
    }

    /// Returns true for `result`, `error` and `cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Outbound::Result { .. } | Outbound::Error { .. } | Outbound::Cancelled { .. }
        )
    }

    /// Correlation id carried by the message, if any.
    pub fn id(&self) -> Option<&JobId> {
        match self {
            Outbound::Result { id, .. }
            | Outbound::Error { id, .. }
            | Outbound::Cancelled { id }
            | Outbound::Aborted { id, .. } => id.as_ref(),
            Outbound::Progress(_) | Outbound::Pong { .. } => None,
        }
    }

    /// Encodes the message as JSON.
    pub fn to_json(&self) -> Result<String, ValidateError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Wire-level behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolOptions {
    /// Report cancellation as an `error` message carrying
    /// [`CANCELLED_MESSAGE`] instead of a `cancelled` message, for callers
    /// written against the older contract.
    pub legacy_cancel_as_error: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn to_value(message: &Outbound) -> Value {
        serde_json::from_str(&message.to_json().unwrap()).unwrap()
    }

    #[test]
    fn test_decode_process() {
        let json = r#"{"type":"process","fileBuffer":[1,2,3],"chunkSize":128,"id":7}"#;
        let msg = Inbound::from_json(json).unwrap();
        assert_eq!(
            msg,
            Inbound::process(vec![1, 2, 3], Some(128), Some(json!(7)))
        );
    }

    #[test]
    fn test_decode_process_minimal_and_alias() {
        let msg = Inbound::from_json(r#"{"type":"processPDF","fileBuffer":[]}"#).unwrap();
        assert_eq!(msg, Inbound::process(Vec::new(), None, None));

        let missing = Inbound::from_json(r#"{"type":"process"}"#).unwrap();
        assert!(matches!(
            missing,
            Inbound::Process {
                file_buffer: None,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_cancel_ping_unknown() {
        assert_eq!(
            Inbound::from_json(r#"{"type":"abort","id":"a"}"#).unwrap(),
            Inbound::Cancel {
                id: Some(json!("a"))
            }
        );
        assert_eq!(
            Inbound::from_json(r#"{"type":"cancel"}"#).unwrap(),
            Inbound::Cancel { id: None }
        );
        assert_eq!(
            Inbound::from_json(r#"{"type":"ping"}"#).unwrap(),
            Inbound::Ping
        );
        assert_eq!(
            Inbound::from_json(r#"{"type":"reboot"}"#).unwrap(),
            Inbound::Unknown
        );
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            Inbound::from_json("not json"),
            Err(ValidateError::Json(_))
        ));
    }

    #[test]
    fn test_encode_progress() {
        let msg = Outbound::Progress(ProgressEvent::new("hashing original", 5, 10));
        assert_eq!(
            to_value(&msg),
            json!({
                "type": "progress",
                "progress": 50,
                "stage": "hashing original",
                "processed": 5,
                "total": 10
            })
        );
    }

    #[test]
    fn test_encode_terminal_messages() {
        assert_eq!(
            to_value(&Outbound::error("boom", Some(json!(1)))),
            json!({"type": "error", "success": false, "error": "boom", "id": 1})
        );
        assert_eq!(
            to_value(&Outbound::aborted(None)),
            json!({"type": "aborted", "success": true})
        );
        assert_eq!(
            to_value(&Outbound::pong()),
            json!({"type": "pong", "worker": "docseal", "ready": true})
        );

        assert!(Outbound::Cancelled { id: None }.is_terminal());
        assert!(!Outbound::pong().is_terminal());
    }
}
