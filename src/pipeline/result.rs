//! The aggregate produced by a validation job.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::block::MetadataFields;
use crate::hash::Digest;

/// Both digests of a document plus what its validation block said.
///
/// Built once per job and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "protocol",
    derive(serde::Serialize),
    serde(rename_all = "camelCase")
)]
pub struct ValidationResult {
    /// Digest of the document exactly as supplied.
    pub hash_with_block: Digest,

    /// Digest of the document with the validation block removed.
    pub hash_without_block: Option<Digest>,

    /// Fields parsed from the validation block.
    pub metadata_fields: Option<MetadataFields>,

    /// Whether a complete validation block was found.
    pub block_found: bool,

    /// Size of the document as supplied.
    pub original_size: u64,

    /// Size of the document without the block (equal to `original_size`
    /// when no block was found).
    pub cleaned_size: u64,

    /// Offset of the block's start marker in the original document.
    pub block_start: Option<u64>,

    /// Offset one past the block's end marker in the original document.
    pub block_end: Option<u64>,

    /// Completion time in milliseconds since the Unix epoch.
    pub processed_at_ms: u64,
}

impl ValidationResult {
    /// The content digest a registry is queried with.
    ///
    /// This is the digest without the block when one was found, otherwise
    /// the digest of the document as supplied.
    pub fn canonical_hash(&self) -> Digest {
        self.hash_without_block.unwrap_or(self.hash_with_block)
    }

    /// Bytes taken up by the validation block (0 when none was found).
    pub fn block_len(&self) -> u64 {
        self.original_size - self.cleaned_size
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
