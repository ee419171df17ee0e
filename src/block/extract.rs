//! Locating and removing the validation block.

use std::ops::Range;

use bytes::Bytes;
use tracing::{debug, warn};

use super::{END_MARKER, START_MARKER};
use crate::util::{find_subslice, splice_out};

/// Outcome of scanning a buffer for a validation block.
///
/// When `found` is false, `cleaned` is the input itself (a cheap `Bytes`
/// clone) and `block`/`block_range` are `None`. When it is true,
/// `cleaned` is the input with `block_range` removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Whether a complete marker pair was found.
    pub found: bool,

    /// The block bytes, both markers included.
    pub block: Option<Bytes>,

    /// The input with the block removed.
    pub cleaned: Bytes,

    /// Offsets of the block in the original input (end exclusive).
    pub block_range: Option<Range<usize>>,
}

impl ExtractionResult {
    fn not_found(input: &Bytes) -> Self {
        Self {
            found: false,
            block: None,
            cleaned: input.clone(),
            block_range: None,
        }
    }

    /// Offset of the start marker, if a block was found.
    pub fn block_start(&self) -> Option<usize> {
        self.block_range.as_ref().map(|r| r.start)
    }

    /// Offset one past the end marker, if a block was found.
    pub fn block_end(&self) -> Option<usize> {
        self.block_range.as_ref().map(|r| r.end)
    }
}

/// Byte-exact search for `needle` in `haystack`, starting at `from`.
///
/// Returns the offset of the first match. An empty needle matches at `from`,
/// even when `from` is past the end of `haystack`.
///
/// # Example
///
/// ```
/// use docseal::find_marker;
///
/// assert_eq!(find_marker(b"xx%yy%", b"%", 3), Some(5));
/// assert_eq!(find_marker(b"xx%yy%", b"%%", 0), None);
/// assert_eq!(find_marker(b"xx", b"", 5), Some(5));
/// ```
pub fn find_marker(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    find_subslice(haystack, needle, from)
}

/// Finds the first validation block in `input` and splits it out.
///
/// A start marker with no end marker after it is treated as no block at
/// all: the input is returned unchanged so that a truncated block is never
/// half-stripped. Only the first marker pair is considered.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use docseal::extract_block;
///
/// let input = Bytes::from_static(
///     b"DATA1% === VALIDATION BLOCK ===\n% ENTITY: Acme\n% === END VALIDATION BLOCK ===DATA2",
/// );
/// let result = extract_block(&input);
///
/// assert!(result.found);
/// assert_eq!(&result.cleaned[..], b"DATA1DATA2");
/// ```
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn extract_block(input: &Bytes) -> ExtractionResult {
    let Some(start) = find_subslice(input, START_MARKER, 0) else {
        debug!("no validation block");
        return ExtractionResult::not_found(input);
    };

    let Some(end_marker) = find_subslice(input, END_MARKER, start + START_MARKER.len()) else {
        warn!(start, "validation block start marker without end marker; leaving input intact");
        return ExtractionResult::not_found(input);
    };

    let end = end_marker + END_MARKER.len();
    debug!(start, end, "validation block found");

    ExtractionResult {
        found: true,
        block: Some(input.slice(start..end)),
        cleaned: splice_out(input, start..end),
        block_range: Some(start..end),
    }
}
