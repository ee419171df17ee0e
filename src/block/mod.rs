//! The embedded validation block.
//!
//! A validation block is a run of `% KEY: VALUE` text lines framed by two
//! fixed ASCII markers and embedded anywhere in a binary document.
//!
//! - [`extract_block`] - Find the first block and produce the buffer without it
//! - [`parse_block`] - Decode the block's lines into [`MetadataFields`]
//!
//! The markers are shared with the tool that embeds blocks into documents
//! and must stay byte-identical.

mod extract;
mod parse;

pub use extract::{ExtractionResult, extract_block, find_marker};
pub use parse::{
    DECODE_ERROR_KEY, DECODE_ERROR_MESSAGE, MetadataFields, parse_block, parse_block_with_limit,
};

/// Start marker of a validation block.
pub const START_MARKER: &[u8] = b"% === VALIDATION BLOCK ===";

/// End marker of a validation block.
pub const END_MARKER: &[u8] = b"% === END VALIDATION BLOCK ===";
