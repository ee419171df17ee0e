//! SHA-256 hashing.
//!
//! - [`Sha256`] - Incremental hasher with `update`/`finalize`/`reset`
//! - [`Digest`] - 32-byte digest, rendered as lowercase hex

mod digest;
mod sha256;

pub use digest::Digest;
pub use sha256::{BLOCK_SIZE, Sha256};
