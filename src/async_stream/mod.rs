//! Async streaming support for hashing passes.
//!
//! This module drives a hashing pass from `Stream::poll_next`, making it
//! runtime-agnostic and compatible with tokio, async-std, smol, and other
//! async runtimes.
//!
//! - [`hash_async`] - Creates a [`HashStream`] of [`HashEvent`]s over a buffer
//!
//! This module requires the `async-io` feature to be enabled.

mod stream;

pub use stream::{HashEvent, HashStream, hash_async};
