//! Message protocol and background worker.
//!
//! - [`Inbound`] / [`Outbound`] - The messages, with their JSON form
//! - [`Worker`] - A [`Validator`](crate::Validator) on its own thread
//!
//! This module requires the `protocol` feature to be enabled.

mod messages;
mod worker;

pub use messages::{CANCELLED_MESSAGE, Inbound, JobId, Outbound, ProtocolOptions, WORKER_NAME};
pub use worker::Worker;
