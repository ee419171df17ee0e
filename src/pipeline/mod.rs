//! Dual-hash validation jobs.
//!
//! - [`Validator`] - Hash, extract, hash again, parse
//! - [`ValidationResult`] - What a finished job hands to the caller
//! - [`Stage`] - Where a job is

mod result;
mod validator;

pub use result::ValidationResult;
pub use validator::{STAGE_CLEANED, STAGE_FINISHED, STAGE_ORIGINAL, Stage, Validator};
