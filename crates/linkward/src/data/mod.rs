//! Immutable values passed between the stages of a validation run.

pub mod link;
pub mod result;
pub mod source;

pub use link::Link;
pub use result::{POLICY_FAILURE, RATE_LIMITED, ValidationResult};
pub use source::SourceLocation;
