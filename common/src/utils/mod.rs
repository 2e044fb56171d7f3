//! Utility functions and helpers.

pub mod redact;
pub mod token;

// Re-export commonly used types
pub use redact::{redact_connection_string, scrub};
pub use token::{issue_token, validate_token, Claims};
