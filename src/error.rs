//! All kinds of errors in this crate.

use ca_rules::ParseRuleError;
use thiserror::Error;

/// All kinds of errors in this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid rule: {0:?}")]
    InvalidRule(#[from] ParseRuleError),
    #[error("Malformed RLE pattern: {0}")]
    InvalidRle(String),
    #[error("I/O error while reading a pattern: {0}")]
    Io(#[from] std::io::Error),
}
