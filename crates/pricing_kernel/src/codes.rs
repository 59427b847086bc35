//! Structured return codes
//!
//! Pricer calls always return a response object. Expected failure modes
//! (missing provider data, no reference data for the date) are carried on
//! the output as a `ReturnCode` rather than surfaced as errors, so callers
//! can route claims without unwinding.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A coded pricing outcome with a human-readable explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnCode {
    /// Short code, e.g. "ASC02"
    pub code: String,
    /// One-line description
    pub description: String,
    /// Longer explanation suitable for claim remarks
    pub explanation: String,
}

impl ReturnCode {
    /// Creates a new return code
    pub fn new(
        code: impl Into<String>,
        description: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            explanation: explanation.into(),
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}
