//! Error handling for portprobe
//!
//! Probe failures (refused connections, timeouts, bind errors) are part of
//! the result contract and never show up here. Only structurally invalid
//! input and configuration problems are reported as errors.

use thiserror::Error;

/// Main error type for probe operations
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Invalid port option at index {index}: {value}")]
    InvalidTarget { index: usize, value: String },

    #[error("Invalid address at index {index} ({address}): {reason}")]
    InvalidAddress {
        index: usize,
        address: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type alias for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

impl ProbeError {
    /// Index of the offending batch entry, if the error points at one
    pub fn entry_index(&self) -> Option<usize> {
        match self {
            ProbeError::InvalidTarget { index, .. } | ProbeError::InvalidAddress { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }

    /// Attach a batch position to a parse failure
    pub(crate) fn at_entry(self, index: usize, address: &str) -> Self {
        let reason = match self {
            ProbeError::ParseError(reason) => reason,
            other => other.to_string(),
        };
        ProbeError::InvalidAddress {
            index,
            address: address.to_string(),
            reason,
        }
    }
}

// Convert parser errors to ProbeError
impl From<url::ParseError> for ProbeError {
    fn from(e: url::ParseError) -> Self {
        ProbeError::ParseError(e.to_string())
    }
}

impl From<std::num::ParseIntError> for ProbeError {
    fn from(e: std::num::ParseIntError) -> Self {
        ProbeError::ParseError(format!("invalid port: {}", e))
    }
}
