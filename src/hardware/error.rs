//! Position source error types and handling

use std::fmt;

/// Errors raised by position-fix sources
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Connection to the localization source failed or was lost
    ConnectionLost { source_id: u8 },
    /// Source delivered a fix that cannot be used
    InvalidFix { details: String },
    /// Source-specific failure
    HardwareError { code: u32, description: String },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::ConnectionLost { source_id } => {
                write!(f, "Connection lost to position source {}", source_id)
            }
            SourceError::InvalidFix { details } => {
                write!(f, "Invalid position fix: {}", details)
            }
            SourceError::HardwareError { code, description } => {
                write!(f, "Hardware error {}: {}", code, description)
            }
        }
    }
}

impl std::error::Error for SourceError {}

/// Result type for position source operations
pub type SourceResult<T> = Result<T, SourceError>;

impl SourceError {
    /// Whether the tracker may keep predicting and poll again next tick
    pub fn is_recoverable(&self) -> bool {
        match self {
            SourceError::ConnectionLost { .. } => true,
            SourceError::InvalidFix { .. } => true,
            SourceError::HardwareError { .. } => false,
        }
    }
}
