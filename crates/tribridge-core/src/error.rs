//! Bridge errors

use crate::ffi::LoadError;
use crate::io::RecordState;
use thiserror::Error;

/// Errors raised by the bridge
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TriangleError {
    /// Caller-supplied geometry or switches are malformed
    ///
    /// Raised before any native call; the target record is left unchanged.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The native routine returned a non-zero status
    #[error("triangulate() returned {code}")]
    NativeStatus { code: i32 },

    /// An operation was attempted in a state that does not allow it
    #[error("cannot {operation} a record that is {state}")]
    Lifecycle {
        operation: &'static str,
        state: RecordState,
    },

    /// The native routine left an output field with inconsistent counts
    #[error("output field {field} is inconsistent: {reason}")]
    CorruptRecord { field: &'static str, reason: String },

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl TriangleError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        TriangleError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending field for validation and record errors
    pub fn field(&self) -> Option<&'static str> {
        match self {
            TriangleError::Validation { field, .. } | TriangleError::CorruptRecord { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, TriangleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TriangleError::validation("segments", "expected 2 columns, got 3").to_string(),
            "invalid segments: expected 2 columns, got 3"
        );
        assert_eq!(
            TriangleError::NativeStatus { code: 1 }.to_string(),
            "triangulate() returned 1"
        );
        assert_eq!(
            TriangleError::Lifecycle {
                operation: "harvest",
                state: RecordState::Populated,
            }
            .to_string(),
            "cannot harvest a record that is populated"
        );
    }

    #[test]
    fn test_field_accessor() {
        assert_eq!(
            TriangleError::validation("holes", "ragged").field(),
            Some("holes")
        );
        assert_eq!(TriangleError::NativeStatus { code: 3 }.field(), None);
    }
}
