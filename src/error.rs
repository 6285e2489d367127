//! Structured error types for layer and merge operations.

use serde::Serialize;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A layer was constructed without a data tree.
    MissingData,
    /// A merge (or root write) target is absent or not composite.
    InvalidTarget,
    /// A merge source cannot be applied to the target.
    InvalidArgument,
}

/// Structured error for layer and merge operations.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct LayerError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl LayerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn missing_data() -> Self {
        Self::new(ErrorCode::MissingData, "missing data")
    }

    pub fn data_not_composite(kind: &str) -> Self {
        Self::new(
            ErrorCode::MissingData,
            format!("data must be a mapping or sequence, got {}", kind),
        )
    }

    pub fn missing_target() -> Self {
        Self::new(ErrorCode::InvalidTarget, "missing target")
    }

    pub fn invalid_target(kind: &str) -> Self {
        Self::new(
            ErrorCode::InvalidTarget,
            format!("invalid target: expected a mapping or sequence, got {}", kind),
        )
    }

    pub fn invalid_argument(position: usize, kind: &str) -> Self {
        Self::new(
            ErrorCode::InvalidArgument,
            format!(
                "invalid argument {}: expected a mapping or sequence, got {}",
                position, kind
            ),
        )
    }

    pub fn non_index_key(position: usize, key: &str) -> Self {
        Self::new(
            ErrorCode::InvalidArgument,
            format!(
                "invalid argument {}: key '{}' cannot be merged into a sequence",
                position, key
            ),
        )
        .with_field(key)
    }
}

/// Result type for layer and merge operations.
pub type LayerResult<T> = std::result::Result<T, LayerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_serializes_code() {
        let err = LayerError::missing_data();
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"code": "MISSING_DATA", "message": "missing data"})
        );
    }

    #[test]
    fn test_field_is_serialized_when_present() {
        let err = LayerError::non_index_key(1, "x");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "INVALID_ARGUMENT");
        assert_eq!(json["field"], "x");
    }

    #[test]
    fn test_display_uses_message() {
        let err = LayerError::invalid_target("number");
        assert_eq!(
            err.to_string(),
            "invalid target: expected a mapping or sequence, got number"
        );
    }
}
