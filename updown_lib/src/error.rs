//! Error types for the updown.io API client.

use thiserror::Error;

/// Base error type for updown.io operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid response data: {0}")]
    Decode(#[from] DecodeError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    ReadOnly(#[from] ReadOnlyModeError),

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Raised when a payload returned by the API does not have the expected shape.
///
/// Field names are the wire names; nested fields are joined with a dot
/// (e.g. `requests.by_response_time.under125`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Property {field} does not exist on object")]
    MissingField { field: String },

    #[error("Property {field} of object is not {expected}")]
    TypeMismatch { field: String, expected: String },
}

impl DecodeError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            DecodeError::MissingField { field } | DecodeError::TypeMismatch { field, .. } => field,
        }
    }
}

/// Raised when the API returns an error response.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status_code: Option<u16>,
    pub response_data: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(
        message: impl Into<String>,
        status_code: Option<u16>,
        response_data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            message: message.into(),
            status_code,
            response_data,
        }
    }

    /// True when the API rejected the key (missing, wrong, or revoked).
    pub fn is_unauthorized(&self) -> bool {
        self.status_code == Some(401)
    }
}

/// Raised when a mutating call is made on a client configured as read-only.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Client is in read-only mode; {operation} is not allowed")]
pub struct ReadOnlyModeError {
    pub operation: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_messages_name_the_field() {
        let missing = DecodeError::MissingField {
            field: "token".to_string(),
        };
        assert_eq!(missing.to_string(), "Property token does not exist on object");
        assert_eq!(missing.field(), "token");

        let mismatch = DecodeError::TypeMismatch {
            field: "period".to_string(),
            expected: "a number".to_string(),
        };
        assert_eq!(mismatch.to_string(), "Property period of object is not a number");
        assert_eq!(mismatch.field(), "period");
    }

    #[test]
    fn api_error_detects_unauthorized() {
        assert!(ApiError::new("401", Some(401), None).is_unauthorized());
        assert!(!ApiError::new("not found", Some(404), None).is_unauthorized());
        assert!(!ApiError::new("boom", None, None).is_unauthorized());
    }

    #[test]
    fn errors_convert_into_base_error() {
        let err: Error = ReadOnlyModeError {
            operation: "delete_check",
        }
        .into();
        assert!(matches!(err, Error::ReadOnly(_)));
        assert!(err.to_string().contains("delete_check"));
    }
}
