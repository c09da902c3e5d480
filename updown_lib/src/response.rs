//! Classification of raw API responses.

use crate::error::{ApiError, DecodeError, Error};
use crate::validator::Validator;
use serde_json::Value;

/// Turn a status and body into the parsed JSON body or an [`ApiError`].
///
/// Statuses below 300 succeed and the body must be JSON. Anything else fails
/// with the body's `error` string as message, or the bare status code when
/// there is none. A 401 means the API key is missing or invalid; see
/// [`ApiError::is_unauthorized`].
pub fn handle_response(status: u16, body: &str) -> Result<Value, Error> {
    if status < 300 {
        return Ok(serde_json::from_str(body)?);
    }
    let data: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let message = data
        .get("error")
        .and_then(|e| e.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string());
    Err(Error::Api(ApiError::new(message, Some(status), Some(data))))
}

/// Body of a successful `DELETE`: `{"deleted": true}`.
pub fn decode_deleted(value: &Value) -> Result<bool, DecodeError> {
    Validator::new(value)?.boolean("deleted")
}

/// A top-level array whose items are decoded one by one.
pub(crate) fn decode_list<T>(
    value: &Value,
    decode: impl Fn(&Value) -> Result<T, DecodeError>,
) -> Result<Vec<T>, DecodeError> {
    value
        .as_array()
        .ok_or_else(|| DecodeError::TypeMismatch {
            field: "(root)".to_string(),
            expected: "an array".to_string(),
        })?
        .iter()
        .map(decode)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_returns_body_unchanged() {
        let body = handle_response(200, r#"{"token":"abc"}"#).unwrap();
        assert_eq!(body, json!({ "token": "abc" }));
        assert_eq!(handle_response(201, "[]").unwrap(), json!([]));
    }

    #[test]
    fn error_field_becomes_message() {
        let err = handle_response(404, r#"{"error":"not found"}"#).unwrap_err();
        match err {
            Error::Api(e) => {
                assert_eq!(e.message, "not found");
                assert_eq!(e.status_code, Some(404));
            }
            other => panic!("expected Error::Api, got {other:?}"),
        }
    }

    #[test]
    fn status_code_is_the_fallback_message() {
        for body in ["<html>Bad gateway</html>", "{}", r#"{"error": 42}"#] {
            match handle_response(502, body).unwrap_err() {
                Error::Api(e) => assert_eq!(e.message, "502"),
                other => panic!("expected Error::Api, got {other:?}"),
            }
        }
    }

    #[test]
    fn unauthorized_is_an_api_error() {
        match handle_response(401, r#"{"error":"Invalid API key"}"#).unwrap_err() {
            Error::Api(e) => {
                assert!(e.is_unauthorized());
                assert_eq!(e.message, "Invalid API key");
            }
            other => panic!("expected Error::Api, got {other:?}"),
        }
    }

    #[test]
    fn success_with_non_json_body_is_a_json_error() {
        assert!(matches!(handle_response(200, "OK"), Err(Error::Json(_))));
    }

    #[test]
    fn deleted_flag() {
        assert!(decode_deleted(&json!({ "deleted": true })).unwrap());
        assert!(decode_deleted(&json!({})).is_err());
    }

    #[test]
    fn lists_require_an_array() {
        let ok = decode_list(&json!(["a", "b"]), |v| {
            v.as_str().map(str::to_string).ok_or(DecodeError::MissingField {
                field: "x".to_string(),
            })
        })
        .unwrap();
        assert_eq!(ok, vec!["a", "b"]);
        assert!(decode_list(&json!({}), |_| Ok(())).is_err());
    }
}
