//! Typed field access over untyped JSON payloads.
//!
//! Every decoder reads its fields through a [`Validator`]. `null` and an
//! absent key are both treated as missing: the `*_opt` accessors turn that
//! into `None`, the required accessors into [`DecodeError::MissingField`].
//! A present value of the wrong kind is always [`DecodeError::TypeMismatch`].
//! Keys the decoder does not ask for are ignored.

use crate::error::DecodeError;
use crate::timestamp::Timestamp;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Element kinds accepted by [`Validator::array`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Boolean,
    Number,
    String,
}

impl Primitive {
    fn matches(self, v: &Value) -> bool {
        match self {
            Primitive::Boolean => v.is_boolean(),
            Primitive::Number => v.is_number(),
            Primitive::String => v.is_string(),
        }
    }

    fn plural(self) -> &'static str {
        match self {
            Primitive::Boolean => "booleans",
            Primitive::Number => "numbers",
            Primitive::String => "strings",
        }
    }
}

/// Reads named fields off one JSON object.
#[derive(Debug, Clone)]
pub struct Validator<'a> {
    source: &'a Map<String, Value>,
    prefix: String,
}

impl<'a> Validator<'a> {
    /// Validator over a top-level payload, which must be a JSON object.
    pub fn new(value: &'a Value) -> Result<Self, DecodeError> {
        Self::scoped(value, String::new())
    }

    /// Validator whose error field names are prefixed with `prefix.`.
    pub fn scoped(value: &'a Value, prefix: impl Into<String>) -> Result<Self, DecodeError> {
        let prefix = prefix.into();
        match value {
            Value::Object(source) => Ok(Self { source, prefix }),
            _ => Err(DecodeError::TypeMismatch {
                field: if prefix.is_empty() {
                    "(root)".to_string()
                } else {
                    prefix
                },
                expected: "an object".to_string(),
            }),
        }
    }

    fn path(&self, field: &str) -> String {
        if self.prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.prefix, field)
        }
    }

    fn mismatch(&self, field: &str, expected: &str) -> DecodeError {
        DecodeError::TypeMismatch {
            field: self.path(field),
            expected: expected.to_string(),
        }
    }

    fn property(&self, field: &str) -> Option<&'a Value> {
        self.source.get(field).filter(|v| !v.is_null())
    }

    fn require<T>(&self, field: &str, value: Option<T>) -> Result<T, DecodeError> {
        value.ok_or_else(|| DecodeError::MissingField {
            field: self.path(field),
        })
    }

    pub fn boolean_opt(&self, field: &str) -> Result<Option<bool>, DecodeError> {
        self.property(field)
            .map(|v| v.as_bool().ok_or_else(|| self.mismatch(field, "a boolean")))
            .transpose()
    }

    pub fn boolean(&self, field: &str) -> Result<bool, DecodeError> {
        self.require(field, self.boolean_opt(field)?)
    }

    pub fn number_opt(&self, field: &str) -> Result<Option<f64>, DecodeError> {
        self.property(field)
            .map(|v| v.as_f64().ok_or_else(|| self.mismatch(field, "a number")))
            .transpose()
    }

    pub fn number(&self, field: &str) -> Result<f64, DecodeError> {
        self.require(field, self.number_opt(field)?)
    }

    /// A number that must also be a non-negative integer (counts, durations).
    pub fn integer_opt(&self, field: &str) -> Result<Option<u64>, DecodeError> {
        self.property(field)
            .map(|v| {
                v.as_u64()
                    .ok_or_else(|| self.mismatch(field, "a non-negative integer"))
            })
            .transpose()
    }

    pub fn integer(&self, field: &str) -> Result<u64, DecodeError> {
        self.require(field, self.integer_opt(field)?)
    }

    pub fn string_opt(&self, field: &str) -> Result<Option<String>, DecodeError> {
        self.property(field)
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.mismatch(field, "a string"))
            })
            .transpose()
    }

    pub fn string(&self, field: &str) -> Result<String, DecodeError> {
        self.require(field, self.string_opt(field)?)
    }

    /// An array whose elements are all of kind `kind`.
    pub fn array_opt(
        &self,
        field: &str,
        kind: Primitive,
    ) -> Result<Option<&'a Vec<Value>>, DecodeError> {
        let Some(v) = self.property(field) else {
            return Ok(None);
        };
        let expected = format!("an array of {}", kind.plural());
        match v.as_array() {
            Some(items) if items.iter().all(|i| kind.matches(i)) => Ok(Some(items)),
            _ => Err(self.mismatch(field, &expected)),
        }
    }

    pub fn array(&self, field: &str, kind: Primitive) -> Result<&'a Vec<Value>, DecodeError> {
        self.require(field, self.array_opt(field, kind)?)
    }

    pub fn string_array(&self, field: &str) -> Result<Vec<String>, DecodeError> {
        Ok(self
            .array(field, Primitive::String)?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect())
    }

    /// A non-null object. Its shape is not checked; use [`Validator::nested`]
    /// to validate the contents.
    pub fn object_opt(&self, field: &str) -> Result<Option<&'a Map<String, Value>>, DecodeError> {
        self.property(field)
            .map(|v| v.as_object().ok_or_else(|| self.mismatch(field, "an object")))
            .transpose()
    }

    pub fn object(&self, field: &str) -> Result<&'a Map<String, Value>, DecodeError> {
        self.require(field, self.object_opt(field)?)
    }

    /// Validator scoped to the nested object at `field`.
    pub fn nested_opt(&self, field: &str) -> Result<Option<Validator<'a>>, DecodeError> {
        Ok(self.object_opt(field)?.map(|source| Validator {
            source,
            prefix: self.path(field),
        }))
    }

    pub fn nested(&self, field: &str) -> Result<Validator<'a>, DecodeError> {
        self.require(field, self.nested_opt(field)?)
    }

    /// An object whose values are all strings.
    pub fn string_map(&self, field: &str) -> Result<BTreeMap<String, String>, DecodeError> {
        self.object(field)?
            .iter()
            .map(|(k, v)| match v.as_str() {
                Some(s) => Ok((k.clone(), s.to_string())),
                None => Err(self.mismatch(field, "an object of strings")),
            })
            .collect()
    }

    /// A date given as a date string or an epoch-millisecond number.
    ///
    /// Strings that cannot be parsed produce [`Timestamp::Invalid`] rather
    /// than an error.
    pub fn date_opt(&self, field: &str) -> Result<Option<Timestamp>, DecodeError> {
        self.property(field)
            .map(|v| match v {
                Value::String(s) => Ok(Timestamp::parse(s)),
                Value::Number(n) => n
                    .as_f64()
                    .map(Timestamp::from_millis)
                    .ok_or_else(|| self.mismatch(field, "a date, date string or timestamp")),
                _ => Err(self.mismatch(field, "a date, date string or timestamp")),
            })
            .transpose()
    }

    pub fn date(&self, field: &str) -> Result<Timestamp, DecodeError> {
        self.require(field, self.date_opt(field)?)
    }
}
