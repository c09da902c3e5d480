//! Downtime records of a check.

use crate::error::DecodeError;
use crate::timestamp::Timestamp;
use crate::validator::Validator;
use serde::Serialize;
use serde_json::Value;

/// One interval during which a check was down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Downtime {
    /// Token of the check this downtime belongs to.
    pub check_token: String,
    pub error: String,
    /// Wire name `started_at`.
    pub started: Timestamp,
    /// Wire name `ended_at`; absent while the downtime is ongoing.
    pub ended: Option<Timestamp>,
    /// Seconds; absent while the downtime is ongoing.
    pub duration: Option<u64>,
}

impl Downtime {
    pub fn decode(check_token: &str, value: &Value) -> Result<Self, DecodeError> {
        let v = Validator::new(value)?;
        Ok(Self {
            check_token: check_token.to_string(),
            error: v.string("error")?,
            started: v.date("started_at")?,
            ended: v.date_opt("ended_at")?,
            duration: v.integer_opt("duration")?,
        })
    }

    pub fn is_ongoing(&self) -> bool {
        self.ended.is_none()
    }
}
