//! Request URL construction.

use crate::helpers::format_time;
use chrono::{DateTime, Utc};

/// Query parameter carrying the API key when keys are sent in the URL.
pub const API_KEY_PARAM: &str = "api-key";

/// A query parameter value. Booleans render as `1`/`0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl QueryValue {
    fn render(&self) -> String {
        match self {
            QueryValue::Bool(true) => "1".to_string(),
            QueryValue::Bool(false) => "0".to_string(),
            QueryValue::Int(n) => n.to_string(),
            QueryValue::Str(s) => urlencoding::encode(s).into_owned(),
        }
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        QueryValue::Bool(v)
    }
}

impl From<u32> for QueryValue {
    fn from(v: u32) -> Self {
        QueryValue::Int(i64::from(v))
    }
}

impl From<i64> for QueryValue {
    fn from(v: i64) -> Self {
        QueryValue::Int(v)
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        QueryValue::Str(v.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        QueryValue::Str(v)
    }
}

impl From<DateTime<Utc>> for QueryValue {
    fn from(v: DateTime<Utc>) -> Self {
        QueryValue::Str(format_time(v))
    }
}

/// Ordered query parameters; `None` values are left out of the URL.
pub type Query = Vec<(&'static str, Option<QueryValue>)>;

/// Build `{base}/{segments...}?{query}`.
///
/// Each path segment is percent-encoded on its own. A non-empty `api_key`
/// is appended as the last parameter.
pub fn format_url(
    base: &str,
    segments: &[&str],
    query: &[(&str, Option<QueryValue>)],
    api_key: Option<&str>,
) -> String {
    let path = segments
        .iter()
        .map(|s| urlencoding::encode(s))
        .collect::<Vec<_>>()
        .join("/");
    let mut url = format!("{}/{}", base.trim_end_matches('/'), path);

    let mut params: Vec<String> = query
        .iter()
        .filter_map(|(k, v)| {
            v.as_ref()
                .map(|v| format!("{}={}", urlencoding::encode(k), v.render()))
        })
        .collect();
    if let Some(key) = api_key.filter(|k| !k.is_empty()) {
        params.push(format!("{}={}", API_KEY_PARAM, urlencoding::encode(key)));
    }
    if !params.is_empty() {
        url.push('?');
        url.push_str(&params.join("&"));
    }
    url
}
