//! Checks: monitored URLs, their configuration and last known status.
//!
//! Field names follow Rust conventions; where they differ from the API the
//! wire name is noted on the field.

use crate::error::DecodeError;
use crate::metrics::Metrics;
use crate::timestamp::Timestamp;
use crate::validator::Validator;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Monitoring locations operated by updown.io.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Lan,
    Mia,
    Bhs,
    Rbx,
    Fra,
    Sin,
    Tok,
    Syd,
}

impl Location {
    pub const ALL: [Location; 8] = [
        Location::Lan,
        Location::Mia,
        Location::Bhs,
        Location::Rbx,
        Location::Fra,
        Location::Sin,
        Location::Tok,
        Location::Syd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Location::Lan => "lan",
            Location::Mia => "mia",
            Location::Bhs => "bhs",
            Location::Rbx => "rbx",
            Location::Fra => "fra",
            Location::Sin => "sin",
            Location::Tok => "tok",
            Location::Syd => "syd",
        }
    }
}

impl std::str::FromStr for Location {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown location: {}", s))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interval between two checks, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckInterval {
    Secs15,
    Secs30,
    Min1,
    Min2,
    Min5,
    Min10,
    Min30,
    Hour1,
}

impl CheckInterval {
    pub const ALL: [CheckInterval; 8] = [
        CheckInterval::Secs15,
        CheckInterval::Secs30,
        CheckInterval::Min1,
        CheckInterval::Min2,
        CheckInterval::Min5,
        CheckInterval::Min10,
        CheckInterval::Min30,
        CheckInterval::Hour1,
    ];

    pub fn secs(self) -> u32 {
        match self {
            CheckInterval::Secs15 => 15,
            CheckInterval::Secs30 => 30,
            CheckInterval::Min1 => 60,
            CheckInterval::Min2 => 120,
            CheckInterval::Min5 => 300,
            CheckInterval::Min10 => 600,
            CheckInterval::Min30 => 1800,
            CheckInterval::Hour1 => 3600,
        }
    }

    pub fn from_secs(secs: u64) -> Option<Self> {
        CheckInterval::ALL
            .into_iter()
            .find(|i| u64::from(i.secs()) == secs)
    }
}

impl std::str::FromStr for CheckInterval {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .ok()
            .and_then(CheckInterval::from_secs)
            .ok_or_else(|| {
                format!(
                    "invalid interval {}; must be one of 15, 30, 60, 120, 300, 600, 1800, 3600",
                    s
                )
            })
    }
}

impl Serialize for CheckInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.secs())
    }
}

/// Apdex threshold in seconds, as accepted when creating or updating a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApdexTarget {
    Ms125,
    Ms250,
    Ms500,
    Sec1,
    Sec2,
}

impl ApdexTarget {
    pub fn secs(self) -> f64 {
        match self {
            ApdexTarget::Ms125 => 0.125,
            ApdexTarget::Ms250 => 0.25,
            ApdexTarget::Ms500 => 0.5,
            ApdexTarget::Sec1 => 1.0,
            ApdexTarget::Sec2 => 2.0,
        }
    }
}

impl std::str::FromStr for ApdexTarget {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let secs: f64 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid apdex target: {}", s))?;
        [
            ApdexTarget::Ms125,
            ApdexTarget::Ms250,
            ApdexTarget::Ms500,
            ApdexTarget::Sec1,
            ApdexTarget::Sec2,
        ]
        .into_iter()
        .find(|t| t.secs() == secs)
        .ok_or_else(|| format!("invalid apdex target {}; must be one of 0.125, 0.25, 0.5, 1, 2", s))
    }
}

impl Serialize for ApdexTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.secs())
    }
}

/// HTTP verb the monitoring nodes use for a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HttpVerb {
    #[serde(rename = "GET/HEAD")]
    GetHead,
    #[serde(rename = "POST")]
    Post,
    #[serde(rename = "PUT")]
    Put,
    #[serde(rename = "PATCH")]
    Patch,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(rename = "OPTIONS")]
    Options,
}

impl std::str::FromStr for HttpVerb {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET/HEAD" | "GET" | "HEAD" => Ok(HttpVerb::GetHead),
            "POST" => Ok(HttpVerb::Post),
            "PUT" => Ok(HttpVerb::Put),
            "PATCH" => Ok(HttpVerb::Patch),
            "DELETE" => Ok(HttpVerb::Delete),
            "OPTIONS" => Ok(HttpVerb::Options),
            _ => Err(format!("unknown HTTP verb: {}", s)),
        }
    }
}

/// How long notifications for a check are muted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuteUntil {
    Time(DateTime<Utc>),
    /// Until the check is up again.
    Recovery,
    Forever,
}

impl Serialize for MuteUntil {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MuteUntil::Time(t) => {
                serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            MuteUntil::Recovery => serializer.serialize_str("recovery"),
            MuteUntil::Forever => serializer.serialize_str("forever"),
        }
    }
}

impl std::str::FromStr for MuteUntil {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recovery" => Ok(MuteUntil::Recovery),
            "forever" => Ok(MuteUntil::Forever),
            _ => crate::helpers::parse_time(s).map(MuteUntil::Time),
        }
    }
}

/// SSL status of a check, present when a certificate was found at the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckSslStatus {
    /// Wire name `tested_at`.
    pub tested: Timestamp,
    pub valid: bool,
    pub error: Option<String>,
}

/// An updown.io check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check {
    pub token: String,
    pub url: String,
    pub alias: Option<String>,
    pub enabled: bool,
    /// Status page is publicly available.
    pub published: bool,
    /// Wire name `period`.
    pub interval: CheckInterval,
    /// Text that must appear on the page for the check to pass.
    pub string_match: Option<String>,
    /// Wire name `http_verb`.
    pub http_method: String,
    pub http_body: Option<String>,
    pub custom_headers: BTreeMap<String, String>,
    pub disabled_locations: BTreeSet<Location>,
    /// Wire name `favicon_url`.
    pub favicon: Option<String>,
    pub last_status: Option<u16>,
    /// Percentage between 0 and 100.
    pub uptime: f64,
    /// Wire name `apdex_t`, in seconds.
    pub apdex_target: f64,
    /// Wire name `last_check_at`.
    pub last_check: Option<Timestamp>,
    /// Wire name `next_check_at`.
    pub next_check: Option<Timestamp>,
    pub mute_until: Option<Timestamp>,
    /// When true, `down_since` and `error` are normally set.
    pub down: bool,
    pub down_since: Option<Timestamp>,
    pub error: Option<String>,
    pub ssl: Option<CheckSslStatus>,
    /// Last hour of metrics, only when requested from [`crate::Client::get_check`].
    pub metrics: Option<Metrics>,
}

impl Check {
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        let v = Validator::new(value)?;

        let token = v.string("token")?;
        let url = v.string("url")?;
        let alias = v.string_opt("alias")?;
        let enabled = v.boolean("enabled")?;
        let published = v.boolean("published")?;

        let period = v.integer("period")?;
        let interval = CheckInterval::from_secs(period).ok_or_else(|| DecodeError::TypeMismatch {
            field: "period".to_string(),
            expected: "one of 15, 30, 60, 120, 300, 600, 1800, 3600".to_string(),
        })?;
        let string_match = v.string_opt("string_match")?;

        let http_method = v.string("http_verb")?;
        let http_body = v.string_opt("http_body")?;
        let custom_headers = v.string_map("custom_headers")?;

        let disabled_locations = v
            .string_array("disabled_locations")?
            .iter()
            .map(|code| code.parse::<Location>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|_| DecodeError::TypeMismatch {
                field: "disabled_locations".to_string(),
                expected: "an array of location codes".to_string(),
            })?;

        let favicon = v.string_opt("favicon_url")?;

        let last_status = v
            .integer_opt("last_status")?
            .map(|s| {
                u16::try_from(s).map_err(|_| DecodeError::TypeMismatch {
                    field: "last_status".to_string(),
                    expected: "an HTTP status code".to_string(),
                })
            })
            .transpose()?;
        let uptime = v.number("uptime")?;
        let apdex_target = v.number("apdex_t")?;

        let last_check = v.date_opt("last_check_at")?;
        let next_check = v.date_opt("next_check_at")?;
        let mute_until = v.date_opt("mute_until")?;

        let down = v.boolean("down")?;
        let down_since = v.date_opt("down_since")?;
        let error = v.string_opt("error")?;

        let ssl = v.nested_opt("ssl")?.map(|s| decode_ssl(&s)).transpose()?;

        // A check without metrics yet reports `"metrics": {}`.
        let metrics = match v.object_opt("metrics")? {
            Some(m) if m.is_empty() => None,
            Some(_) => Some(Metrics::from_validator(&v.nested("metrics")?)?),
            None => None,
        };

        Ok(Self {
            token,
            url,
            alias,
            enabled,
            published,
            interval,
            string_match,
            http_method,
            http_body,
            custom_headers,
            disabled_locations,
            favicon,
            last_status,
            uptime,
            apdex_target,
            last_check,
            next_check,
            mute_until,
            down,
            down_since,
            error,
            ssl,
            metrics,
        })
    }

    /// Display name: the alias when set, otherwise the URL.
    pub fn name(&self) -> &str {
        self.alias
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or(&self.url)
    }
}

fn decode_ssl(v: &Validator<'_>) -> Result<CheckSslStatus, DecodeError> {
    Ok(CheckSslStatus {
        tested: v.date("tested_at")?,
        valid: v.boolean("valid")?,
        error: v.string_opt("error")?,
    })
}

/// A check given either by token or as a previously fetched [`Check`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckRef<'a> {
    Token(&'a str),
    Check(&'a Check),
}

impl<'a> CheckRef<'a> {
    pub fn token(&self) -> &'a str {
        match self {
            CheckRef::Token(t) => t,
            CheckRef::Check(c) => &c.token,
        }
    }
}

impl<'a> From<&'a str> for CheckRef<'a> {
    fn from(token: &'a str) -> Self {
        CheckRef::Token(token)
    }
}

impl<'a> From<&'a String> for CheckRef<'a> {
    fn from(token: &'a String) -> Self {
        CheckRef::Token(token)
    }
}

impl<'a> From<&'a Check> for CheckRef<'a> {
    fn from(check: &'a Check) -> Self {
        CheckRef::Check(check)
    }
}

/// Settings shared by check creation and update. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<CheckInterval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apdex_t: Option<ApdexTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_match: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute_until: Option<MuteUntil>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_verb: Option<HttpVerb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_locations: Option<Vec<Location>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_headers: Option<BTreeMap<String, String>>,
}

/// Body of `POST /checks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOptions {
    pub url: String,
    #[serde(flatten)]
    pub settings: CheckSettings,
}

impl CheckOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            settings: CheckSettings::default(),
        }
    }
}

/// Body of `PUT /checks/{token}`; only the fields that are set change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub settings: CheckSettings,
}
