//! Performance metrics for a check, optionally grouped by host or by hour.

use crate::error::DecodeError;
use crate::timestamp::Timestamp;
use crate::validator::Validator;
use serde::Serialize;
use serde_json::Value;

/// Average time spent in each phase of a request, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timings {
    pub redirect: u64,
    /// Wire name `namelookup`.
    pub name_lookup: u64,
    pub connection: u64,
    pub handshake: u64,
    pub response: u64,
    pub total: u64,
}

/// Number of requests that completed within each cumulative time bucket.
///
/// 4 seconds is the cutoff; slower requests are counted as failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseTimes {
    pub under125: u64,
    pub under250: u64,
    pub under500: u64,
    pub under1000: u64,
    pub under2000: u64,
    pub under4000: u64,
}

/// Request counts for a set of metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requests {
    pub samples: u64,
    pub failures: u64,
    /// Completed within the check's apdex target.
    pub satisfied: u64,
    /// Did not fail, but took longer than the apdex target.
    pub tolerated: u64,
    /// Wire name `by_response_time`.
    pub by_response_time: ResponseTimes,
}

/// Aggregated performance statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    /// Apdex score between 0 and 1.
    pub apdex: f64,
    pub timings: Timings,
    pub requests: Requests,
}

impl Metrics {
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        Self::from_validator(&Validator::new(value)?)
    }

    pub(crate) fn from_validator(v: &Validator<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            apdex: v.number("apdex")?,
            timings: decode_timings(&v.nested("timings")?)?,
            requests: decode_requests(&v.nested("requests")?)?,
        })
    }
}

fn decode_timings(v: &Validator<'_>) -> Result<Timings, DecodeError> {
    Ok(Timings {
        redirect: v.integer("redirect")?,
        name_lookup: v.integer("namelookup")?,
        connection: v.integer("connection")?,
        handshake: v.integer("handshake")?,
        response: v.integer("response")?,
        total: v.integer("total")?,
    })
}

fn decode_requests(v: &Validator<'_>) -> Result<Requests, DecodeError> {
    Ok(Requests {
        samples: v.integer("samples")?,
        failures: v.integer("failures")?,
        satisfied: v.integer("satisfied")?,
        tolerated: v.integer("tolerated")?,
        by_response_time: decode_response_times(&v.nested("by_response_time")?)?,
    })
}

fn decode_response_times(v: &Validator<'_>) -> Result<ResponseTimes, DecodeError> {
    Ok(ResponseTimes {
        under125: v.integer("under125")?,
        under250: v.integer("under250")?,
        under500: v.integer("under500")?,
        under1000: v.integer("under1000")?,
        under2000: v.integer("under2000")?,
        under4000: v.integer("under4000")?,
    })
}

/// Metrics measured from one monitoring location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostGroupedMetrics {
    /// Location code of the monitoring node, taken from the map key.
    pub host: String,
    pub ip: String,
    pub city: String,
    pub country: String,
    pub country_code: String,
    #[serde(flatten)]
    pub metrics: Metrics,
}

impl HostGroupedMetrics {
    pub fn decode(host: &str, value: &Value) -> Result<Self, DecodeError> {
        let v = Validator::scoped(value, host)?;
        let h = v.nested("host")?;
        Ok(Self {
            host: host.to_string(),
            ip: h.string("ip")?,
            city: h.string("city")?,
            country: h.string("country")?,
            country_code: h.string("country_code")?,
            metrics: Metrics::from_validator(&v)?,
        })
    }
}

/// Metrics for one hour. Checks between 5:00 and 5:59 are reported at 5:00.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeGroupedMetrics {
    pub time: Timestamp,
    #[serde(flatten)]
    pub metrics: Metrics,
}

impl TimeGroupedMetrics {
    /// `time` is the map key, formatted `YYYY-MM-DD HH:MM:SS UTC`.
    pub fn decode(time: &str, value: &Value) -> Result<Self, DecodeError> {
        let v = Validator::scoped(value, time)?;
        Ok(Self {
            time: Timestamp::from_time_bucket(time),
            metrics: Metrics::from_validator(&v)?,
        })
    }
}

/// How the API should group metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsGrouping {
    /// One aggregate over the whole period.
    #[default]
    None,
    /// One entry per monitoring location.
    Host,
    /// One entry per hour.
    Time,
}

impl MetricsGrouping {
    /// Value of the `group` query parameter, if any.
    pub fn as_query(self) -> Option<&'static str> {
        match self {
            MetricsGrouping::None => None,
            MetricsGrouping::Host => Some("host"),
            MetricsGrouping::Time => Some("time"),
        }
    }
}

impl std::str::FromStr for MetricsGrouping {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "" => Ok(MetricsGrouping::None),
            "host" => Ok(MetricsGrouping::Host),
            "time" => Ok(MetricsGrouping::Time),
            _ => Err(format!("unknown metrics grouping: {}", s)),
        }
    }
}

/// Decoded metrics; the variant always matches the requested [`MetricsGrouping`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroupedMetrics {
    /// `None` when the check has no metrics yet (the API returns `{}`).
    Ungrouped(Option<Metrics>),
    Host(Vec<HostGroupedMetrics>),
    Time(Vec<TimeGroupedMetrics>),
}

impl GroupedMetrics {
    /// Decode a metrics payload. The shape is chosen by `grouping`, never
    /// inferred from the payload: host codes and hour keys are both strings.
    pub fn decode(value: &Value, grouping: MetricsGrouping) -> Result<Self, DecodeError> {
        let v = Validator::new(value)?;
        match grouping {
            MetricsGrouping::None => {
                if value.as_object().is_some_and(|m| m.is_empty()) {
                    return Ok(GroupedMetrics::Ungrouped(None));
                }
                Ok(GroupedMetrics::Ungrouped(Some(Metrics::from_validator(&v)?)))
            }
            MetricsGrouping::Host => Ok(GroupedMetrics::Host(
                entries(value)
                    .map(|(k, data)| HostGroupedMetrics::decode(k, data))
                    .collect::<Result<_, _>>()?,
            )),
            MetricsGrouping::Time => Ok(GroupedMetrics::Time(
                entries(value)
                    .map(|(k, data)| TimeGroupedMetrics::decode(k, data))
                    .collect::<Result<_, _>>()?,
            )),
        }
    }

    pub fn grouping(&self) -> MetricsGrouping {
        match self {
            GroupedMetrics::Ungrouped(_) => MetricsGrouping::None,
            GroupedMetrics::Host(_) => MetricsGrouping::Host,
            GroupedMetrics::Time(_) => MetricsGrouping::Time,
        }
    }
}

fn entries(value: &Value) -> impl Iterator<Item = (&String, &Value)> {
    value.as_object().into_iter().flat_map(|m| m.iter())
}
