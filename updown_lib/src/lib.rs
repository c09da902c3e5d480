//! updown.io API client library.
//!
//! Provides a typed client for the updown.io REST API: checks, downtimes,
//! metrics, monitoring nodes and webhooks. Every payload is validated field by
//! field before it becomes a typed value.

pub mod check;
pub mod client;
pub mod config;
pub mod downtime;
pub mod error;
pub mod helpers;
pub mod metrics;
pub mod node;
pub mod request;
pub mod response;
pub mod secret;
pub mod timestamp;
pub mod transport;
pub mod validator;
pub mod webhook;

pub use check::{
    ApdexTarget, Check, CheckInterval, CheckOptions, CheckRef, CheckSettings, CheckSslStatus,
    CheckUpdate, HttpVerb, Location, MuteUntil,
};
pub use client::{Client, MetricsOptions};
pub use config::{parse_config, ApiKeyPlacement, ClientConfig, PartialConfig};
pub use downtime::Downtime;
pub use error::{ApiError, DecodeError, Error, ReadOnlyModeError};
pub use helpers::{format_timestamp_display, get_api_key, ApiKeySource};
pub use metrics::{
    GroupedMetrics, HostGroupedMetrics, Metrics, MetricsGrouping, Requests, ResponseTimes,
    TimeGroupedMetrics, Timings,
};
pub use node::{Node, Nodes};
pub use timestamp::Timestamp;
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
pub use webhook::{Webhook, WebhookOptions, WebhookRef};

/// Library version for User-Agent and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
