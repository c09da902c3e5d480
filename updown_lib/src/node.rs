//! Monitoring nodes operated by updown.io.
//!
//! Nodes are static reference data and are read with plain serde rather than
//! the strict field validation used for checks and metrics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub ip: String,
    #[serde(default, rename = "ip6")]
    pub ipv6: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default, rename = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, rename = "lng")]
    pub longitude: Option<f64>,
}

/// Nodes keyed by location code (`lan`, `fra`, ...).
pub type Nodes = BTreeMap<String, Node>;
