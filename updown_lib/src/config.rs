//! Client configuration.

use crate::error::Error;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://updown.io/api";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Where the API key goes on each request. A client uses exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyPlacement {
    /// `X-API-KEY` request header.
    #[default]
    Header,
    /// `api-key` query parameter.
    Query,
}

/// Fully populated configuration used by [`crate::Client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Reject create/update/delete calls without contacting the API.
    /// Use this with read-only API keys.
    pub read_only: bool,
    /// Log each request at debug level. The API key is redacted, but URLs and
    /// bodies are logged as-is.
    pub verbose: bool,
    pub api_key_placement: ApiKeyPlacement,
    pub base_url: String,
    pub timeout: Duration,
}

/// User-supplied configuration; unset fields take the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PartialConfig {
    pub read_only: Option<bool>,
    pub verbose: Option<bool>,
    pub api_key_placement: Option<ApiKeyPlacement>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            verbose: false,
            api_key_placement: ApiKeyPlacement::Header,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Fill the gaps in `partial` from [`ClientConfig::default`].
pub fn parse_config(partial: PartialConfig) -> ClientConfig {
    let defaults = ClientConfig::default();
    ClientConfig {
        read_only: partial.read_only.unwrap_or(defaults.read_only),
        verbose: partial.verbose.unwrap_or(defaults.verbose),
        api_key_placement: partial
            .api_key_placement
            .unwrap_or(defaults.api_key_placement),
        base_url: partial.base_url.unwrap_or(defaults.base_url),
        timeout: partial
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout),
    }
}

impl ClientConfig {
    /// Check that `base_url` is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), Error> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid base URL {}: {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "base URL must be http or https, got {}",
                url.scheme()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_partial_yields_defaults() {
        let config = parse_config(PartialConfig::default());
        assert_eq!(config, ClientConfig::default());
        assert!(!config.read_only);
        assert!(!config.verbose);
        assert_eq!(config.api_key_placement, ApiKeyPlacement::Header);
        assert_eq!(config.base_url, "https://updown.io/api");
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn set_fields_override_defaults() {
        let config = parse_config(PartialConfig {
            read_only: Some(true),
            api_key_placement: Some(ApiKeyPlacement::Query),
            timeout_secs: Some(3),
            ..Default::default()
        });
        assert!(config.read_only);
        assert!(!config.verbose);
        assert_eq!(config.api_key_placement, ApiKeyPlacement::Query);
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn partial_config_deserializes_from_json() {
        let partial: PartialConfig =
            serde_json::from_str(r#"{"read_only": true, "api_key_placement": "query"}"#).unwrap();
        assert_eq!(partial.read_only, Some(true));
        assert_eq!(partial.api_key_placement, Some(ApiKeyPlacement::Query));
        assert_eq!(partial.base_url, None);
    }

    #[test]
    fn validate_rejects_bad_base_urls() {
        assert!(ClientConfig::default().validate().is_ok());
        for bad in ["updown.io/api", "ftp://updown.io/api"] {
            let config = parse_config(PartialConfig {
                base_url: Some(bad.to_string()),
                ..Default::default()
            });
            assert!(matches!(config.validate(), Err(Error::Config(_))), "{bad}");
        }
    }
}
