//! Client for the updown.io REST API.

use crate::check::{Check, CheckOptions, CheckRef, CheckUpdate};
use crate::config::{parse_config, ApiKeyPlacement, ClientConfig, PartialConfig};
use crate::downtime::Downtime;
use crate::error::{Error, ReadOnlyModeError};
use crate::metrics::{GroupedMetrics, MetricsGrouping};
use crate::node::Nodes;
use crate::request::{format_url, Query, QueryValue};
use crate::response::{decode_deleted, decode_list, handle_response};
use crate::transport::{HttpRequest, Method, ReqwestTransport, Transport};
use crate::webhook::{Webhook, WebhookOptions, WebhookRef};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const API_KEY_HEADER: &str = "X-API-KEY";
/// Cache-busting parameter added to every GET.
const CACHE_BUST_PARAM: &str = "_t";

/// Options for [`Client::get_metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsOptions {
    /// Start of the period; the API defaults to one month ago.
    pub from: Option<DateTime<Utc>>,
    /// End of the period; the API defaults to now.
    pub to: Option<DateTime<Utc>>,
    pub group: MetricsGrouping,
}

/// updown.io API client.
#[derive(Clone)]
pub struct Client {
    api_key: String,
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client using the default HTTP transport.
    pub fn new(api_key: impl Into<String>, config: PartialConfig) -> Result<Self, Error> {
        let config = parse_config(config);
        let transport = ReqwestTransport::new(config.timeout)?;
        Self::with_transport(api_key, config, Arc::new(transport))
    }

    /// Create a client on top of any [`Transport`].
    pub fn with_transport(
        api_key: impl Into<String>,
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            api_key: api_key.into(),
            config,
            transport,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// List all checks.
    pub async fn get_checks(&self) -> Result<Vec<Check>, Error> {
        let res = self
            .request("get_checks", Method::Get, &["checks"], vec![], None)
            .await?;
        Ok(decode_list(&res, Check::decode)?)
    }

    /// Get a single check. With `metrics`, the last hour of metrics is included.
    pub async fn get_check<'a>(
        &self,
        check: impl Into<CheckRef<'a>>,
        metrics: bool,
    ) -> Result<Check, Error> {
        let token = check.into().token();
        let query: Query = vec![("metrics", metrics.then_some(QueryValue::Bool(true)))];
        let res = self
            .request("get_check", Method::Get, &["checks", token], query, None)
            .await?;
        Ok(Check::decode(&res)?)
    }

    /// List downtimes of a check, 100 per page.
    pub async fn get_downtimes<'a>(
        &self,
        check: impl Into<CheckRef<'a>>,
        page: Option<u32>,
    ) -> Result<Vec<Downtime>, Error> {
        let token = check.into().token();
        let query: Query = vec![("page", page.map(QueryValue::from))];
        let res = self
            .request(
                "get_downtimes",
                Method::Get,
                &["checks", token, "downtimes"],
                query,
                None,
            )
            .await?;
        Ok(decode_list(&res, |v| Downtime::decode(token, v))?)
    }

    /// Get metrics of a check. The variant of the result matches `options.group`.
    pub async fn get_metrics<'a>(
        &self,
        check: impl Into<CheckRef<'a>>,
        options: &MetricsOptions,
    ) -> Result<GroupedMetrics, Error> {
        let token = check.into().token();
        let query: Query = vec![
            ("from", options.from.map(QueryValue::from)),
            ("to", options.to.map(QueryValue::from)),
            ("group", options.group.as_query().map(QueryValue::from)),
        ];
        let res = self
            .request(
                "get_metrics",
                Method::Get,
                &["checks", token, "metrics"],
                query,
                None,
            )
            .await?;
        Ok(GroupedMetrics::decode(&res, options.group)?)
    }

    /// Create a check.
    pub async fn add_check(&self, options: &CheckOptions) -> Result<Check, Error> {
        let body = to_body(options)?;
        let res = self
            .request("add_check", Method::Post, &["checks"], vec![], Some(body))
            .await?;
        Ok(Check::decode(&res)?)
    }

    /// Change the given settings of a check; returns the updated check.
    pub async fn update_check<'a>(
        &self,
        check: impl Into<CheckRef<'a>>,
        update: &CheckUpdate,
    ) -> Result<Check, Error> {
        let token = check.into().token();
        let body = to_body(update)?;
        let res = self
            .request(
                "update_check",
                Method::Put,
                &["checks", token],
                vec![],
                Some(body),
            )
            .await?;
        Ok(Check::decode(&res)?)
    }

    /// Delete a check; returns the API's `deleted` flag.
    pub async fn delete_check<'a>(&self, check: impl Into<CheckRef<'a>>) -> Result<bool, Error> {
        let token = check.into().token();
        let res = self
            .request("delete_check", Method::Delete, &["checks", token], vec![], None)
            .await?;
        Ok(decode_deleted(&res)?)
    }

    /// All monitoring nodes keyed by location code.
    pub async fn get_nodes(&self) -> Result<Nodes, Error> {
        let res = self
            .request("get_nodes", Method::Get, &["nodes"], vec![], None)
            .await?;
        Ok(serde_json::from_value(res)?)
    }

    /// IPv4 addresses of all monitoring nodes.
    pub async fn get_ipv4_nodes(&self) -> Result<Vec<String>, Error> {
        let res = self
            .request("get_ipv4_nodes", Method::Get, &["nodes", "ipv4"], vec![], None)
            .await?;
        Ok(serde_json::from_value(res)?)
    }

    /// IPv6 addresses of all monitoring nodes.
    pub async fn get_ipv6_nodes(&self) -> Result<Vec<String>, Error> {
        let res = self
            .request("get_ipv6_nodes", Method::Get, &["nodes", "ipv6"], vec![], None)
            .await?;
        Ok(serde_json::from_value(res)?)
    }

    /// List registered webhooks.
    pub async fn get_webhooks(&self) -> Result<Vec<Webhook>, Error> {
        let res = self
            .request("get_webhooks", Method::Get, &["webhooks"], vec![], None)
            .await?;
        Ok(decode_list(&res, Webhook::decode)?)
    }

    /// Register a webhook.
    pub async fn add_webhook(&self, options: &WebhookOptions) -> Result<Webhook, Error> {
        let body = to_body(options)?;
        let res = self
            .request("add_webhook", Method::Post, &["webhooks"], vec![], Some(body))
            .await?;
        Ok(Webhook::decode(&res)?)
    }

    /// Delete a webhook; returns the API's `deleted` flag.
    pub async fn delete_webhook<'a>(
        &self,
        webhook: impl Into<WebhookRef<'a>>,
    ) -> Result<bool, Error> {
        let id = webhook.into().id();
        let res = self
            .request("delete_webhook", Method::Delete, &["webhooks", id], vec![], None)
            .await?;
        Ok(decode_deleted(&res)?)
    }

    async fn request(
        &self,
        operation: &'static str,
        method: Method,
        segments: &[&str],
        mut query: Query,
        body: Option<Value>,
    ) -> Result<Value, Error> {
        if method.is_mutating() && self.config.read_only {
            return Err(ReadOnlyModeError { operation }.into());
        }
        if !method.is_mutating() {
            query.push((
                CACHE_BUST_PARAM,
                Some(QueryValue::Int(Utc::now().timestamp_millis())),
            ));
        }

        let public_url = format_url(&self.config.base_url, segments, &query, None);
        let (url, headers) = match self.config.api_key_placement {
            _ if self.api_key.is_empty() => (public_url.clone(), vec![]),
            ApiKeyPlacement::Header => (
                public_url.clone(),
                vec![(API_KEY_HEADER.to_string(), self.api_key.clone())],
            ),
            ApiKeyPlacement::Query => (
                format_url(&self.config.base_url, segments, &query, Some(&self.api_key)),
                vec![],
            ),
        };

        if self.config.verbose {
            tracing::debug!(operation, %method, url = %public_url, body = ?body, "sending request");
        }
        let res = self
            .transport
            .execute(HttpRequest {
                method,
                url,
                body,
                headers,
            })
            .await?;
        if self.config.verbose {
            tracing::debug!(
                operation,
                status = res.status,
                bytes = res.body.len(),
                "received response"
            );
        }
        handle_response(res.status, &res.body)
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<Value, Error> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::tests::check_json;
    use crate::check::CheckInterval;
    use crate::metrics::tests::metrics_json;
    use crate::transport::{HttpResponse, MockTransport};
    use chrono::TimeZone;
    use serde_json::json;

    const BASE: &str = "https://updown.io/api";

    fn expect(
        mock: &mut MockTransport,
        status: u16,
        body: Value,
        matcher: impl Fn(&HttpRequest) -> bool + Send + 'static,
    ) {
        let body = body.to_string();
        mock.expect_execute()
            .withf(matcher)
            .times(1)
            .returning(move |_| {
                let body = body.clone();
                Box::pin(async move { Ok(HttpResponse { status, body }) })
            });
    }

    fn client(mock: MockTransport) -> Client {
        client_with(mock, PartialConfig::default())
    }

    fn client_with(mock: MockTransport, partial: PartialConfig) -> Client {
        Client::with_transport("secret-key", parse_config(partial), Arc::new(mock)).unwrap()
    }

    fn has_key_header(req: &HttpRequest) -> bool {
        req.headers
            .iter()
            .any(|(k, v)| k == "X-API-KEY" && v == "secret-key")
    }

    #[tokio::test]
    async fn get_checks_decodes_list_and_sends_key_header() {
        let mut mock = MockTransport::new();
        expect(&mut mock, 200, json!([check_json(), check_json()]), |req| {
            req.method == Method::Get
                && req.url.starts_with(&format!("{}/checks?_t=", BASE))
                && !req.url.contains("api-key")
                && req.body.is_none()
                && has_key_header(req)
        });
        let checks = client(mock).get_checks().await.unwrap();
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].token, "ngg8");
    }

    #[tokio::test]
    async fn query_placement_puts_key_in_url() {
        let mut mock = MockTransport::new();
        expect(&mut mock, 200, json!([]), |req| {
            req.url.ends_with("&api-key=secret-key") && req.headers.is_empty()
        });
        let client = client_with(
            mock,
            PartialConfig {
                api_key_placement: Some(ApiKeyPlacement::Query),
                ..Default::default()
            },
        );
        assert!(client.get_webhooks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_key_is_never_sent() {
        let mut mock = MockTransport::new();
        expect(&mut mock, 200, json!(["1.2.3.4"]), |req| {
            req.headers.is_empty() && req.url.starts_with(&format!("{}/nodes/ipv4?_t=", BASE))
        });
        let client = Client::with_transport("", ClientConfig::default(), Arc::new(mock)).unwrap();
        assert_eq!(client.get_ipv4_nodes().await.unwrap(), vec!["1.2.3.4"]);
    }

    #[tokio::test]
    async fn get_check_accepts_token_or_check() {
        let check = Check::decode(&check_json()).unwrap();
        let mut mock = MockTransport::new();
        expect(&mut mock, 200, check_json(), |req| {
            req.url.starts_with(&format!("{}/checks/ngg8?metrics=1&_t=", BASE))
        });
        expect(&mut mock, 200, check_json(), |req| {
            req.url.starts_with(&format!("{}/checks/abc?_t=", BASE))
        });
        let client = client(mock);
        assert_eq!(client.get_check(&check, true).await.unwrap(), check);
        assert_eq!(client.get_check("abc", false).await.unwrap().token, "ngg8");
    }

    #[tokio::test]
    async fn get_downtimes_sets_page_and_check_token() {
        let mut mock = MockTransport::new();
        expect(
            &mut mock,
            200,
            json!([{ "error": "500", "started_at": "2016-04-01T14:20:00Z" }]),
            |req| req.url.starts_with(&format!("{}/checks/ngg8/downtimes?page=2&_t=", BASE)),
        );
        let downtimes = client(mock).get_downtimes("ngg8", Some(2)).await.unwrap();
        assert_eq!(downtimes.len(), 1);
        assert_eq!(downtimes[0].check_token, "ngg8");
        assert!(downtimes[0].is_ongoing());
    }

    #[tokio::test]
    async fn get_metrics_grouped_by_host() {
        let mut host_entry = metrics_json();
        host_entry["host"] = json!({
            "ip": "45.76.104.117", "city": "Tokyo", "country": "Japan", "country_code": "jp"
        });
        let mut mock = MockTransport::new();
        expect(&mut mock, 200, json!({ "tok": host_entry }), |req| {
            req.url.starts_with(&format!(
                "{}/checks/ngg8/metrics?from=2019-01-01T00%3A00%3A00.000Z&group=host&_t=",
                BASE
            ))
        });
        let options = MetricsOptions {
            from: Some(Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap()),
            group: MetricsGrouping::Host,
            ..Default::default()
        };
        match client(mock).get_metrics("ngg8", &options).await.unwrap() {
            GroupedMetrics::Host(hosts) => {
                assert_eq!(hosts.len(), 1);
                assert_eq!(hosts[0].host, "tok");
                assert_eq!(hosts[0].city, "Tokyo");
            }
            other => panic!("expected host grouping, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_metrics_without_data() {
        let mut mock = MockTransport::new();
        expect(&mut mock, 200, json!({}), |req| !req.url.contains("group="));
        let metrics = client(mock)
            .get_metrics("ngg8", &MetricsOptions::default())
            .await
            .unwrap();
        assert_eq!(metrics, GroupedMetrics::Ungrouped(None));
    }

    #[tokio::test]
    async fn add_check_posts_json_body_without_cache_bust() {
        let mut options = CheckOptions::new("https://example.com");
        options.settings.period = Some(CheckInterval::Hour1);
        let mut mock = MockTransport::new();
        expect(&mut mock, 201, check_json(), |req| {
            req.method == Method::Post
                && req.url == format!("{}/checks", BASE)
                && req.body == Some(json!({ "url": "https://example.com", "period": 3600 }))
        });
        let check = client(mock).add_check(&options).await.unwrap();
        assert_eq!(check.token, "ngg8");
    }

    #[tokio::test]
    async fn update_check_puts_partial_body() {
        let update = CheckUpdate {
            url: Some("https://example.org".to_string()),
            ..Default::default()
        };
        let mut mock = MockTransport::new();
        expect(&mut mock, 200, check_json(), |req| {
            req.method == Method::Put
                && req.url == format!("{}/checks/ngg8", BASE)
                && req.body == Some(json!({ "url": "https://example.org" }))
        });
        client(mock).update_check("ngg8", &update).await.unwrap();
    }

    #[tokio::test]
    async fn deletes_return_flag() {
        let mut mock = MockTransport::new();
        expect(&mut mock, 200, json!({ "deleted": true }), |req| {
            req.method == Method::Delete && req.url == format!("{}/checks/ngg8", BASE)
        });
        expect(&mut mock, 200, json!({ "deleted": true }), |req| {
            req.method == Method::Delete && req.url == format!("{}/webhooks/5f2a", BASE)
        });
        let client = client(mock);
        assert!(client.delete_check("ngg8").await.unwrap());
        let hook = Webhook {
            id: "5f2a".to_string(),
            url: "https://example.com/hook".to_string(),
        };
        assert!(client.delete_webhook(&hook).await.unwrap());
    }

    #[tokio::test]
    async fn node_listings_decode() {
        let mut mock = MockTransport::new();
        expect(
            &mut mock,
            200,
            json!({
                "lan": {
                    "ip": "91.121.222.175",
                    "ip6": "2001:41d0:2:85af::1",
                    "city": "Gravelines",
                    "country": "France",
                    "country_code": "fr",
                    "lat": 50.9871,
                    "lng": 2.1255
                }
            }),
            |req| req.url.starts_with(&format!("{}/nodes?_t=", BASE)),
        );
        expect(&mut mock, 200, json!(["2001:41d0:2:85af::1"]), |req| {
            req.url.starts_with(&format!("{}/nodes/ipv6?_t=", BASE))
        });
        let client = client(mock);
        let nodes = client.get_nodes().await.unwrap();
        assert_eq!(nodes["lan"].country_code, "fr");
        assert_eq!(nodes["lan"].ipv6.as_deref(), Some("2001:41d0:2:85af::1"));
        assert_eq!(
            client.get_ipv6_nodes().await.unwrap(),
            vec!["2001:41d0:2:85af::1"]
        );
    }

    #[tokio::test]
    async fn webhooks_round_trip() {
        let mut mock = MockTransport::new();
        expect(
            &mut mock,
            201,
            json!({ "id": "5f2a", "url": "https://example.com/hook" }),
            |req| {
                req.method == Method::Post
                    && req.body == Some(json!({ "url": "https://example.com/hook" }))
            },
        );
        let hook = client(mock)
            .add_webhook(&WebhookOptions {
                url: "https://example.com/hook".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(hook.id, "5f2a");
    }

    #[tokio::test]
    async fn read_only_rejects_mutations_without_network() {
        let mut mock = MockTransport::new();
        mock.expect_execute().never();
        let client = client_with(
            mock,
            PartialConfig {
                read_only: Some(true),
                ..Default::default()
            },
        );

        let results = [
            client.add_check(&CheckOptions::new("https://example.com")).await.map(|_| ()),
            client.update_check("ngg8", &CheckUpdate::default()).await.map(|_| ()),
            client.delete_check("ngg8").await.map(|_| ()),
            client
                .add_webhook(&WebhookOptions {
                    url: "https://example.com/hook".to_string(),
                })
                .await
                .map(|_| ()),
            client.delete_webhook("5f2a").await.map(|_| ()),
        ];
        for result in results {
            assert!(matches!(result, Err(Error::ReadOnly(_))), "{result:?}");
        }
    }

    #[tokio::test]
    async fn read_only_still_allows_reads() {
        let mut mock = MockTransport::new();
        expect(&mut mock, 200, json!({}), |req| req.method == Method::Get);
        let client = client_with(
            mock,
            PartialConfig {
                read_only: Some(true),
                ..Default::default()
            },
        );
        assert!(client.get_nodes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn api_errors_propagate() {
        let mut mock = MockTransport::new();
        expect(&mut mock, 404, json!({ "error": "not found" }), |_| true);
        match client(mock).get_check("a", false).await.unwrap_err() {
            Error::Api(e) => {
                assert_eq!(e.message, "not found");
                assert_eq!(e.status_code, Some(404));
            }
            other => panic!("expected Error::Api, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_payloads_are_decode_errors() {
        let mut mock = MockTransport::new();
        expect(&mut mock, 200, json!([{ "token": "x" }]), |_| true);
        match client(mock).get_checks().await.unwrap_err() {
            Error::Decode(e) => assert_eq!(e.field(), "url"),
            other => panic!("expected Error::Decode, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failures_propagate() {
        let mut mock = MockTransport::new();
        mock.expect_execute().times(1).returning(|_| {
            Box::pin(async { Err(Error::Transport("GET failed: connection refused".to_string())) })
        });
        assert!(matches!(
            client(mock).get_checks().await,
            Err(Error::Transport(_))
        ));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = parse_config(PartialConfig {
            base_url: Some("not a url".to_string()),
            ..Default::default()
        });
        let err = Client::with_transport("k", config, Arc::new(MockTransport::new())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
