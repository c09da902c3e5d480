//! HTTP transport abstraction.
//!
//! The client only needs "send method + URL + optional body + headers, get
//! back status and body". [`ReqwestTransport`] is the production
//! implementation; tests swap in a mock.

use crate::error::Error;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// True for methods that change state on the server.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing request. The body, when present, is sent as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

/// Status and raw body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}

/// Transport backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: HttpClient,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let user_agent = format!("updown-cli/{}", crate::VERSION);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&user_agent).map_err(|e| Error::Config(e.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = HttpClient::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let HttpRequest {
            method,
            url,
            body,
            headers,
        } = request;

        let mut header_map = HeaderMap::new();
        for (name, value) in &headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Config(format!("header {}: {}", name, e)))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| Error::Config(format!("header {}: {}", name, e)))?;
            header_map.insert(name, value);
        }

        let mut req = match method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
            Method::Put => self.http.put(&url),
            Method::Delete => self.http.delete(&url),
        }
        .headers(header_map);
        if let Some(body) = &body {
            req = req.json(body);
        }

        let res = req
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{} failed: {}", method, e)))?;
        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Reading response body: {}", e)))?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Port 1 is reserved and unbound, so connections are refused.
    const UNREACHABLE_URL: &str = "http://127.0.0.1:1/api/checks";

    #[test]
    fn only_get_is_non_mutating() {
        assert!(!Method::Get.is_mutating());
        assert!(Method::Post.is_mutating());
        assert!(Method::Put.is_mutating());
        assert!(Method::Delete.is_mutating());
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let err = transport
            .execute(HttpRequest {
                method: Method::Get,
                url: UNREACHABLE_URL.to_string(),
                body: None,
                headers: vec![],
            })
            .await
            .unwrap_err();
        match err {
            Error::Transport(msg) => assert!(msg.starts_with("GET failed:"), "{msg}"),
            other => panic!("expected Error::Transport, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_header_value_is_rejected_before_sending() {
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let err = transport
            .execute(HttpRequest {
                method: Method::Get,
                url: UNREACHABLE_URL.to_string(),
                body: None,
                headers: vec![("X-API-KEY".to_string(), "bad\nkey".to_string())],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
