//! HTTP client abstraction for testability

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::WhatsupError;

/// Redirect hops followed before a probe gives up
pub const MAX_REDIRECTS: usize = 10;

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request, following redirects and attaching the cookies
    async fn get(
        &self,
        url: &str,
        cookies: &BTreeMap<String, String>,
    ) -> crate::Result<HttpResponse>;

    /// Send a POST request with a JSON body
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    probe_timeout: Duration,
    webhook_timeout: Duration,
}

impl ReqwestHttpClient {
    pub fn new(probe_timeout: Duration, webhook_timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!("whatsup/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WhatsupError::Http(format!("Building HTTP client: {}", e)))?;

        tracing::debug!(
            "Created HTTP client (probe timeout {:?}, webhook timeout {:?})",
            probe_timeout,
            webhook_timeout
        );

        Ok(Self {
            client,
            probe_timeout,
            webhook_timeout,
        })
    }

    async fn read(
        method: &str,
        url: &str,
        response: reqwest::Response,
    ) -> crate::Result<HttpResponse> {
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
        let body = response
            .text()
            .await
            .map_err(|e| classify(method, url, e))?;

        tracing::debug!(
            "{} {} -> {} ({} bytes)",
            method,
            url,
            status.as_u16(),
            body.len()
        );
        Ok(HttpResponse {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(
        &self,
        url: &str,
        cookies: &BTreeMap<String, String>,
    ) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {}", url);
        let mut request = self.client.get(url).timeout(self.probe_timeout);
        if let Some(cookie) = cookie_header(cookies) {
            request = request.header(reqwest::header::COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify("GET", url, e))?;
        Self::read("GET", url, response).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> crate::Result<HttpResponse> {
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .timeout(self.webhook_timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| classify("POST", url, e))?;
        Self::read("POST", url, response).await
    }
}

/// Render a cookie mapping as a single `Cookie` header value
pub fn cookie_header(cookies: &BTreeMap<String, String>) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    Some(
        cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Only client-side problems (bad request, redirect loop) stay `Http`;
/// anything that went wrong on the wire is a connection failure.
fn classify(method: &str, url: &str, e: reqwest::Error) -> WhatsupError {
    if e.is_timeout() {
        WhatsupError::Timeout(format!("{} {} timed out: {}", method, url, e))
    } else if e.is_builder() || e.is_redirect() {
        WhatsupError::Http(format!("{} {} failed: {}", method, url, e))
    } else {
        WhatsupError::Connection(format!("{} {} failed: {}", method, url, e))
    }
}
