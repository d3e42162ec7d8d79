//! HTTP client for the backend proxy.
//!
//! Wraps `reqwest::Client` with optional Bearer-token injection and JSON
//! body parsing.  Requests are sent once: failures are returned to the
//! caller as-is, with no retry.

use crate::onedrive::error::{ConsoleError, ConsoleResult};
use crate::onedrive::types::ConsoleConfig;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Low-level backend HTTP client.
#[derive(Debug, Clone)]
pub struct BackendClient {
    inner: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new backend client.
    pub fn new(config: &ConsoleConfig) -> ConsoleResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ConsoleError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            inner,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a backend endpoint path.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// GET a JSON document.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: Option<&str>,
    ) -> ConsoleResult<T> {
        let url = self.url(path);
        debug!("GET {}", url);
        let req = self.authorize(self.inner.get(&url).query(query), token);
        let resp = req.send().await.map_err(ConsoleError::from)?;
        Self::parse_json(resp).await
    }

    /// POST a JSON body and parse the JSON reply.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> ConsoleResult<T> {
        let url = self.url(path);
        debug!("POST {}", url);
        let req = self.authorize(self.inner.post(&url).json(body), token);
        let resp = req.send().await.map_err(ConsoleError::from)?;
        Self::parse_json(resp).await
    }

    /// GET raw bytes (for downloads).
    pub async fn get_bytes(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: Option<&str>,
    ) -> ConsoleResult<Vec<u8>> {
        let url = self.url(path);
        debug!("GET (bytes) {}", url);
        let req = self.authorize(self.inner.get(&url).query(query), token);
        let resp = req.send().await.map_err(ConsoleError::from)?;

        let status = resp.status().as_u16();
        if status >= 400 {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConsoleError::from_backend_response(status, &body));
        }

        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(ConsoleError::from)
    }

    /// Open a long-lived event stream.  The caller consumes the body.
    /// `last_event_id` resumes a stream after a reconnect.
    pub async fn open_event_stream(
        &self,
        path: &str,
        token: Option<&str>,
        last_event_id: Option<&str>,
    ) -> ConsoleResult<reqwest::Response> {
        let url = self.url(path);
        debug!("GET (event-stream) {}", url);
        let mut req = self
            .inner
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .header("Cache-Control", "no-cache");
        if let Some(id) = last_event_id {
            req = req.header("Last-Event-ID", id);
        }
        let req = self.authorize(req, token);
        let resp = req.send().await.map_err(ConsoleError::from)?;

        let status = resp.status().as_u16();
        if status >= 400 {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConsoleError::from_backend_response(status, &body));
        }
        Ok(resp)
    }

    // ─── Internal ────────────────────────────────────────────────────

    fn authorize(
        &self,
        req: reqwest::RequestBuilder,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> ConsoleResult<T> {
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(ConsoleError::from)?;

        debug!("Response status={} body_len={}", status, body.len());

        if status >= 400 {
            return Err(ConsoleError::from_backend_response(status, &body));
        }

        serde_json::from_str(&body).map_err(ConsoleError::from)
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
