//! HTTP transport for the letters API.
//!
//! `Transport` moves raw requests; `ApiClient` layers JSON encoding and
//! failure classification on top, so callers only ever see a decoded
//! success payload or a `SyncError`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::classify::classify;
use crate::error::{Result, SyncError};
use crate::model::ErrorPayload;

/// HTTP verbs used by the letters API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Status and body of a completed exchange, whatever the status.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves one request to the remote and returns its raw response.
///
/// Implementations fail only when no status was obtained.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<RawResponse>;
}

/// Credentials attached to every request.
#[derive(Clone, Default)]
pub enum Credentials {
    #[default]
    None,
    Bearer(String),
    Cookie(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::Bearer(_) => f.write_str("Bearer(..)"),
            Credentials::Cookie(_) => f.write_str("Cookie(..)"),
        }
    }
}

/// Connection settings for `HttpTransport`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin of the letters API, e.g. `http://localhost:5000`.
    pub base_url: String,
    pub credentials: Credentials,
    /// `None` keeps the HTTP client's default.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credentials: Credentials::None,
            timeout: None,
        }
    }
}

/// reqwest-backed transport.
pub struct HttpTransport {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| SyncError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, body), level = "debug")]
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<RawResponse> {
        let mut req = self
            .http
            .request(method.into(), self.url(path))
            .header(CONTENT_TYPE, "application/json");

        req = match &self.credentials {
            Credentials::None => req,
            Credentials::Bearer(token) => req.bearer_auth(token),
            Credentials::Cookie(cookie) => req.header(COOKIE, cookie),
        };

        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();

        debug!("{} {} -> {} ({} bytes)", method, path, status, body.len());
        Ok(RawResponse { status, body })
    }
}

/// JSON client over a `Transport`.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Send a request; a non-success status is classified with `fallback`
    /// as the message of last resort.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        fallback: &str,
    ) -> Result<Vec<u8>> {
        let resp = self.transport.send(method, path, body).await?;
        if !resp.is_success() {
            let payload = ErrorPayload::parse(&resp.body);
            return Err(classify(resp.status, &payload, fallback));
        }
        Ok(resp.body)
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<R> {
        let body = self.execute(Method::Get, path, None, fallback).await?;
        decode(&body)
    }

    pub async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<R> {
        let body = serde_json::to_value(body)?;
        let resp = self.execute(Method::Post, path, Some(body), fallback).await?;
        decode(&resp)
    }

    pub async fn put<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<R> {
        let body = serde_json::to_value(body)?;
        let resp = self.execute(Method::Put, path, Some(body), fallback).await?;
        decode(&resp)
    }

    /// DELETE; any success body (typically 204) is discarded.
    pub async fn delete(&self, path: &str, fallback: &str) -> Result<()> {
        self.execute(Method::Delete, path, None, fallback).await?;
        Ok(())
    }
}

/// Decode a success body; an empty body decodes as JSON `null`.
fn decode<R: DeserializeOwned>(body: &[u8]) -> Result<R> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_slice(body)?)
}
