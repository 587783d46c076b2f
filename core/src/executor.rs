//! The HTTP primitive a `FetchClient` runs its requests through.
//!
//! # Design
//! `HttpExecutor` is the only place real I/O happens. It performs exactly one
//! round trip and reports non-2xx statuses as data; anything that prevents a
//! response from arriving is a `TransportError::Transport` carrying the
//! library's own error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one HTTP round trip.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: HttpExecutor + ?Sized> HttpExecutor for Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request).await
    }
}

pub const TIMEOUT_ENV: &str = "TRANSPORT_TIMEOUT_SECS";
pub const CONNECT_TIMEOUT_ENV: &str = "TRANSPORT_CONNECT_TIMEOUT_SECS";
pub const USER_AGENT_ENV: &str = "TRANSPORT_USER_AGENT";

/// Settings for [`ReqwestExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Total time allowed for one round trip.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("transport-core/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ExecutorConfig {
    /// Defaults overridden by `TRANSPORT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `TRANSPORT_*`
    /// keys. Unparsable durations are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(timeout) = seconds(&lookup, TIMEOUT_ENV) {
            config.timeout = timeout;
        }
        if let Some(timeout) = seconds(&lookup, CONNECT_TIMEOUT_ENV) {
            config.connect_timeout = timeout;
        }
        if let Some(agent) = lookup(USER_AGENT_ENV).filter(|a| !a.trim().is_empty()) {
            config.user_agent = agent;
        }
        config
    }
}

fn seconds(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(err) => {
            warn!(key, value = %raw, error = %err, "ignoring unparsable timeout");
            None
        }
    }
}

/// [`HttpExecutor`] backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    pub fn new(config: &ExecutorConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(TransportError::transport)?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(TransportError::transport)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(TransportError::transport)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
