use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::ProxyConfig;

/// Settings applied when building the HTTP client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportConfig {
    pub proxy: Option<ProxyConfig>,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY` when no explicit proxy is set.
    pub env_proxy: bool,
    pub timeout: Option<Duration>,
}

/// Why an outbound request did not succeed.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportFailure {
    /// The server answered with a non-2xx status.
    Status { status: u16, body: String },
    Timeout(String),
    /// Connection, TLS or protocol failure before a response arrived.
    Network(String),
}

/// Outbound HTTP used by notification providers.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON and return the decoded response body.
    async fn post_json(&self, url: &str, body: &Value) -> std::result::Result<Value, TransportFailure>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(proxy) = &config.proxy {
            let mut p = reqwest::Proxy::all(proxy.url())
                .with_context(|| format!("Invalid proxy URL: {}", proxy.url()))?;
            if let (Some(user), Some(pass)) = (&proxy.username, &proxy.password) {
                p = p.basic_auth(user, pass);
            }
            builder = builder.proxy(p);
        } else if !config.env_proxy {
            builder = builder.no_proxy();
        }

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, body: &Value) -> std::result::Result<Value, TransportFailure> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(failure_from)?;

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) if !status.is_success() => {
                return Err(TransportFailure::Status {
                    status: status.as_u16(),
                    body: format!("<failed to read response body: {}>", e.without_url()),
                });
            }
            Err(e) => return Err(failure_from(e)),
        };
        debug!("Response status {} ({} bytes)", status, text.len());

        if !status.is_success() {
            return Err(TransportFailure::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

/// Classify a reqwest error. The URL is stripped since it may carry credentials.
fn failure_from(e: reqwest::Error) -> TransportFailure {
    let timed_out = e.is_timeout();
    let reason = e.without_url().to_string();
    if timed_out {
        TransportFailure::Timeout(reason)
    } else {
        TransportFailure::Network(reason)
    }
}
