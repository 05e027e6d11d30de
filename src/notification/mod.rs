pub mod telegram;

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{NotifyError, Result};
use crate::transport::{Transport, TransportConfig, TransportFailure};

/// Per-channel settings record, as stored by the caller.
///
/// Always carries a `type` naming the provider; the remaining keys belong to
/// that provider.
pub type NotificationSettings = Map<String, Value>;

/// Returned by every provider after the remote side accepted the message.
pub const SENT_OK: &str = "Sent Successfully.";

/// A notification channel (Telegram, email, webhooks, ...).
#[async_trait::async_trait]
pub trait NotificationProvider: Send + Sync {
    /// Stable channel identifier, matched against the settings' `type`.
    fn name(&self) -> &str;

    /// Deliver `msg` using `notification`'s settings.
    ///
    /// `monitor` and `heartbeat` describe the watched resource and its latest
    /// check; providers only use them for template substitution.
    async fn send(
        &self,
        notification: &NotificationSettings,
        msg: &Value,
        monitor: Option<&Value>,
        heartbeat: Option<&Value>,
    ) -> Result<String>;
}

/// Transport settings derived from the process configuration.
pub fn transport_config_with_proxy(config: &Config) -> TransportConfig {
    TransportConfig {
        proxy: config.proxy.clone(),
        env_proxy: config.http.use_env_proxy,
        timeout: config.http.timeout_secs.map(Duration::from_secs),
    }
}

/// Convert a failed HTTP call into the error reported to the caller.
///
/// Keeps the remote diagnostic text: the API's `description` when the body
/// is a JSON error object, otherwise the raw body.
pub fn translate_transport_error(failure: TransportFailure) -> NotifyError {
    match failure {
        TransportFailure::Status { status, body } => {
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("description").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            let message = if detail.trim().is_empty() {
                format!("Request failed with status code {}", status)
            } else {
                format!("Request failed with status code {}: {}", status, detail)
            };
            NotifyError::Transport {
                status: Some(status),
                message,
            }
        }
        TransportFailure::Timeout(reason) => NotifyError::Transport {
            status: None,
            message: format!("Request timed out: {}", reason),
        },
        TransportFailure::Network(reason) => NotifyError::Transport {
            status: None,
            message: format!("Network failure: {}", reason),
        },
    }
}

/// Registry of providers, keyed by name.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn NotificationProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registry with every built-in channel sharing one transport.
    pub fn with_builtin(transport: Arc<dyn Transport>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(telegram::Telegram::new(transport)));
        registry
    }

    pub fn register(&mut self, provider: Arc<dyn NotificationProvider>) {
        info!("Registered notification provider: {}", provider.name());
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn NotificationProvider>> {
        self.providers.get(name).cloned()
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Route a notification to the provider named by its `type` field.
    pub async fn send(
        &self,
        notification: &NotificationSettings,
        msg: &Value,
        monitor: Option<&Value>,
        heartbeat: Option<&Value>,
    ) -> Result<String> {
        let kind = notification
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| NotifyError::Config("missing notification type".to_string()))?;
        let provider = self
            .get(kind)
            .ok_or_else(|| NotifyError::Config(format!("unknown notification type '{}'", kind)))?;

        debug!("Dispatching notification via {}", kind);
        provider.send(notification, msg, monitor, heartbeat).await
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
