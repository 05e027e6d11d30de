use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{NotifyError, Result};
use crate::escape::{escape_markdown_v2, escape_value};
use crate::notification::{
    translate_transport_error, NotificationProvider, NotificationSettings, SENT_OK,
};
use crate::template::{self, TemplateContext};
use crate::transport::Transport;

const DEFAULT_SERVER_URL: &str = "https://api.telegram.org";

/// Chat or thread identifier: numeric id or `@channelusername`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelegramId {
    Int(i64),
    Text(String),
}

impl TelegramId {
    fn is_set(&self) -> bool {
        match self {
            TelegramId::Int(id) => *id != 0,
            TelegramId::Text(id) => !id.is_empty(),
        }
    }
}

impl fmt::Display for TelegramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelegramId::Int(id) => write!(f, "{}", id),
            TelegramId::Text(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParseMode {
    /// Send the rendered template as plain text.
    #[default]
    #[serde(rename = "plain")]
    Plain,
    #[serde(rename = "HTML")]
    Html,
    Markdown,
    /// Strict markup; template inputs are escaped before rendering.
    MarkdownV2,
}

/// The Telegram view of a notification settings record.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramSettings {
    #[serde(rename = "telegramServerUrl", default)]
    pub server_url: Option<String>,
    #[serde(rename = "telegramBotToken")]
    pub bot_token: String,
    #[serde(rename = "telegramChatID")]
    pub chat_id: TelegramId,
    #[serde(rename = "telegramMessageThreadID", default)]
    pub message_thread_id: Option<TelegramId>,
    #[serde(rename = "telegramSendSilently", default)]
    pub send_silently: Option<bool>,
    #[serde(rename = "telegramProtectContent", default)]
    pub protect_content: Option<bool>,
    #[serde(rename = "telegramUseTemplate", default)]
    pub use_template: Option<bool>,
    #[serde(rename = "telegramTemplate", default)]
    pub template: Option<String>,
    #[serde(rename = "telegramTemplateParseMode", default)]
    pub template_parse_mode: Option<ParseMode>,
}

impl TelegramSettings {
    pub fn from_record(record: &NotificationSettings) -> Result<Self> {
        serde_json::from_value(Value::Object(record.clone()))
            .map_err(|e| NotifyError::Config(format!("telegram: {}", e)))
    }

    /// Configured server URL, or the public Bot API when unset or empty.
    pub fn effective_server_url(&self) -> &str {
        match self.server_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => DEFAULT_SERVER_URL,
        }
    }

    pub fn parse_mode(&self) -> ParseMode {
        self.template_parse_mode.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkPreviewOptions {
    pub is_disabled: bool,
}

/// Body of a `sendMessage` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendMessageParams {
    pub chat_id: TelegramId,
    pub text: String,
    pub disable_notification: bool,
    pub protect_content: bool,
    pub link_preview_options: LinkPreviewOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<TelegramId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
}

/// Assemble the request for one message.
pub fn build_params(
    settings: &TelegramSettings,
    msg: &Value,
    monitor: Option<&Value>,
    heartbeat: Option<&Value>,
) -> Result<SendMessageParams> {
    let mut params = SendMessageParams {
        chat_id: settings.chat_id.clone(),
        text: message_text(msg),
        disable_notification: settings.send_silently.unwrap_or(false),
        protect_content: settings.protect_content.unwrap_or(false),
        link_preview_options: LinkPreviewOptions { is_disabled: true },
        message_thread_id: settings
            .message_thread_id
            .clone()
            .filter(TelegramId::is_set),
        parse_mode: None,
    };

    if settings.use_template.unwrap_or(false) {
        let template = settings.template.as_deref().ok_or_else(|| {
            NotifyError::Render("templating is enabled but no template is configured".to_string())
        })?;
        let mode = settings.parse_mode();

        let ctx = if mode == ParseMode::MarkdownV2 {
            let msg = Value::String(escape_markdown_v2(&message_text(msg)));
            let monitor = monitor.map(escape_value);
            let heartbeat = heartbeat.map(escape_value);
            TemplateContext::new(&msg, monitor.as_ref(), heartbeat.as_ref())
        } else {
            TemplateContext::new(msg, monitor, heartbeat)
        };

        params.text = template::render(template, &ctx)?;

        if mode != ParseMode::Plain {
            params.parse_mode = Some(mode);
        }
    }

    Ok(params)
}

/// Text form of a message; non-string payloads are serialized as JSON.
fn message_text(msg: &Value) -> String {
    match msg {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Telegram Bot API channel.
pub struct Telegram {
    transport: Arc<dyn Transport>,
}

impl Telegram {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait::async_trait]
impl NotificationProvider for Telegram {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(
        &self,
        notification: &NotificationSettings,
        msg: &Value,
        monitor: Option<&Value>,
        heartbeat: Option<&Value>,
    ) -> Result<String> {
        let settings = TelegramSettings::from_record(notification)?;
        let server_url = settings.effective_server_url();
        let url = format!("{}/bot{}/sendMessage", server_url, settings.bot_token);

        let params = build_params(&settings, msg, monitor, heartbeat)?;
        let body = serde_json::to_value(&params)?;

        debug!(
            "Sending Telegram message to chat {} via {}",
            params.chat_id, server_url
        );

        if let Err(failure) = self.transport.post_json(&url, &body).await {
            let err = translate_transport_error(failure);
            warn!("Telegram sendMessage to chat {} failed: {}", params.chat_id, err);
            return Err(err);
        }

        info!("Telegram message sent to chat {}", params.chat_id);
        Ok(SENT_OK.to_string())
    }
}
