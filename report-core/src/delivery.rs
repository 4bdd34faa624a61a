use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::{error, info};

use crate::error::{DeliveryError, truncate_body};

/// Sends the finished text somewhere a person will read it.
#[async_trait]
pub trait Messenger: Send + Sync + Debug {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError>;
}

/// Telegram Bot API `sendMessage`.
#[derive(Clone)]
pub struct TelegramMessenger {
    http: Client,
    base_url: String,
    token: String,
}

impl Debug for TelegramMessenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramMessenger")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TelegramMessenger {
    pub fn new(http: Client, base_url: String, token: String) -> Self {
        Self { http, base_url: base_url.trim_end_matches('/').to_string(), token }
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct TelegramReply {
    ok: bool,
    description: Option<String>,
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let payload = SendMessage { chat_id, text, parse_mode: "Markdown" };

        // The URL carries the bot token, keep it out of errors.
        let res = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url()))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| DeliveryError::Transport(e.without_url()))?;

        if !status.is_success() {
            error!(%status, "Telegram send failed");
            return Err(DeliveryError::Status { status, body: truncate_body(&body) });
        }

        let reply: TelegramReply = serde_json::from_str(&body)
            .map_err(|e| DeliveryError::Rejected(format!("unreadable reply: {e}")))?;

        if !reply.ok {
            let reason = reply.description.unwrap_or_else(|| "no description".to_string());
            error!(reason = %reason, "Telegram rejected the message");
            return Err(DeliveryError::Rejected(reason));
        }

        info!("Telegram message sent successfully");
        Ok(())
    }
}
