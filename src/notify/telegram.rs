use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::config::Telegram;
use crate::error::NotifyError;

use super::Notifier;

const API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Sends messages through the Telegram Bot API with MarkdownV2 parsing.
pub struct TelegramNotifier {
    client: Client,
    bot_token: SecretString,
    chat_id: String,
}

// telegram wraps every response in {ok, description?, ...}
#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(telegram: &Telegram) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(NotifyError::Transport)?;

        Ok(TelegramNotifier {
            client,
            bot_token: telegram.bot_token.clone(),
            chat_id: telegram.chat_id.clone(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!(
            "{API_BASE}/bot{}/sendMessage",
            self.bot_token.expose_secret()
        );

        let body = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "MarkdownV2",
        });

        // the request url embeds the bot token, strip it from any
        // error before it reaches a log line
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url()))?;

        let status = response.status();
        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url()))?;

        if !parsed.ok {
            return Err(NotifyError::Rejected {
                description: parsed
                    .description
                    .unwrap_or_else(|| format!("telegram answered {status}")),
            });
        }

        Ok(())
    }
}
