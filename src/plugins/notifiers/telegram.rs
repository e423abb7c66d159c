use crate::config::TelegramConfig;
use crate::plugins::traits::{NotificationResult, Notifier};
use crate::utils::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
    result: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    message_id: i64,
}

/// Sends Markdown messages through the Telegram Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
}

impl TelegramNotifier {
    pub fn new(api_base: impl Into<String>, bot_token: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(TelegramNotifier {
            client,
            api_base: api_base.into(),
            bot_token: bot_token.into(),
        })
    }

    pub fn from_config(config: &TelegramConfig) -> Result<Self, AppError> {
        Self::new(config.api_base.clone(), config.bot_token.clone().unwrap_or_default())
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, destination: &str, text: &str) -> Result<NotificationResult, AppError> {
        let response = self
            .client
            .get(self.endpoint())
            .query(&[
                ("chat_id", destination),
                ("text", text),
                ("parse_mode", "Markdown"),
            ])
            .send()
            .await?;

        let status = response.status();
        // Telegram answers errors with a JSON body too; fall back to the status line.
        let body = response.json::<TelegramResponse>().await.ok();

        match body {
            Some(body) if status.is_success() && body.ok => {
                tracing::info!("Telegram notification sent to chat ID {}", destination);
                Ok(NotificationResult::delivered(
                    body.result.map(|m| m.message_id.to_string()),
                ))
            }
            Some(body) => Ok(NotificationResult::failed(
                body.description.unwrap_or_else(|| status.to_string()),
            )),
            None => Ok(NotificationResult::failed(status.to_string())),
        }
    }
}
