//! Outbound notification sinks.
//!
//! The pipeline hands finished payloads to a [`NotificationSink`]. Telegram
//! is the production sink; [`LogNotifier`] is used for dry runs and when no
//! bot credentials are configured.

use std::num::NonZeroU32;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::TelegramConfig;

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Formatting mode the payload was written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    Markdown,
    Html,
    Plain,
}

impl ParseMode {
    fn telegram_name(self) -> Option<&'static str> {
        match self {
            Self::Markdown => Some("Markdown"),
            Self::Html => Some("HTML"),
            Self::Plain => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Refused before sending (e.g. over the size limit).
    Rejected { reason: String },
    Failed { reason: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, text: &str, mode: ParseMode) -> DeliveryOutcome;

    /// Largest payload the sink accepts, in UTF-16 code units.
    fn max_message_chars(&self) -> usize;

    fn name(&self) -> &str;
}

/// Telegram Bot API `sendMessage` client.
pub struct TelegramNotifier {
    http: reqwest::Client,
    api_base_url: String,
    bot_token: SecretString,
    chat_id: String,
    max_message_chars: usize,
    limiter: Limiter,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, bot_token: SecretString, chat_id: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create Telegram HTTP client")?;

        let per_second = NonZeroU32::new(config.messages_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bot_token,
            chat_id,
            max_message_chars: config.max_message_chars,
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn send(&self, text: &str, mode: ParseMode) -> DeliveryOutcome {
        // Telegram counts its limit in UTF-16 code units.
        let length = text.encode_utf16().count();
        if length > self.max_message_chars {
            return DeliveryOutcome::Rejected {
                reason: format!("payload of {length} units exceeds {}", self.max_message_chars),
            };
        }

        self.limiter.until_ready().await;

        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_base_url,
            self.bot_token.expose_secret()
        );
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: mode.telegram_name(),
            disable_web_page_preview: true,
        };

        match self.http.post(&url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => DeliveryOutcome::Delivered,
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(%status, body = %body, "Telegram sendMessage returned non-success status");
                DeliveryOutcome::Failed {
                    reason: format!("HTTP {status}"),
                }
            }
            // reqwest errors carry the URL, which contains the bot token.
            Err(e) => {
                let e = e.without_url();
                warn!(error = %e, "Failed to send Telegram message");
                DeliveryOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn max_message_chars(&self) -> usize {
        self.max_message_chars
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

/// Writes payloads to the log instead of sending them.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn send(&self, text: &str, mode: ParseMode) -> DeliveryOutcome {
        info!(?mode, chars = text.chars().count(), "Notification (not sent)\n{text}");
        DeliveryOutcome::Delivered
    }

    fn max_message_chars(&self) -> usize {
        usize::MAX
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TelegramConfig {
        TelegramConfig {
            enabled: true,
            api_base_url: "http://127.0.0.1:9".to_string(),
            max_message_chars: 10,
            messages_per_second: 1,
        }
    }

    #[tokio::test]
    async fn test_oversized_payload_rejected_without_sending() {
        let notifier =
            TelegramNotifier::new(&config(), SecretString::from("token"), "42".to_string()).unwrap();

        let outcome = notifier.send("this is far too long", ParseMode::Plain).await;

        assert!(matches!(outcome, DeliveryOutcome::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_size_limit_counts_utf16_units() {
        let notifier =
            TelegramNotifier::new(&config(), SecretString::from("token"), "42".to_string()).unwrap();

        // Six characters, twelve UTF-16 units.
        let outcome = notifier.send("📅📅📅📅📅📅", ParseMode::Plain).await;

        assert!(matches!(outcome, DeliveryOutcome::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_log_notifier_always_delivers() {
        let outcome = LogNotifier.send("hello", ParseMode::Markdown).await;
        assert!(outcome.is_delivered());
    }

    #[test]
    fn test_parse_mode_names() {
        assert_eq!(ParseMode::Markdown.telegram_name(), Some("Markdown"));
        assert_eq!(ParseMode::Plain.telegram_name(), None);
        let mode: ParseMode = serde_json::from_str("\"html\"").unwrap();
        assert_eq!(mode, ParseMode::Html);
    }
}
