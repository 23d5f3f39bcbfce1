//! Telegram and Discord alert delivery.
//!
//! Both channels are optional and delivery is best-effort: a failed send is
//! logged and never reaches the caller. Titles carry the severity emoji,
//! which also picks the Discord embed color.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::json;

use crate::config::AlertsSection;
use crate::ports::AlertSink;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const COLOR_RED: u32 = 0xff0000;
const COLOR_GREEN: u32 = 0x00ff00;
const COLOR_BLUE: u32 = 0x0099ff;

pub struct WebhookAlerts {
    client: Client,
    telegram: Option<(String, String)>,
    discord_webhook_url: Option<String>,
}

impl WebhookAlerts {
    /// Build the sink from configuration. Returns `None` when no channel is
    /// configured so the caller can fall back to a null sink.
    pub fn from_config(config: &AlertsSection) -> Option<Self> {
        let telegram = match (&config.telegram_bot_token, &config.telegram_chat_id) {
            (Some(token), Some(chat_id)) => {
                tracing::info!("Telegram alerts enabled");
                Some((token.clone(), chat_id.clone()))
            }
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!("Telegram needs both TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID");
                None
            }
            (None, None) => None,
        };

        let discord_webhook_url = config.discord_webhook_url.clone();
        if discord_webhook_url.is_some() {
            tracing::info!("Discord alerts enabled");
        }

        if telegram.is_none() && discord_webhook_url.is_none() {
            return None;
        }

        let client = Client::builder().timeout(HTTP_TIMEOUT).build().ok()?;
        Some(Self {
            client,
            telegram,
            discord_webhook_url,
        })
    }

    async fn send_telegram(&self, token: &str, chat_id: &str, text: &str) {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", token);
        let result = self
            .client
            .post(&url)
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .and_then(|r| r.error_for_status());
        if let Err(e) = result {
            tracing::warn!("Telegram alert failed: {}", e);
        }
    }

    async fn send_discord(&self, webhook_url: &str, title: &str, body: &str, timestamp: &str) {
        let payload = json!({
            "embeds": [{
                "title": title,
                "description": body,
                "timestamp": timestamp,
                "color": embed_color(title),
            }]
        });
        let result = self
            .client
            .post(webhook_url)
            .json(&payload)
            .send()
            .await
            .and_then(|r| r.error_for_status());
        if let Err(e) = result {
            tracing::warn!("Discord alert failed: {}", e);
        }
    }
}

#[async_trait]
impl AlertSink for WebhookAlerts {
    async fn send(&self, title: &str, body: &str) {
        let timestamp = Utc::now().to_rfc3339();
        tracing::info!("Alert: {}", title);

        if let Some((token, chat_id)) = &self.telegram {
            let text = format!("[{}]\n{}\n\n{}", timestamp, title, body);
            self.send_telegram(token, chat_id, &text).await;
        }

        if let Some(webhook_url) = &self.discord_webhook_url {
            self.send_discord(webhook_url, title, body, &timestamp).await;
        }
    }
}

fn embed_color(title: &str) -> u32 {
    if title.contains("🛑") || title.contains("🔴") {
        COLOR_RED
    } else if title.contains("✅") || title.contains("🟢") {
        COLOR_GREEN
    } else {
        COLOR_BLUE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_channels_yields_none() {
        assert!(WebhookAlerts::from_config(&AlertsSection::default()).is_none());
    }

    #[test]
    fn test_partial_telegram_config_is_not_a_channel() {
        let config = AlertsSection {
            telegram_bot_token: Some("token".to_string()),
            telegram_chat_id: None,
            discord_webhook_url: None,
        };
        assert!(WebhookAlerts::from_config(&config).is_none());
    }

    #[test]
    fn test_discord_only_is_enough() {
        let config = AlertsSection {
            telegram_bot_token: None,
            telegram_chat_id: None,
            discord_webhook_url: Some("https://discord.com/api/webhooks/x/y".to_string()),
        };
        let alerts = WebhookAlerts::from_config(&config).unwrap();
        assert!(alerts.telegram.is_none());
        assert!(alerts.discord_webhook_url.is_some());
    }

    #[test]
    fn test_embed_colors_follow_severity() {
        assert_eq!(embed_color("🛑 PORTFOLIO STOP-LOSS TRIGGERED"), COLOR_RED);
        assert_eq!(embed_color("🔴 Stop Loss: BONK"), COLOR_RED);
        assert_eq!(embed_color("✅ Position Opened: WIF"), COLOR_GREEN);
        assert_eq!(embed_color("🟢 Take Profit: WIF"), COLOR_GREEN);
        assert_eq!(embed_color("Heartbeat"), COLOR_BLUE);
    }
}
