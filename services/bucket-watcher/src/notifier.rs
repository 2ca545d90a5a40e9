//! Alert delivery to a Telegram chat

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

/// Where fired triggers push their alert text.
///
/// The returned flag is advisory; callers never treat `false` as an error.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, text: &str) -> bool;
}

/// Telegram bot configuration
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base_url: "https://api.telegram.org".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Sends Markdown alerts through the Telegram Bot API
#[derive(Clone)]
pub struct TelegramNotifier {
    config: TelegramConfig,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.config.bot_token, &self.config.chat_id) {
            (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => {
                Some((token.as_str(), chat.as_str()))
            }
            _ => None,
        }
    }

    async fn send_message(&self, token: &str, chat_id: &str, text: &str) -> anyhow::Result<()> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.api_base_url.trim_end_matches('/'),
            token
        );

        let payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        let response = self.client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Telegram API error: {} - {}", status, body));
        }

        debug!("Telegram message sent");
        Ok(())
    }
}

#[async_trait::async_trait]
impl NotificationSink for TelegramNotifier {
    async fn send(&self, text: &str) -> bool {
        let Some((token, chat_id)) = self.credentials() else {
            info!("Telegram alert (no bot configured): {}", text);
            return false;
        };

        match self.send_message(token, chat_id, text).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to send Telegram message: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notifier(server: &MockServer) -> TelegramNotifier {
        TelegramNotifier::new(TelegramConfig {
            bot_token: Some("123:abc".to_string()),
            chat_id: Some("-1001".to_string()),
            api_base_url: server.uri(),
            timeout_secs: 2,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_unconfigured_does_not_send() {
        let notifier = TelegramNotifier::new(TelegramConfig::default()).unwrap();
        assert!(!notifier.is_configured());
        assert!(!notifier.send("hello").await);
    }

    #[tokio::test]
    async fn test_sends_markdown_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": "-1001",
                "text": "🚀 *Full alt-season (≥ 75)*",
                "parse_mode": "Markdown"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        assert!(notifier(&server).send("🚀 *Full alt-season (≥ 75)*").await);
    }

    #[tokio::test]
    async fn test_api_error_reports_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad markdown"))
            .mount(&server)
            .await;

        assert!(!notifier(&server).send("*broken").await);
    }
}
