//! Watcher configuration: built-in defaults overlaid by the environment

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::notifier::TelegramConfig;

/// 12 hours, matching the dashboard auto-refresh cadence
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 43_200;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Telegram bot token (`TG_TOKEN`)
    pub tg_token: Option<String>,
    /// Telegram chat id (`TG_CHAT`)
    pub tg_chat: Option<String>,
    pub coingecko_api_key: Option<String>,
    pub tradingecon_key: Option<String>,
    pub finnhub_key: Option<String>,
    pub journal_path: PathBuf,
    pub refresh_interval_secs: u64,
    pub http_port: u16,
    /// Evaluate a snapshot file instead of polling live sources
    pub snapshot_file: Option<PathBuf>,
    /// Single evaluation, print the result, exit
    pub run_once: bool,
}

impl Settings {
    /// Defaults only; callers add sources on top
    pub fn builder() -> anyhow::Result<ConfigBuilder<DefaultState>> {
        Ok(config::Config::builder()
            .set_default("journal_path", "trading_journal.csv")?
            .set_default("refresh_interval_secs", DEFAULT_REFRESH_INTERVAL_SECS as i64)?
            .set_default("http_port", 8080)?
            .set_default("run_once", false)?)
    }

    /// Defaults overlaid by process environment (after `.env`, if present)
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let settings = Self::builder()?
            .add_source(Environment::default())
            .build()?
            .try_deserialize::<Settings>()?;

        if settings.refresh_interval_secs == 0 {
            return Err(anyhow::anyhow!("REFRESH_INTERVAL_SECS must be positive"));
        }

        Ok(settings)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn telegram(&self) -> TelegramConfig {
        TelegramConfig {
            bot_token: self.tg_token.clone(),
            chat_id: self.tg_chat.clone(),
            ..TelegramConfig::default()
        }
    }

    pub fn market_data(&self) -> market_data::MarketDataConfig {
        market_data::MarketDataConfig {
            coingecko_api_key: self.coingecko_api_key.clone(),
            tradingecon_key: self.tradingecon_key.clone(),
            finnhub_key: self.finnhub_key.clone(),
        }
    }
}
