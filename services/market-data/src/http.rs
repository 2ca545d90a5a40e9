//! Shared HTTP plumbing: one client, bounded retries with exponential backoff

use crate::types::*;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::warn;

/// Retry schedule for upstream requests
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Delay before the second attempt; doubles after every failure
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts (tests, one-shot tools)
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            base_delay: Duration::ZERO,
        }
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// HTTP client wrapper shared by every market data source
#[derive(Clone)]
pub struct RetryingClient {
    client: Client,
    policy: RetryPolicy,
}

impl RetryingClient {
    /// Per-request timeout
    const REQUEST_TIMEOUT_SECS: u64 = 10;

    pub fn new(policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(Self::REQUEST_TIMEOUT_SECS))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;

        Ok(Self { client, policy })
    }

    /// GET and decode a JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<T> {
        self.with_retries(url, || {
            let mut req = self.client.get(url).query(query);
            for (name, value) in headers {
                req = req.header(*name, *value);
            }
            req
        })
        .await?
        .json::<T>()
        .await
        .map_err(|e| MarketDataError::InvalidResponse(e.to_string()))
    }

    /// POST a JSON body and decode a JSON response
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        self.with_retries(url, || self.client.post(url).json(body))
            .await?
            .json::<T>()
            .await
            .map_err(|e| MarketDataError::InvalidResponse(e.to_string()))
    }

    /// GET a plain text body (CSV feeds)
    pub async fn get_text(&self, url: &str) -> Result<String> {
        Ok(self.with_retries(url, || self.client.get(url)).await?.text().await?)
    }

    async fn with_retries<F>(&self, url: &str, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let attempts = self.policy.attempts.max(1);

        for attempt in 0..attempts {
            let outcome = match build().send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) => MarketDataError::Status {
                    url: url.to_string(),
                    status: resp.status().as_u16(),
                },
                Err(e) => MarketDataError::Http(e),
            };

            warn!("Request failed (attempt {}/{}): {}", attempt + 1, attempts, outcome);

            if attempt + 1 < attempts {
                tokio::time::sleep(self.policy.delay_after(attempt)).await;
            }
        }

        Err(MarketDataError::RetriesExhausted {
            url: url.to_string(),
            attempts,
        })
    }
}
