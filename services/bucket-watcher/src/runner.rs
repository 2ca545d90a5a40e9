//! Refresh loop: fetch a snapshot, evaluate, keep the latest report

use crate::engine::{TriggerEngine, TriggerResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use market_data::{MarketDataError, MetricSnapshot, SnapshotSource};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("snapshot source {source_name} failed: {error}")]
    Source {
        source_name: String,
        #[source]
        error: MarketDataError,
    },
}

/// What one refresh saw and decided
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub snapshot: MetricSnapshot,
    pub result: TriggerResult,
    pub evaluated_at: DateTime<Utc>,
}

/// Reads a JSON snapshot from disk on every cycle
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    async fn fetch_snapshot(&self) -> market_data::Result<MetricSnapshot> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        serde_json::from_str(&raw).map_err(|e| MarketDataError::InvalidResponse(e.to_string()))
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Serializes every evaluation path (timer and manual refresh) through one
/// lock around the engine
pub struct WatchService {
    source: Arc<dyn SnapshotSource>,
    engine: Mutex<TriggerEngine>,
    latest: RwLock<Option<CycleReport>>,
}

impl WatchService {
    pub fn new(source: Arc<dyn SnapshotSource>, engine: TriggerEngine) -> Self {
        Self {
            source,
            engine: Mutex::new(engine),
            latest: RwLock::new(None),
        }
    }

    /// Most recent successful cycle, if any
    pub async fn latest(&self) -> Option<CycleReport> {
        self.latest.read().await.clone()
    }

    /// Run one full cycle now
    pub async fn refresh(&self) -> Result<CycleReport, WatchError> {
        let mut engine = self.engine.lock().await;

        let snapshot = self.source.fetch_snapshot().await.map_err(|error| {
            warn!("Snapshot source {} failed: {}", self.source.name(), error);
            WatchError::Source {
                source_name: self.source.name().to_string(),
                error,
            }
        })?;

        let result = engine.evaluate(&snapshot).await;
        let report = CycleReport {
            snapshot,
            result,
            evaluated_at: Utc::now(),
        };

        *self.latest.write().await = Some(report.clone());
        Ok(report)
    }

    /// Refresh forever on a fixed cadence. The first cycle runs immediately.
    pub async fn run(self: Arc<Self>, every: Duration) {
        info!("Refresh loop started, every {}s", every.as_secs());

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh().await {
                error!("Refresh cycle error: {}", e);
            }
        }
    }
}
