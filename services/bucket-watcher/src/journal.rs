//! Append-only trade decision journal

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::debug;

const HEADER: [&str; 5] = ["date", "asset", "change_pct", "reason", "emotion"];

/// One decision record, as produced by a fired trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub asset: String,
    pub change_pct: f64,
    pub reason: String,
    pub emotion: String,
}

impl JournalEntry {
    pub fn new(asset: &str, change_pct: f64, reason: impl Into<String>, emotion: &str) -> Self {
        Self {
            asset: asset.to_string(),
            change_pct,
            reason: reason.into(),
            emotion: emotion.to_string(),
        }
    }
}

/// Journal record as read back from disk.
///
/// `change_pct` stays text: hand-edited rows are tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub date: String,
    pub asset: String,
    pub change_pct: String,
    pub reason: String,
    pub emotion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalStats {
    pub total_entries: usize,
    pub total_changes: f64,
    pub avg_change: f64,
    pub last_entry: Option<JournalRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("journal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("journal writer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Where fired triggers record their decisions
#[async_trait::async_trait]
pub trait JournalSink: Send + Sync {
    async fn append(&self, entry: &JournalEntry) -> Result<(), JournalError>;
}

/// CSV file journal
#[derive(Debug, Clone)]
pub struct CsvJournal {
    path: PathBuf,
}

impl CsvJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with its header row if it does not exist yet
    pub fn ensure_exists(&self) -> Result<(), JournalError> {
        if self.path.exists() {
            return Ok(());
        }
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(())
    }

    fn append_row(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        self.ensure_exists()?;

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let date = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let change = entry.change_pct.to_string();
        writer.write_record([
            date.as_str(),
            entry.asset.as_str(),
            change.as_str(),
            entry.reason.as_str(),
            entry.emotion.as_str(),
        ])?;
        writer.flush()?;

        debug!("Journal: {} {} ({})", entry.asset, entry.change_pct, entry.reason);
        Ok(())
    }

    /// All records, or only the most recent `limit`. A missing file reads as empty.
    pub fn read(&self, limit: Option<usize>) -> Result<Vec<JournalRecord>, JournalError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut records = reader
            .deserialize::<JournalRecord>()
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(limit) = limit.filter(|l| *l > 0) {
            let skip = records.len().saturating_sub(limit);
            records.drain(..skip);
        }

        Ok(records)
    }

    pub fn stats(&self) -> Result<JournalStats, JournalError> {
        let records = self.read(None)?;

        let changes: Vec<f64> = records
            .iter()
            .filter_map(|r| r.change_pct.trim().parse::<f64>().ok())
            .collect();
        let total_changes: f64 = changes.iter().sum();
        let avg_change = if changes.is_empty() {
            0.0
        } else {
            total_changes / changes.len() as f64
        };

        Ok(JournalStats {
            total_entries: records.len(),
            total_changes,
            avg_change,
            last_entry: records.last().cloned(),
        })
    }
}

#[async_trait::async_trait]
impl JournalSink for CsvJournal {
    /// File and CSV writes are blocking, so they run on the blocking pool
    async fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        let journal = self.clone();
        let entry = entry.clone();
        tokio::task::spawn_blocking(move || journal.append_row(&entry)).await?
    }
}
