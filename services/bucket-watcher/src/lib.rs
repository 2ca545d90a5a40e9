//! Bucket Watcher Library
//!
//! Turns periodic market snapshots into a BTC / alts / stables allocation and
//! threshold alerts, with per-trigger cooldowns.

pub mod allocation;
pub mod api;
pub mod config;
pub mod cooldown;
pub mod engine;
pub mod journal;
pub mod notifier;
pub mod runner;
pub mod triggers;


// Re-export main types for convenience
pub use allocation::{allocate, Allocation, Phase};
pub use config::Settings;
pub use cooldown::{CooldownTracker, COOLDOWN_WINDOW_HOURS};
pub use engine::{TriggerEngine, TriggerResult};
pub use journal::{CsvJournal, JournalEntry, JournalError, JournalSink, JournalStats};
pub use notifier::{NotificationSink, TelegramConfig, TelegramNotifier};
pub use runner::{CycleReport, FileSnapshotSource, WatchError, WatchService};
pub use triggers::{Alert, TriggerCategory};
