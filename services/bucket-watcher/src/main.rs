//! Bucket Watcher - three-bucket allocation monitor
//!
//! 1. Polls market data (or reads a snapshot file)
//! 2. Derives the BTC / alts / stables allocation
//! 3. Fires Telegram alerts and journal entries on threshold crossings
//! 4. Serves the latest cycle over a small JSON API

use std::sync::Arc;
use tracing::{info, warn};

use bucket_watcher::api::{self, AppState};
use bucket_watcher::{
    CsvJournal, FileSnapshotSource, Settings, TelegramNotifier, TriggerEngine, WatchService,
};
use market_data::{MarketDataClient, RetryPolicy, SnapshotSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting Bucket Watcher...");

    let settings = Settings::load()?;

    let notifier = TelegramNotifier::new(settings.telegram())?;
    if !notifier.is_configured() {
        warn!("TG_TOKEN / TG_CHAT not set, alerts will only be logged");
    }

    let journal = CsvJournal::new(&settings.journal_path);
    journal.ensure_exists()?;
    match journal.stats() {
        Ok(stats) => info!(
            "Journal {}: {} entries, avg change {:.1}",
            journal.path().display(),
            stats.total_entries,
            stats.avg_change
        ),
        Err(e) => warn!("Journal unreadable: {}", e),
    }

    let source: Arc<dyn SnapshotSource> = match &settings.snapshot_file {
        Some(path) => {
            info!("Using snapshot file {}", path.display());
            Arc::new(FileSnapshotSource::new(path))
        }
        None => Arc::new(MarketDataClient::new(
            settings.market_data(),
            RetryPolicy::default(),
        )?),
    };

    let engine = TriggerEngine::new(Arc::new(notifier), Arc::new(journal.clone()));
    let service = Arc::new(WatchService::new(source, engine));

    if settings.run_once {
        let report = service.refresh().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    tokio::spawn(Arc::clone(&service).run(settings.refresh_interval()));

    let app = api::router(Arc::new(AppState { service, journal }));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", settings.http_port)).await?;
    info!("Status API listening on port {}", settings.http_port);

    axum::serve(listener, app).await?;

    Ok(())
}
