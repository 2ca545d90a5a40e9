//! Trigger engine - one evaluation per refresh cycle

use crate::allocation::{Allocation, Phase};
use crate::cooldown::CooldownTracker;
use crate::journal::{JournalEntry, JournalSink};
use crate::notifier::NotificationSink;
use crate::triggers::{self, Alert, Readings, TriggerCategory};
use chrono::{DateTime, Utc};
use market_data::MetricSnapshot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one cycle: the allocation plus the alert text of every
/// trigger family that fired (absent = did not fire)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerResult {
    pub rotation: Option<String>,
    pub alt_season: Option<String>,
    /// Both funding legs joined with "; " when both fire
    pub funding: Option<String>,
    pub stablecoin: Option<String>,
    #[serde(rename = "macro")]
    pub macro_event: Option<String>,
    pub allocation: Allocation,
    pub phase: Phase,
    /// Allocation differs from the previous cycle's
    pub allocation_changed: bool,
}

impl TriggerResult {
    pub fn get(&self, category: TriggerCategory) -> Option<&str> {
        match category {
            TriggerCategory::Rotation => self.rotation.as_deref(),
            TriggerCategory::AltSeason => self.alt_season.as_deref(),
            TriggerCategory::Funding => self.funding.as_deref(),
            TriggerCategory::Stablecoin => self.stablecoin.as_deref(),
            TriggerCategory::Macro => self.macro_event.as_deref(),
        }
    }

    /// Trigger families that fired, in reporting order
    pub fn fired(&self) -> Vec<TriggerCategory> {
        TriggerCategory::ALL
            .into_iter()
            .filter(|c| self.get(*c).is_some())
            .collect()
    }
}

/// Owns cooldown state and the last allocation; not safe for concurrent
/// evaluation, callers serialize access.
pub struct TriggerEngine {
    cooldowns: CooldownTracker,
    last_allocation: Option<Allocation>,
    notifier: Arc<dyn NotificationSink>,
    journal: Arc<dyn JournalSink>,
}

impl TriggerEngine {
    pub fn new(notifier: Arc<dyn NotificationSink>, journal: Arc<dyn JournalSink>) -> Self {
        Self {
            cooldowns: CooldownTracker::new(),
            last_allocation: None,
            notifier,
            journal,
        }
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    pub fn last_allocation(&self) -> Option<Allocation> {
        self.last_allocation
    }

    /// Evaluate against the wall clock
    pub async fn evaluate(&mut self, snapshot: &MetricSnapshot) -> TriggerResult {
        self.evaluate_at(snapshot, Utc::now()).await
    }

    /// Evaluate every trigger and the allocation as of `now`
    pub async fn evaluate_at(
        &mut self,
        snapshot: &MetricSnapshot,
        now: DateTime<Utc>,
    ) -> TriggerResult {
        let readings = Readings::from_snapshot(snapshot);

        let rotation = triggers::check_rotation(&readings, &mut self.cooldowns, now);
        let rotation = self.deliver_one(rotation).await;

        let alt_season = triggers::check_alt_season(&readings, &mut self.cooldowns, now);
        let alt_season = self.deliver_one(alt_season).await;

        let funding = triggers::check_funding(&readings, &mut self.cooldowns, now);
        let funding = self.deliver_all(funding).await;

        let stablecoin = triggers::check_stablecoin(&readings, &mut self.cooldowns, now);
        let stablecoin = self.deliver_one(stablecoin).await;

        let macro_event = triggers::check_macro(&readings, &mut self.cooldowns, now);
        let macro_event = self.deliver_one(macro_event).await;

        let phase = Phase::classify(readings.btc_dominance, readings.alt_season_index);
        let allocation = phase.allocation();

        // Not subject to any cooldown
        let previous = self.last_allocation.replace(allocation);
        let allocation_changed = match previous {
            Some(prev) if prev != allocation => {
                self.announce_allocation(prev, allocation).await;
                true
            }
            _ => false,
        };

        let result = TriggerResult {
            rotation,
            alt_season,
            funding,
            stablecoin,
            macro_event,
            allocation,
            phase,
            allocation_changed,
        };

        info!(
            "Cycle evaluated: {} ({:.0}/{:.0}/{:.0}), fired: {:?}",
            phase.as_str(),
            allocation.btc * 100.0,
            allocation.alt * 100.0,
            allocation.stable * 100.0,
            result.fired().iter().map(|c| c.as_str()).collect::<Vec<_>>()
        );

        result
    }

    async fn deliver_one(&self, alert: Option<Alert>) -> Option<String> {
        let alert = alert?;
        self.deliver(&alert.message, &alert.journal).await;
        info!(trigger = %alert.key, category = alert.category.as_str(), "Trigger fired");
        Some(alert.message)
    }

    async fn deliver_all(&self, alerts: Vec<Alert>) -> Option<String> {
        let mut messages = Vec::with_capacity(alerts.len());
        for alert in alerts {
            if let Some(message) = self.deliver_one(Some(alert)).await {
                messages.push(message);
            }
        }
        (!messages.is_empty()).then(|| messages.join("; "))
    }

    async fn announce_allocation(&self, previous: Allocation, current: Allocation) {
        let message = format!(
            "📊 *Allocation Update*\nBTC: {:.0}% | ALTS: {:.0}% | STABLES: {:.0}%",
            current.btc * 100.0,
            current.alt * 100.0,
            current.stable * 100.0
        );
        let btc_change = (current.btc - previous.btc) * 100.0;
        let entry = JournalEntry::new("ALLOCATION", btc_change, "Auto allocation update", "📊");

        self.deliver(&message, &entry).await;
        info!("Allocation changed: BTC {:+.1} pts", btc_change);
    }

    /// Sink failures are logged and dropped; they never abort the cycle
    async fn deliver(&self, message: &str, entry: &JournalEntry) {
        if !self.notifier.send(message).await {
            debug!("Notification not delivered");
        }

        if let Err(e) = self.journal.append(entry).await {
            warn!("Journal append failed for {}: {}", entry.asset, e);
        }
    }
}
