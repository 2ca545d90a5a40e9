//! Trigger conditions over a metric snapshot.
//!
//! Each check consults the cooldown tracker, records the fire itself and
//! hands back an `Alert` carrying the notification text and journal entry.
//! Delivery is the engine's job.

use crate::allocation::{DEFAULT_ALT_SEASON_INDEX, DEFAULT_BTC_DOMINANCE};
use crate::cooldown::CooldownTracker;
use crate::journal::JournalEntry;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use market_data::{MacroEvent, MetricSnapshot};
use serde::{Deserialize, Serialize};

pub const ROTATION_BTC_DOMINANCE_BELOW: f64 = 60.0;
pub const ROTATION_ALT_INDEX_ABOVE: f64 = 50.0;
pub const FULL_ALT_SEASON_INDEX: f64 = 75.0;
pub const ALT_SEASON_END_INDEX: f64 = 25.0;
/// Absolute funding rate, percent per 8h
pub const CROWDED_FUNDING_RATE: f64 = 0.10;
pub const STABLECOIN_ISSUANCE_USD: f64 = 1_000_000_000.0;
/// How close to a macro event (either side) counts as "in play"
pub const MACRO_WINDOW_HOURS: i64 = 12;

const MACRO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Trigger families reported in a cycle result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCategory {
    Rotation,
    AltSeason,
    Funding,
    Stablecoin,
    Macro,
}

impl TriggerCategory {
    pub const ALL: [TriggerCategory; 5] = [
        TriggerCategory::Rotation,
        TriggerCategory::AltSeason,
        TriggerCategory::Funding,
        TriggerCategory::Stablecoin,
        TriggerCategory::Macro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerCategory::Rotation => "rotation",
            TriggerCategory::AltSeason => "alt_season",
            TriggerCategory::Funding => "funding",
            TriggerCategory::Stablecoin => "stablecoin",
            TriggerCategory::Macro => "macro",
        }
    }
}

/// A trigger that fired this cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub category: TriggerCategory,
    /// Cooldown key that was recorded
    pub key: String,
    pub message: String,
    pub journal: JournalEntry,
}

/// Snapshot values with defaults applied for anything missing
#[derive(Debug, Clone)]
pub struct Readings<'a> {
    pub btc_dominance: f64,
    pub alt_season_index: f64,
    pub btc_funding_rate: f64,
    pub hype_funding_rate: f64,
    pub stablecoin_delta: f64,
    pub macro_events: &'a [MacroEvent],
}

impl<'a> Readings<'a> {
    pub fn from_snapshot(snapshot: &'a MetricSnapshot) -> Self {
        Self {
            btc_dominance: snapshot.btc_dominance.unwrap_or(DEFAULT_BTC_DOMINANCE),
            alt_season_index: snapshot.alt_season_index.unwrap_or(DEFAULT_ALT_SEASON_INDEX),
            btc_funding_rate: snapshot.btc_funding_rate.unwrap_or(0.0),
            hype_funding_rate: snapshot.hype_funding_rate.unwrap_or(0.0),
            stablecoin_delta: snapshot.stablecoin_delta.unwrap_or(0.0),
            macro_events: &snapshot.macro_events,
        }
    }
}

fn fire(
    cooldowns: &mut CooldownTracker,
    now: DateTime<Utc>,
    category: TriggerCategory,
    key: String,
    message: String,
    journal: JournalEntry,
) -> Alert {
    cooldowns.record(&key, now);
    Alert {
        category,
        key,
        message,
        journal,
    }
}

/// BTC dominance slipping while alts gain momentum
pub fn check_rotation(
    readings: &Readings<'_>,
    cooldowns: &mut CooldownTracker,
    now: DateTime<Utc>,
) -> Option<Alert> {
    let key = "rotation";
    let condition = readings.btc_dominance < ROTATION_BTC_DOMINANCE_BELOW
        && readings.alt_season_index > ROTATION_ALT_INDEX_ABOVE;

    if !condition || !cooldowns.eligible(key, now) {
        return None;
    }

    Some(fire(
        cooldowns,
        now,
        TriggerCategory::Rotation,
        key.to_string(),
        format!(
            "🔄 *BTC.D < 60% & alt momentum ↑* – start rotation.\nBTC Dom: {:.1}% | Alt Index: {:.1}",
            readings.btc_dominance, readings.alt_season_index
        ),
        JournalEntry::new("ROTATION", -10.0, "BTC.D <60, rotate", "😐"),
    ))
}

/// Alt season at full strength, or over. Never both in one cycle.
pub fn check_alt_season(
    readings: &Readings<'_>,
    cooldowns: &mut CooldownTracker,
    now: DateTime<Utc>,
) -> Option<Alert> {
    let index = readings.alt_season_index;

    if index >= FULL_ALT_SEASON_INDEX {
        let key = "alt_season_full";
        if !cooldowns.eligible(key, now) {
            return None;
        }
        return Some(fire(
            cooldowns,
            now,
            TriggerCategory::AltSeason,
            key.to_string(),
            format!("🚀 *Full alt-season (≥ 75)*\nAlt Index: {:.1}", index),
            JournalEntry::new("ALTS", 25.0, "Full alt-season", "🚀"),
        ));
    }

    if index <= ALT_SEASON_END_INDEX {
        let key = "alt_season_end";
        if !cooldowns.eligible(key, now) {
            return None;
        }
        return Some(fire(
            cooldowns,
            now,
            TriggerCategory::AltSeason,
            key.to_string(),
            format!("📉 *Back to BTC dominance*\nAlt Index: {:.1}", index),
            JournalEntry::new("BTC", 20.0, "Back to BTC dominance", "📉"),
        ));
    }

    None
}

/// Crowded leverage on BTC and HYPE perps, checked independently
pub fn check_funding(
    readings: &Readings<'_>,
    cooldowns: &mut CooldownTracker,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let legs = [
        ("funding_btc", "BTC", readings.btc_funding_rate),
        ("funding_hype", "HYPE", readings.hype_funding_rate),
    ];

    let mut alerts = Vec::new();
    for (key, asset, rate) in legs {
        if rate.abs() < CROWDED_FUNDING_RATE || !cooldowns.eligible(key, now) {
            continue;
        }
        alerts.push(fire(
            cooldowns,
            now,
            TriggerCategory::Funding,
            key.to_string(),
            format!("⚠️ *Crowded leverage: {}*\nFunding: {:.3}%/8h", asset, rate),
            JournalEntry::new(
                asset,
                -20.0,
                format!("Crowded leverage: {}. Funding {:.3}%", asset, rate),
                "⚠️",
            ),
        ));
    }
    alerts
}

/// Large weekly stablecoin minting
pub fn check_stablecoin(
    readings: &Readings<'_>,
    cooldowns: &mut CooldownTracker,
    now: DateTime<Utc>,
) -> Option<Alert> {
    let key = "stablecoin_issuance";
    if readings.stablecoin_delta < STABLECOIN_ISSUANCE_USD || !cooldowns.eligible(key, now) {
        return None;
    }

    Some(fire(
        cooldowns,
        now,
        TriggerCategory::Stablecoin,
        key.to_string(),
        format!(
            "💰 *New stable-coin issuance – ammo loaded*\n7d Change: ${:.1}B",
            readings.stablecoin_delta / 1e9
        ),
        JournalEntry::new("STABLES", 10.0, "New stable-coin issuance", "💰"),
    ))
}

/// First upcoming macro event within the window of `now`.
///
/// Events with unparseable dates are skipped. Each event name has its own
/// cooldown key, so two events on one day fire independently.
pub fn check_macro(
    readings: &Readings<'_>,
    cooldowns: &mut CooldownTracker,
    now: DateTime<Utc>,
) -> Option<Alert> {
    let window = Duration::hours(MACRO_WINDOW_HOURS);

    for event in readings.macro_events {
        let Some(event_time) = parse_event_date(&event.date) else {
            continue;
        };

        let distance = (event_time - now).abs();
        let key = macro_key(&event.event);

        if distance <= window && cooldowns.eligible(&key, now) {
            return Some(fire(
                cooldowns,
                now,
                TriggerCategory::Macro,
                key,
                format!("📅 *Macro in play: {}*\nDate: {}", event.event, event.date),
                JournalEntry::new("CASH", 0.0, format!("Macro in play: {}", event.event), "📅"),
            ));
        }
    }
    None
}

pub fn macro_key(event_name: &str) -> String {
    format!("macro_{}", event_name)
}

/// Midnight UTC of a `YYYY-MM-DD` date
pub fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, MACRO_DATE_FORMAT).ok()?;
    Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}
