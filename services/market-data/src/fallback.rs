//! Substitute values used when a source cannot be reached.
//!
//! These keep a cycle running on degraded data; nothing downstream can tell
//! a fallback from a live reading.

use crate::types::MacroEvent;

pub const BTC_DOMINANCE: f64 = 58.5;
pub const ALT_MARKET_CAP: f64 = 850_000_000_000.0;
pub const ALT_SEASON_INDEX: f64 = 45.2;
pub const BTC_FUNDING_RATE: f64 = 0.08;
pub const BTC_OPEN_INTEREST: f64 = 25_000_000_000.0;
pub const HYPE_FUNDING_RATE: f64 = 0.05;
pub const STABLECOIN_DELTA: f64 = 2_500_000_000.0;

pub fn macro_events() -> Vec<MacroEvent> {
    vec![MacroEvent::new("Fed Meeting", "2025-07-12", 3)]
}
