//! Per-trigger cooldown tracking

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Minimum time between two fires of the same trigger
pub const COOLDOWN_WINDOW_HOURS: i64 = 12;

/// Last-fired instant per trigger key.
///
/// In-memory only: a restart forgets every cooldown.
#[derive(Debug, Clone)]
pub struct CooldownTracker {
    window: Duration,
    last_fired: HashMap<String, DateTime<Utc>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self {
            window: Duration::hours(COOLDOWN_WINDOW_HOURS),
            last_fired: HashMap::new(),
        }
    }

    /// True if `name` never fired or its window has fully elapsed at `now`
    pub fn eligible(&self, name: &str, now: DateTime<Utc>) -> bool {
        match self.last_fired.get(name) {
            Some(last) => now.signed_duration_since(*last) >= self.window,
            None => true,
        }
    }

    /// Overwrite the last-fired instant for `name`
    pub fn record(&mut self, name: &str, now: DateTime<Utc>) {
        self.last_fired.insert(name.to_string(), now);
    }

    pub fn last_fired(&self, name: &str) -> Option<DateTime<Utc>> {
        self.last_fired.get(name).copied()
    }
}

impl Default for CooldownTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 12, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_unknown_trigger_is_eligible() {
        let tracker = CooldownTracker::new();
        assert!(tracker.eligible("rotation", t0()));
        assert_eq!(tracker.last_fired("rotation"), None);
    }

    #[test]
    fn test_cooled_until_window_elapses() {
        let mut tracker = CooldownTracker::new();
        tracker.record("rotation", t0());

        assert!(!tracker.eligible("rotation", t0()));
        assert!(!tracker.eligible("rotation", t0() + Duration::hours(11) + Duration::minutes(59)));
        // Boundary is inclusive
        assert!(tracker.eligible("rotation", t0() + Duration::hours(12)));
        assert!(tracker.eligible("rotation", t0() + Duration::days(3)));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut tracker = CooldownTracker::new();
        tracker.record("funding_btc", t0());

        assert!(!tracker.eligible("funding_btc", t0()));
        assert!(tracker.eligible("funding_hype", t0()));
    }

    #[test]
    fn test_record_overwrites() {
        let mut tracker = CooldownTracker::new();
        tracker.record("macro_CPI", t0());
        let later = t0() + Duration::hours(13);
        tracker.record("macro_CPI", later);

        assert_eq!(tracker.last_fired("macro_CPI"), Some(later));
        assert!(!tracker.eligible("macro_CPI", later + Duration::hours(1)));
    }
}
