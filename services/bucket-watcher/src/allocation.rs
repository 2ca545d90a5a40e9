//! Three-bucket allocation from BTC dominance and the alt season index

use serde::{Deserialize, Serialize};

/// Used when the snapshot has no dominance reading
pub const DEFAULT_BTC_DOMINANCE: f64 = 60.0;
/// Used when the snapshot has no alt season reading
pub const DEFAULT_ALT_SEASON_INDEX: f64 = 50.0;

/// Recommended split across BTC, alts and stables. Always sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub btc: f64,
    pub alt: f64,
    pub stable: f64,
}

impl Allocation {
    pub const fn new(btc: f64, alt: f64, stable: f64) -> Self {
        Self { btc, alt, stable }
    }
}

/// Market regime that selects the allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    BtcDominance,
    AltSeason,
    Neutral,
}

impl Phase {
    /// First matching band wins.
    ///
    /// Dominance in `[60, 61)` with a weak alt index is neutral, not BTC.
    pub fn classify(btc_dominance: f64, alt_season_index: f64) -> Self {
        if btc_dominance >= 61.0 && alt_season_index < 50.0 {
            Phase::BtcDominance
        } else if btc_dominance < 60.0 && alt_season_index >= 50.0 {
            Phase::AltSeason
        } else {
            Phase::Neutral
        }
    }

    pub fn allocation(&self) -> Allocation {
        match self {
            Phase::BtcDominance => Allocation::new(0.70, 0.25, 0.05),
            Phase::AltSeason => Allocation::new(0.45, 0.50, 0.05),
            Phase::Neutral => Allocation::new(0.60, 0.35, 0.05),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::BtcDominance => "BTC dominance phase",
            Phase::AltSeason => "Alt season phase",
            Phase::Neutral => "Neutral phase",
        }
    }
}

pub fn allocate(btc_dominance: f64, alt_season_index: f64) -> Allocation {
    Phase::classify(btc_dominance, alt_season_index).allocation()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sums_to_one(a: Allocation) -> bool {
        (a.btc + a.alt + a.stable - 1.0).abs() < 1e-9
    }

    #[test]
    fn test_bands() {
        assert_eq!(allocate(65.0, 40.0), Allocation::new(0.70, 0.25, 0.05));
        assert_eq!(allocate(55.0, 80.0), Allocation::new(0.45, 0.50, 0.05));
        assert_eq!(allocate(62.0, 70.0), Allocation::new(0.60, 0.35, 0.05));
    }

    #[test]
    fn test_dominance_gap_is_neutral() {
        assert_eq!(Phase::classify(60.0, 40.0), Phase::Neutral);
        assert_eq!(Phase::classify(60.5, 10.0), Phase::Neutral);
        assert_eq!(Phase::classify(60.999, 49.999), Phase::Neutral);
        assert_eq!(Phase::classify(61.0, 49.999), Phase::BtcDominance);
    }

    #[test]
    fn test_alt_band_edges() {
        assert_eq!(Phase::classify(59.999, 50.0), Phase::AltSeason);
        assert_eq!(Phase::classify(60.0, 50.0), Phase::Neutral);
        assert_eq!(Phase::classify(59.0, 49.999), Phase::Neutral);
        assert_eq!(Phase::classify(61.0, 50.0), Phase::Neutral);
    }

    #[test]
    fn test_defaults_land_in_neutral() {
        assert_eq!(
            Phase::classify(DEFAULT_BTC_DOMINANCE, DEFAULT_ALT_SEASON_INDEX),
            Phase::Neutral
        );
    }

    #[test]
    fn test_every_band_sums_to_one() {
        let mut seen = Vec::new();
        for dom in (400..=800).step_by(5) {
            for idx in (0..=100).step_by(5) {
                let phase = Phase::classify(dom as f64 / 10.0, idx as f64);
                assert!(sums_to_one(phase.allocation()), "{:?} at {dom} {idx}", phase);
                if !seen.contains(&phase) {
                    seen.push(phase);
                }
            }
        }
        assert_eq!(seen.len(), 3);
    }
}
