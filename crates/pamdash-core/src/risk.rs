//! Risk thresholds and score classification.

use std::fmt;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Highest risk score the service emits.
pub const MAX_SCORE: u8 = 100;

/// Three ascending boundaries used to classify risk scores.
///
/// Valid sets satisfy `1 <= medium < high < critical <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub medium: u8,
    pub high: u8,
    pub critical: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            medium: 60,
            high: 80,
            critical: 95,
        }
    }
}

impl Thresholds {
    /// Builds a threshold set from raw integers, enforcing the ordering invariant.
    ///
    /// # Errors
    /// Returns an error if a boundary is outside [1, 100] or the order is wrong.
    pub fn new(medium: i64, high: i64, critical: i64) -> Result<Self> {
        for (name, value) in [("Medium", medium), ("High", high), ("Critical", critical)] {
            if !(1..=i64::from(MAX_SCORE)).contains(&value) {
                bail!("{name} threshold must be between 1 and 100");
            }
        }
        if medium >= high || high >= critical {
            bail!("Thresholds must be in ascending order (Medium < High < Critical)");
        }
        Ok(Self {
            medium: medium as u8,
            high: high as u8,
            critical: critical as u8,
        })
    }

    /// Re-checks a set that came from elsewhere (e.g. the server).
    ///
    /// # Errors
    /// Same conditions as [`Thresholds::new`].
    pub fn validate(&self) -> Result<()> {
        Self::new(
            i64::from(self.medium),
            i64::from(self.high),
            i64::from(self.critical),
        )
        .map(|_| ())
    }

    /// Classifies a score. A score on a boundary belongs to the higher tier.
    pub fn classify(&self, score: u8) -> RiskLevel {
        if score >= self.critical {
            RiskLevel::Critical
        } else if score >= self.high {
            RiskLevel::High
        } else if score >= self.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Classification tier of a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_default_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t.classify(0), RiskLevel::Low);
        assert_eq!(t.classify(59), RiskLevel::Low);
        assert_eq!(t.classify(60), RiskLevel::Medium);
        assert_eq!(t.classify(79), RiskLevel::Medium);
        assert_eq!(t.classify(80), RiskLevel::High);
        assert_eq!(t.classify(94), RiskLevel::High);
        assert_eq!(t.classify(95), RiskLevel::Critical);
        assert_eq!(t.classify(100), RiskLevel::Critical);
    }

    #[test]
    fn test_classify_is_monotonic_for_valid_sets() {
        let sets = [
            Thresholds::new(1, 2, 3).unwrap(),
            Thresholds::new(10, 50, 90).unwrap(),
            Thresholds::new(98, 99, 100).unwrap(),
            Thresholds::default(),
        ];
        for t in sets {
            let mut previous = RiskLevel::Low;
            for score in 0..=MAX_SCORE {
                let level = t.classify(score);
                assert!(level >= previous, "{t:?} regressed at {score}");
                previous = level;
            }
        }
    }

    #[test]
    fn test_classification_follows_threshold_changes() {
        let before = Thresholds::default();
        let after = Thresholds::new(30, 50, 70).unwrap();
        assert_eq!(before.classify(72), RiskLevel::Medium);
        assert_eq!(after.classify(72), RiskLevel::Critical);
    }

    #[test]
    fn test_new_rejects_out_of_order() {
        let err = Thresholds::new(80, 60, 95).unwrap_err();
        assert!(err.to_string().contains("ascending order"));
        assert!(Thresholds::new(60, 60, 95).is_err());
        assert!(Thresholds::new(60, 95, 95).is_err());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(Thresholds::new(0, 50, 90).is_err());
        assert!(Thresholds::new(10, 50, 101).is_err());
        assert!(Thresholds::new(-5, 50, 90).is_err());
    }
}
