//! Turning features into a fire probability.

use crate::{error::ForesightError, row::FeatureRow};
use strum::{Display, EnumIter, IntoStaticStr};

/// Maps a complete set of features to a fire probability.
///
/// Implementations must be pure with respect to their own state, the same row always gets the
/// same score. The probability is used as is, it is not clamped to 0 - 1.
pub trait RiskScorer {
    fn score(&self, features: &FeatureRow) -> Result<f64, ForesightError>;
}

impl<F> RiskScorer for F
where
    F: Fn(&FeatureRow) -> f64,
{
    fn score(&self, features: &FeatureRow) -> Result<f64, ForesightError> {
        Ok(self(features))
    }
}

/// What to do with a row that is missing one or more features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingFeaturePolicy {
    /// Fail the whole run.
    #[default]
    Abort,
    /// Log a warning and leave the row out of the aggregates.
    Skip,
}

/// A coarse verdict for a single probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, IntoStaticStr)]
pub enum RiskLevel {
    #[strum(serialize = "LOW")]
    Low,
    #[strum(serialize = "MODERATE")]
    Moderate,
    #[strum(serialize = "HIGH")]
    High,
}

impl RiskLevel {
    /// High above 0.7, moderate above 0.4, low otherwise.
    pub fn from_probability(prob: f64) -> Self {
        if prob > 0.7 {
            RiskLevel::High
        } else if prob > 0.4 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    /// A short message to show along with the level.
    pub fn advice(&self) -> &'static str {
        match self {
            RiskLevel::High => "Fire likely!",
            RiskLevel::Moderate => "Be cautious.",
            RiskLevel::Low => "Conditions safe.",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_risk_level_thresholds() {
        assert_eq!(RiskLevel::from_probability(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.4), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.41), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_probability(0.7), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_probability(0.71), RiskLevel::High);
        assert_eq!(RiskLevel::from_probability(1.3), RiskLevel::High);
    }

    #[test]
    fn test_risk_level_names() {
        let names: Vec<String> = RiskLevel::iter().map(|lvl| lvl.to_string()).collect();
        assert_eq!(names, vec!["LOW", "MODERATE", "HIGH"]);

        let name: &'static str = RiskLevel::High.into();
        assert_eq!(name, "HIGH");
    }

    #[test]
    fn test_closures_are_scorers() {
        let scorer = |row: &FeatureRow| row.temperature_max / 100.0;
        let row = FeatureRow {
            temperature_max: 42.0,
            ..FeatureRow::default()
        };

        assert_eq!(scorer.score(&row), Ok(0.42));
    }
}
