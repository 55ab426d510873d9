use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

/// Severity of a metric or lab value. Totally ordered: normal < elevated < high.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Normal,
    Elevated,
    High,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Elevated => "elevated",
            Self::High => "high",
        }
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// A condition with fixed clinical cutoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Bmi,
    Glucose,
    TotalCholesterol,
}

impl Condition {
    /// Lab conditions in evaluation order.
    pub const TRACKED_LABS: [Condition; 2] = [Condition::Glucose, Condition::TotalCholesterol];

    /// Lower-cased lab parameter name as recorded in the store.
    pub fn lab_parameter(&self) -> Option<&'static str> {
        match self {
            Self::Bmi => None,
            Self::Glucose => Some("glucosa"),
            Self::TotalCholesterol => Some("colesterol total"),
        }
    }
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Age,
    Bmi,
}

/// A value computed from the profile snapshot. `None` means unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetric {
    pub kind: MetricKind,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub condition: Condition,
    pub tier: Tier,
    /// The value that produced the tier.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub condition: Condition,
    pub tier: Tier,
    pub title: String,
    pub detail: String,
}

/// Everything the pipeline derives for one worker in one rendering cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub age: DerivedMetric,
    pub bmi: DerivedMetric,
    pub classifications: Vec<Classification>,
    pub recommendations: Vec<Recommendation>,
}

impl HealthAssessment {
    /// Highest tier reached by any classification.
    pub fn worst_tier(&self) -> Option<Tier> {
        self.classifications.iter().map(|c| c.tier).max()
    }

    pub fn classification(&self, condition: Condition) -> Option<&Classification> {
        self.classifications.iter().find(|c| c.condition == condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ordering() {
        assert!(Tier::Normal < Tier::Elevated);
        assert!(Tier::Elevated < Tier::High);
    }

    #[test]
    fn tracked_labs_have_parameters() {
        assert!(Condition::TRACKED_LABS
            .iter()
            .all(|c| c.lab_parameter().is_some()));
        assert!(Condition::Bmi.lab_parameter().is_none());
    }

    #[test]
    fn tier_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Tier::Elevated).unwrap(), "\"elevated\"");
        assert_eq!(
            serde_json::to_string(&Condition::TotalCholesterol).unwrap(),
            "\"total_cholesterol\""
        );
    }
}
