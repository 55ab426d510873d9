//! Threshold classifier: fixed clinical cutoffs per condition.

use std::str::FromStr;

use super::metrics::parse_decimal;
use super::types::{Classification, Condition, Tier};

/// Lower bounds (inclusive) of the elevated and high tiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutoffs {
    pub elevated: f64,
    pub high: f64,
}

pub const BMI_CUTOFFS: Cutoffs = Cutoffs {
    elevated: 25.0,
    high: 30.0,
};

/// Fasting glucose, mg/dL.
pub const GLUCOSE_CUTOFFS: Cutoffs = Cutoffs {
    elevated: 100.0,
    high: 126.0,
};

/// Total cholesterol, mg/dL.
pub const TOTAL_CHOLESTEROL_CUTOFFS: Cutoffs = Cutoffs {
    elevated: 200.0,
    high: 240.0,
};

impl Condition {
    pub fn cutoffs(&self) -> Cutoffs {
        match self {
            Self::Bmi => BMI_CUTOFFS,
            Self::Glucose => GLUCOSE_CUTOFFS,
            Self::TotalCholesterol => TOTAL_CHOLESTEROL_CUTOFFS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown condition: {0}")]
pub struct UnknownCondition(pub String);

impl FromStr for Condition {
    type Err = UnknownCondition;

    /// Accepts English and store (Spanish) names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bmi" | "imc" => Ok(Self::Bmi),
            "glucose" | "glucosa" => Ok(Self::Glucose),
            "total cholesterol" | "colesterol total" => Ok(Self::TotalCholesterol),
            _ => Err(UnknownCondition(s.into())),
        }
    }
}

/// Tier for a numeric value. Non-finite values are indeterminate (`None`).
pub fn classify(condition: Condition, value: f64) -> Option<Tier> {
    if !value.is_finite() {
        return None;
    }
    let cutoffs = condition.cutoffs();
    Some(if value >= cutoffs.high {
        Tier::High
    } else if value >= cutoffs.elevated {
        Tier::Elevated
    } else {
        Tier::Normal
    })
}

/// Classify a free-form value. Unparseable text is indeterminate (`None`).
pub fn classify_text(condition: Condition, raw: &str) -> Option<Classification> {
    let value = parse_decimal(raw)?;
    classify_value(condition, value)
}

pub fn classify_value(condition: Condition, value: f64) -> Option<Classification> {
    let tier = classify(condition, value)?;
    Some(Classification {
        condition,
        tier,
        value,
    })
}
