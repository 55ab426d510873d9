//! Recommendation engine.
//!
//! BMI first (reported only when elevated or high), then each tracked lab
//! parameter in declared order using its most recent result (reported at
//! every tier). Output order is evaluation order and is never re-sorted.

use chrono::{DateTime, Utc};

use super::metrics::{parse_calendar_date, profile_bmi};
use super::thresholds::{classify_text, classify_value};
use super::types::{Classification, Condition, Recommendation, Tier};
use crate::models::{LabResult, WorkerProfile};

/// Advisory copy shown to the worker, per condition and tier.
fn copy_for(condition: Condition, tier: Tier) -> (&'static str, &'static str) {
    match (condition, tier) {
        (Condition::Bmi, Tier::High) => (
            "IMC alto (≥30)",
            "Derivación a nutrición y plan de actividad física.",
        ),
        (Condition::Bmi, Tier::Elevated) => (
            "IMC elevado (25–29.9)",
            "Pausas activas, hidratación y revisión de colación.",
        ),
        (Condition::Bmi, Tier::Normal) => ("IMC normal", "Mantén tus hábitos actuales."),
        (Condition::Glucose, Tier::High) => ("Glucosa elevada (≥126)", "Agenda control médico."),
        (Condition::Glucose, Tier::Elevated) => (
            "Glucosa 100–125",
            "Reduce azúcares simples, aumenta fibra y proteína.",
        ),
        (Condition::Glucose, Tier::Normal) => ("Glucosa normal", "Mantén dieta equilibrada."),
        (Condition::TotalCholesterol, Tier::High) => (
            "Colesterol alto (≥240)",
            "Consulta médica y ajustes de dieta.",
        ),
        (Condition::TotalCholesterol, Tier::Elevated) => (
            "Colesterol límite (200–239)",
            "Ajustes de dieta y actividad física.",
        ),
        (Condition::TotalCholesterol, Tier::Normal) => (
            "Colesterol deseable (<200)",
            "Sigue con hábitos actuales.",
        ),
    }
}

fn recommend(classification: &Classification) -> Recommendation {
    let (title, detail) = copy_for(classification.condition, classification.tier);
    Recommendation {
        condition: classification.condition,
        tier: classification.tier,
        title: title.into(),
        detail: detail.into(),
    }
}

/// Most recent result for `parameter` (compared lower-cased).
///
/// Undated or unparseable dates rank below any real date. Equal dates keep
/// the earliest entry in input order.
pub fn latest_for_parameter<'a>(labs: &'a [LabResult], parameter: &str) -> Option<&'a LabResult> {
    let wanted = parameter.to_lowercase();
    let mut best: Option<(&LabResult, Option<DateTime<Utc>>)> = None;
    for lab in labs {
        let matches = lab
            .parameter
            .as_deref()
            .is_some_and(|p| p.to_lowercase() == wanted);
        if !matches {
            continue;
        }
        let date = lab.date.as_deref().and_then(parse_calendar_date);
        match best {
            Some((_, best_date)) if date <= best_date => {}
            _ => best = Some((lab, date)),
        }
    }
    best.map(|(lab, _)| lab)
}

/// Classifications in evaluation order: BMI (if computable), then each
/// tracked lab whose latest result parses as a number.
pub fn classify_worker(profile: Option<&WorkerProfile>, labs: &[LabResult]) -> Vec<Classification> {
    let mut out = Vec::with_capacity(1 + Condition::TRACKED_LABS.len());

    if let Some(bmi) = profile.and_then(profile_bmi) {
        out.extend(classify_value(Condition::Bmi, bmi));
    }

    for condition in Condition::TRACKED_LABS {
        let Some(parameter) = condition.lab_parameter() else {
            continue;
        };
        let latest = latest_for_parameter(labs, parameter);
        if let Some(raw) = latest.and_then(|lab| lab.result.as_deref()) {
            out.extend(classify_text(condition, raw));
        }
    }

    out
}

/// Recommendations derived from a classification list. BMI only reports
/// non-normal tiers; every lab classification yields one entry.
pub fn recommendations_from(classifications: &[Classification]) -> Vec<Recommendation> {
    classifications
        .iter()
        .filter(|c| c.condition != Condition::Bmi || c.tier > Tier::Normal)
        .map(recommend)
        .collect()
}

pub fn build_recommendations(
    profile: Option<&WorkerProfile>,
    labs: &[LabResult],
) -> Vec<Recommendation> {
    recommendations_from(&classify_worker(profile, labs))
}
