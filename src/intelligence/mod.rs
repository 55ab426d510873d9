//! Health-metrics and triage engine.
//!
//! Pure computation over a profile snapshot and a lab history: derived
//! metrics, threshold classification and recommendations. Nothing here
//! touches the store or any rendering surface.

pub mod metrics;
pub mod recommendations;
pub mod thresholds;
pub mod types;

pub use types::*;

use chrono::{DateTime, Utc};

use crate::models::{LabResult, WorkerProfile};

/// Run the full pipeline for one worker.
pub fn assess(
    profile: Option<&WorkerProfile>,
    labs: &[LabResult],
    now: DateTime<Utc>,
) -> HealthAssessment {
    let bmi = profile.and_then(metrics::profile_bmi);
    let age = profile.and_then(|p| metrics::profile_age(p, now));
    let classifications = recommendations::classify_worker(profile, labs);
    let recommendations = recommendations::recommendations_from(&classifications);

    HealthAssessment {
        age: DerivedMetric {
            kind: MetricKind::Age,
            value: age.map(|years| years as f64),
        },
        bmi: DerivedMetric {
            kind: MetricKind::Bmi,
            value: bmi,
        },
        classifications,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn assessment_collects_metrics_and_classifications() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let profile = WorkerProfile {
            weight_kg: Some("90".into()),
            height_cm: Some("170".into()),
            birth_date: Some("1980-01-15".into()),
            ..Default::default()
        };
        let labs = vec![LabResult {
            parameter: Some("Glucosa".into()),
            date: Some("2024-05-01".into()),
            result: Some("99".into()),
            ..Default::default()
        }];

        let a = assess(Some(&profile), &labs, now);
        assert_eq!(a.age.value, Some(44.0));
        assert!(a.bmi.value.unwrap() > 31.0);
        assert_eq!(a.classifications.len(), 2);
        assert_eq!(a.worst_tier(), Some(Tier::High));
        assert_eq!(a.classification(Condition::Glucose).unwrap().tier, Tier::Normal);
        assert_eq!(a.recommendations.len(), 2);
    }

    #[test]
    fn empty_inputs_yield_unavailable_metrics() {
        let a = assess(None, &[], Utc::now());
        assert!(a.age.value.is_none());
        assert!(a.bmi.value.is_none());
        assert!(a.classifications.is_empty());
        assert!(a.recommendations.is_empty());
        assert_eq!(a.worst_tier(), None);
    }
}
