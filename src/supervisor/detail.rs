//! Worker detail view for health staff.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::authorization::SessionContext;
use crate::config::DashboardConfig;
use crate::dashboard::{age_kpi, bmi_kpi, Kpi, Section, UNAVAILABLE};
use crate::db::repository;
use crate::db::RecordStore;
use crate::intelligence::{self, HealthAssessment};
use crate::models::enums::SortDirection;
use crate::models::*;

const NAMELESS: &str = "Sin nombre";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerDetail {
    pub national_id: String,
    pub name: String,
    pub email: Option<String>,
    pub employer: Option<String>,
    pub org_unit: Option<String>,
    pub kpis: Vec<Kpi>,
    pub worker: Section<Option<WorkerProfile>>,
    pub assessment: HealthAssessment,
    pub appointments: Section<Vec<Appointment>>,
    pub labs: Section<Vec<LabResult>>,
    pub hygiene: Section<Vec<HygieneRecord>>,
}

/// Load one worker's profile, KPIs, assessment and record lists.
///
/// Returns `None` without touching the store unless the session is health
/// staff. Each list holds at most `detail_limit` rows, most recent first.
pub async fn load_worker_detail(
    ctx: &SessionContext,
    store: &dyn RecordStore,
    national_id: &str,
    config: &DashboardConfig,
    now: DateTime<Utc>,
) -> Option<WorkerDetail> {
    let Some(access) = ctx.staff_access() else {
        tracing::warn!(role = ctx.role().as_str(), "Worker detail refused");
        return None;
    };
    let limit = config.detail_limit;

    let (worker, account, appointments, labs, hygiene) = tokio::join!(
        repository::fetch_worker(store, national_id),
        repository::fetch_account(store, national_id),
        repository::fetch_appointments(store, national_id, SortDirection::Descending, Some(limit)),
        repository::fetch_lab_history(store, national_id, limit),
        repository::fetch_hygiene(store, national_id, limit),
    );

    let worker = Section::from_result("worker", worker);
    let appointments = Section::from_result("appointments", appointments);
    let labs = Section::from_result("labs", labs);
    let hygiene = Section::from_result("hygiene", hygiene);
    // The account only contributes name and email.
    let account = account.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Account lookup failed for worker detail");
        None
    });

    let profile = worker.data().and_then(Option::as_ref);
    let lab_rows = labs.data().map(Vec::as_slice).unwrap_or_default();
    let assessment = intelligence::assess(profile, lab_rows, now);

    let empty = WorkerProfile::default();
    let snapshot = profile.unwrap_or(&empty);
    let kpis = vec![age_kpi(snapshot, now), bmi_kpi(snapshot), height_kpi(snapshot)];

    let name = account
        .as_ref()
        .and_then(|a| a.name.clone())
        .or_else(|| profile.and_then(|p| p.name.clone()))
        .unwrap_or_else(|| NAMELESS.into());
    let email = account
        .as_ref()
        .and_then(|a| a.email.clone())
        .or_else(|| profile.and_then(|p| p.email.clone()));
    let employer = profile.and_then(|p| p.employer.clone());
    let org_unit = profile.and_then(|p| p.org_unit.clone());

    tracing::info!(
        requested_by = %access.context().user.id,
        recommendations = assessment.recommendations.len(),
        "Worker detail loaded"
    );

    Some(WorkerDetail {
        national_id: national_id.to_string(),
        name,
        email,
        employer,
        org_unit,
        kpis,
        assessment,
        worker,
        appointments,
        labs,
        hygiene,
    })
}

fn height_kpi(profile: &WorkerProfile) -> Kpi {
    let value = match profile.height_cm.as_deref() {
        Some(h) if !h.is_empty() => format!("{h} cm"),
        _ => UNAVAILABLE.into(),
    };
    Kpi {
        title: "Altura".into(),
        value,
    }
}
