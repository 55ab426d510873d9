//! Own-data dashboard: one load pipeline for everything the signed-in
//! user sees about themselves.
//!
//! Each widget is loaded independently and carried as a `Section`, so a
//! failing query shows an inline message in its own widget while the rest
//! of the dashboard renders normally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::authorization::{Affordance, Role};
use crate::banner::{bmi_banner, AlertBanner};
use crate::config::DashboardConfig;
use crate::db::repository;
use crate::db::{RecordStore, StoreError};
use crate::error::DashboardError;
use crate::intelligence::{self, metrics, HealthAssessment};
use crate::models::enums::SortDirection;
use crate::models::*;
use crate::session::ResolvedSession;

/// Placeholder for a KPI that cannot be computed.
pub const UNAVAILABLE: &str = "—";

const NO_RECOMMENDATIONS: &str = "Sin recomendaciones específicas. ¡Buen trabajo!";

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Outcome of loading one widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Loaded { data: T },
    Failed { message: String },
}

impl<T> Section<T> {
    /// Contain a store failure to this section. The failure is logged and
    /// turned into the widget's inline message.
    pub fn from_result(section: &'static str, result: Result<T, StoreError>) -> Self {
        match result {
            Ok(data) => Self::Loaded { data },
            Err(e) => {
                let err = DashboardError::query(section, e);
                tracing::warn!(section, error = %err, "Section failed to load");
                Self::Failed {
                    message: err.inline_message(),
                }
            }
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Loaded { data } => Some(data),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One headline indicator card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kpi {
    pub title: String,
    pub value: String,
}

impl Kpi {
    fn new(title: &str, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
        }
    }
}

/// Header chip summarizing pending deadline alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChip {
    pub label: String,
    pub highlighted: bool,
}

impl StatusChip {
    pub fn from_alerts(alerts: &[DeadlineAlert]) -> Self {
        if alerts.is_empty() {
            Self {
                label: "OK".into(),
                highlighted: false,
            }
        } else {
            Self {
                label: format!("{} alertas", alerts.len()),
                highlighted: true,
            }
        }
    }
}

/// Everything rendered for the signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub role: Role,
    /// Whether the supervisor tab and its search are shown.
    pub supervisor_enabled: bool,
    /// Account card. `Loaded { data: None }` means no account row.
    pub profile: Section<Option<UserAccount>>,
    pub worker: Section<Option<WorkerProfile>>,
    pub kpis: Vec<Kpi>,
    pub banner: AlertBanner,
    pub alerts: Section<Vec<DeadlineAlert>>,
    pub status: StatusChip,
    pub labs: Section<Vec<LabResult>>,
    pub hygiene: Section<Vec<HygieneRecord>>,
    pub appointments: Section<Vec<Appointment>>,
    pub assessment: HealthAssessment,
    /// Shown in place of the recommendation list when it is empty.
    pub recommendations_note: Option<String>,
}

// ═══════════════════════════════════════════════════════════
// Load pipeline
// ═══════════════════════════════════════════════════════════

/// Load the signed-in user's dashboard.
///
/// Records are selected by the identifier on the session context; with no
/// identifier every list is empty.
pub async fn load_dashboard(
    session: &ResolvedSession,
    store: &dyn RecordStore,
    config: &DashboardConfig,
    now: DateTime<Utc>,
) -> Dashboard {
    let ctx = &session.context;
    let rut = ctx.national_id.as_deref();
    let limit = config.detail_limit;

    let (worker, alerts, labs, hygiene, appointments) = tokio::join!(
        async {
            match rut {
                Some(rut) => repository::fetch_worker(store, rut).await,
                None => Ok(None),
            }
        },
        async {
            match rut {
                Some(rut) => repository::fetch_deadline_alerts(store, rut).await,
                None => Ok(Vec::new()),
            }
        },
        async {
            match rut {
                Some(rut) => repository::fetch_lab_history(store, rut, limit).await,
                None => Ok(Vec::new()),
            }
        },
        async {
            match rut {
                Some(rut) => repository::fetch_hygiene(store, rut, limit).await,
                None => Ok(Vec::new()),
            }
        },
        async {
            match rut {
                Some(rut) => {
                    repository::fetch_appointments(store, rut, SortDirection::Ascending, None).await
                }
                None => Ok(Vec::new()),
            }
        },
    );

    let worker = Section::from_result("worker", worker);
    let alerts = Section::from_result("alerts", alerts);
    let labs = Section::from_result("labs", labs);
    let hygiene = Section::from_result("hygiene", hygiene);
    let appointments = Section::from_result("appointments", appointments);

    let profile = worker.data().and_then(Option::as_ref);
    let lab_rows = labs.data().map(Vec::as_slice).unwrap_or_default();
    let assessment = intelligence::assess(profile, lab_rows, now);

    let kpis = profile.map(|p| own_kpis(p, now)).unwrap_or_default();
    let banner = bmi_banner(assessment.bmi.value).unwrap_or_default();
    let status = StatusChip::from_alerts(alerts.data().map(Vec::as_slice).unwrap_or_default());
    let recommendations_note = assessment
        .recommendations
        .is_empty()
        .then(|| NO_RECOMMENDATIONS.to_string());

    tracing::info!(
        role = ctx.role().as_str(),
        recommendations = assessment.recommendations.len(),
        banner = ?banner.kind,
        "Dashboard loaded"
    );

    Dashboard {
        role: ctx.role(),
        supervisor_enabled: ctx.permits(Affordance::WorkerSearch),
        profile: session.account.clone(),
        worker,
        kpis,
        banner,
        alerts,
        status,
        labs,
        hygiene,
        appointments,
        assessment,
        recommendations_note,
    }
}

/// Age, BMI and employer cards for the signed-in user.
fn own_kpis(profile: &WorkerProfile, now: DateTime<Utc>) -> Vec<Kpi> {
    vec![
        age_kpi(profile, now),
        bmi_kpi(profile),
        Kpi::new("Empresa", profile.employer.as_deref().unwrap_or(UNAVAILABLE)),
    ]
}

pub(crate) fn age_kpi(profile: &WorkerProfile, now: DateTime<Utc>) -> Kpi {
    let value = metrics::profile_age(profile, now)
        .map(|years| format!("{years} años"))
        .unwrap_or_else(|| UNAVAILABLE.into());
    Kpi::new("Edad", value)
}

pub(crate) fn bmi_kpi(profile: &WorkerProfile) -> Kpi {
    let value = metrics::profile_bmi(profile)
        .map(|bmi| format!("{bmi:.1}"))
        .unwrap_or_else(|| UNAVAILABLE.into());
    Kpi::new("IMC", value)
}

// ═══════════════════════════════════════════════════════════
// Rendering helpers
// ═══════════════════════════════════════════════════════════

/// Case-insensitive substring filter over category, parameter and
/// interpretation. A blank query keeps every row.
pub fn filter_labs<'a>(labs: &'a [LabResult], query: &str) -> Vec<&'a LabResult> {
    let q = query.trim().to_lowercase();
    labs.iter()
        .filter(|lab| {
            [&lab.category, &lab.parameter, &lab.interpretation]
                .into_iter()
                .any(|field| {
                    field
                        .as_deref()
                        .unwrap_or_default()
                        .to_lowercase()
                        .contains(&q)
                })
        })
        .collect()
}

/// `YYYY-MM-DD` for parseable dates, the raw text otherwise, empty for none.
pub fn format_date(raw: Option<&str>) -> String {
    match raw {
        None | Some("") => String::new(),
        Some(s) => metrics::parse_calendar_date(s)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| s.to_string()),
    }
}
