//! Typed reads over the record store, one function per dashboard widget.

use std::collections::HashMap;

use super::{fetch, fetch_first, Filter, Query, RecordStore, StoreError};
use crate::models::enums::{SortDirection, Table};
use crate::models::*;

// ═══════════════════════════════════════════
// Accounts & workers
// ═══════════════════════════════════════════

pub async fn fetch_account_by_email(
    store: &dyn RecordStore,
    email: &str,
) -> Result<Option<UserAccount>, StoreError> {
    fetch_first(store, Query::from(Table::Accounts).filter(Filter::eq("email", email))).await
}

pub async fn fetch_account(
    store: &dyn RecordStore,
    national_id: &str,
) -> Result<Option<UserAccount>, StoreError> {
    fetch_first(store, Query::from(Table::Accounts).filter(Filter::eq("rut", national_id))).await
}

pub async fn fetch_worker(
    store: &dyn RecordStore,
    national_id: &str,
) -> Result<Option<WorkerProfile>, StoreError> {
    fetch_first(store, Query::from(Table::Workers).filter(Filter::eq("rut", national_id))).await
}

// ═══════════════════════════════════════════
// Record lists
// ═══════════════════════════════════════════

/// Lab history, most recent first.
pub async fn fetch_lab_history(
    store: &dyn RecordStore,
    national_id: &str,
    limit: usize,
) -> Result<Vec<LabResult>, StoreError> {
    let query = Query::from(Table::LabResults)
        .filter(Filter::eq("rut", national_id))
        .order_by("fecha", SortDirection::Descending)
        .limit(limit);
    fetch(store, &query).await
}

/// Hygiene measurements, most recent first.
pub async fn fetch_hygiene(
    store: &dyn RecordStore,
    national_id: &str,
    limit: usize,
) -> Result<Vec<HygieneRecord>, StoreError> {
    let query = Query::from(Table::Hygiene)
        .filter(Filter::eq("rut", national_id))
        .order_by("fecha", SortDirection::Descending)
        .limit(limit);
    fetch(store, &query).await
}

/// Appointments by date. `None` returns every row.
pub async fn fetch_appointments(
    store: &dyn RecordStore,
    national_id: &str,
    direction: SortDirection,
    limit: Option<usize>,
) -> Result<Vec<Appointment>, StoreError> {
    let mut query = Query::from(Table::Appointments)
        .filter(Filter::eq("rut", national_id))
        .order_by("fecha", direction);
    query.limit = limit;
    fetch(store, &query).await
}

/// Deadline alerts, soonest first.
pub async fn fetch_deadline_alerts(
    store: &dyn RecordStore,
    national_id: &str,
) -> Result<Vec<DeadlineAlert>, StoreError> {
    let query = Query::from(Table::DeadlineAlerts)
        .filter(Filter::eq("rut", national_id))
        .order_by("dias_restantes", SortDirection::Ascending);
    fetch(store, &query).await
}

// ═══════════════════════════════════════════
// Supervisor directory
// ═══════════════════════════════════════════

/// Case-insensitive substring search over name, email and identifier.
/// Ordering is whatever the store returns.
pub async fn search_directory(
    store: &dyn RecordStore,
    needle: &str,
    limit: usize,
) -> Result<Vec<DirectoryEntry>, StoreError> {
    let query = Query::from(Table::Directory)
        .filter(Filter::AnyOf(vec![
            Filter::contains("nombre", needle),
            Filter::contains("email", needle),
            Filter::contains("rut", needle),
        ]))
        .limit(limit);
    fetch(store, &query).await
}

/// Organizational unit and employer keyed by identifier.
pub async fn fetch_org_placements(
    store: &dyn RecordStore,
    national_ids: &[String],
) -> Result<HashMap<String, OrgPlacement>, StoreError> {
    if national_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let query =
        Query::from(Table::Workers).filter(Filter::is_in("rut", national_ids.to_vec()));
    let placements: Vec<OrgPlacement> = fetch(store, &query).await?;
    Ok(placements
        .into_iter()
        .map(|p| (p.national_id.clone(), p))
        .collect())
}
