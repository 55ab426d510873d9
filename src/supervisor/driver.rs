//! Async driver for the worker search.
//!
//! Owns a `SearchController` inside a spawned task and feeds it keystrokes,
//! debounce expiry and store responses. Superseded requests are left to
//! finish; the controller discards their responses. Renderers follow the
//! `watch` channel.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use super::search::{InputOutcome, SearchController, SearchRequest, SearchSnapshot, WorkerHit};
use crate::authorization::StaffAccess;
use crate::config::DashboardConfig;
use crate::db::repository::{fetch_org_placements, search_directory};
use crate::db::{RecordStore, StoreError};
use crate::models::OrgPlacement;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    Input(String),
    Clear,
}

enum Completion {
    Search {
        seq: u64,
        result: Result<Vec<WorkerHit>, StoreError>,
    },
    Enrichment {
        seq: u64,
        result: Result<HashMap<String, OrgPlacement>, StoreError>,
    },
}

/// Handle to a running search task. Dropping it stops the task.
pub struct SearchHandle {
    events: mpsc::UnboundedSender<SearchEvent>,
    snapshots: watch::Receiver<SearchSnapshot>,
    task: JoinHandle<()>,
}

impl SearchHandle {
    pub fn input(&self, raw: impl Into<String>) {
        self.send(SearchEvent::Input(raw.into()));
    }

    pub fn clear(&self) {
        self.send(SearchEvent::Clear);
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.snapshots.clone()
    }

    fn send(&self, event: SearchEvent) {
        if self.events.send(event).is_err() {
            tracing::warn!("Search task has stopped; event dropped");
        }
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start the search task for a health-staff session.
pub fn spawn_search(
    access: StaffAccess<'_>,
    store: Arc<dyn RecordStore>,
    config: &DashboardConfig,
) -> SearchHandle {
    let controller = SearchController::new(access, config.search_debounce());
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (snapshots_tx, snapshots_rx) = watch::channel(SearchSnapshot::default());
    let task = tokio::spawn(run(
        controller,
        store,
        config.search_limit,
        events_rx,
        snapshots_tx,
    ));
    SearchHandle {
        events: events_tx,
        snapshots: snapshots_rx,
        task,
    }
}

async fn run(
    mut controller: SearchController,
    store: Arc<dyn RecordStore>,
    limit: usize,
    mut events: mpsc::UnboundedReceiver<SearchEvent>,
    snapshots: watch::Sender<SearchSnapshot>,
) {
    let mut deadline: Option<(u64, Instant)> = None;
    let mut in_flight: FuturesUnordered<BoxFuture<'static, Completion>> = FuturesUnordered::new();

    loop {
        let timer = deadline.map_or_else(Instant::now, |(_, at)| at);

        tokio::select! {
            event = events.recv() => match event {
                Some(SearchEvent::Input(raw)) => match controller.input(&raw) {
                    InputOutcome::Scheduled { ticket, delay } => {
                        deadline = Some((ticket, Instant::now() + delay));
                    }
                    InputOutcome::Cleared => deadline = None,
                    InputOutcome::Unchanged => {}
                },
                Some(SearchEvent::Clear) => {
                    controller.clear();
                    deadline = None;
                }
                None => break,
            },
            () = time::sleep_until(timer), if deadline.is_some() => {
                if let Some((ticket, _)) = deadline.take() {
                    if let Some(request) = controller.debounce_elapsed(ticket) {
                        in_flight.push(search(store.clone(), request, limit).boxed());
                    }
                }
            },
            Some(done) = in_flight.next(), if !in_flight.is_empty() => match done {
                Completion::Search { seq, result } => {
                    let ids: Vec<String> = result
                        .as_ref()
                        .map(|hits| hits.iter().filter_map(|h| h.national_id.clone()).collect())
                        .unwrap_or_default();
                    let result = result.map_err(|e| e.to_string());
                    if controller.complete(seq, result) && !ids.is_empty() {
                        in_flight.push(enrich(store.clone(), seq, ids).boxed());
                    }
                }
                Completion::Enrichment { seq, result } => match result {
                    Ok(placements) => {
                        controller.enrich(seq, &placements);
                    }
                    Err(e) => {
                        tracing::warn!(seq, error = %e, "Search enrichment failed");
                    }
                },
            },
        }

        snapshots.send_replace(controller.snapshot());
    }

    tracing::debug!("Search task finished");
}

async fn search(store: Arc<dyn RecordStore>, request: SearchRequest, limit: usize) -> Completion {
    tracing::debug!(seq = request.seq, "Searching worker directory");
    let result = search_directory(store.as_ref(), &request.query, limit)
        .await
        .map(|entries| entries.into_iter().map(WorkerHit::from).collect());
    if let Err(e) = &result {
        tracing::warn!(seq = request.seq, error = %e, "Worker search failed");
    }
    Completion::Search {
        seq: request.seq,
        result,
    }
}

async fn enrich(store: Arc<dyn RecordStore>, seq: u64, ids: Vec<String>) -> Completion {
    Completion::Enrichment {
        seq,
        result: fetch_org_placements(store.as_ref(), &ids).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::SessionContext;
    use crate::db::{Filter, Query, Row};
    use crate::models::enums::Table;
    use crate::models::UserAccount;
    use crate::session::SessionUser;
    use crate::supervisor::search::SearchPhase;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use uuid::Uuid;

    /// Directory backed by fixed rows; records every search needle and
    /// delays chosen needles.
    #[derive(Default)]
    struct MockDirectory {
        searches: Mutex<Vec<String>>,
        delays: HashMap<String, Duration>,
        fail_placements: bool,
    }

    impl MockDirectory {
        fn searches(&self) -> Vec<String> {
            self.searches.lock().unwrap().clone()
        }

        fn rows(table: Table) -> Vec<Row> {
            let rows = match table {
                Table::Directory => vec![
                    json!({"rut": "11-1", "nombre": "Ana Rojas", "email": "ana@faena.cl"}),
                    json!({"rut": "33-3", "nombre": "Juan Pérez", "email": "jperez@faena.cl"}),
                ],
                Table::Workers => vec![
                    json!({"rut": "11-1", "gerencia": "Operaciones", "empresa": "Minera Norte"}),
                ],
                _ => vec![],
            };
            rows.into_iter()
                .filter_map(|v| v.as_object().cloned())
                .collect()
        }
    }

    #[async_trait]
    impl RecordStore for MockDirectory {
        async fn query(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
            if query.table == Table::Directory {
                let needle = match query.filters.first() {
                    Some(Filter::AnyOf(alts)) => match alts.first() {
                        Some(Filter::Contains { needle, .. }) => needle.clone(),
                        _ => String::new(),
                    },
                    _ => String::new(),
                };
                self.searches.lock().unwrap().push(needle.clone());
                if let Some(delay) = self.delays.get(&needle) {
                    time::sleep(*delay).await;
                }
            }
            if query.table == Table::Workers && self.fail_placements {
                return Err(StoreError::Query {
                    table: "trabajadores".into(),
                    message: "permission denied".into(),
                });
            }
            Ok(Self::rows(query.table)
                .into_iter()
                .filter(|row| query.matches(row))
                .take(query.limit.unwrap_or(usize::MAX))
                .collect())
        }
    }

    fn staff() -> SessionContext {
        let account = UserAccount {
            national_id: Some("22-2".into()),
            role: Some("salud".into()),
            ..Default::default()
        };
        let user = SessionUser {
            id: Uuid::new_v4(),
            email: None,
        };
        SessionContext::new(user, Some(&account))
    }

    fn start(store: Arc<MockDirectory>) -> SearchHandle {
        let ctx = staff();
        spawn_search(ctx.staff_access().unwrap(), store, &DashboardConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_typing_issues_one_request() {
        let store = Arc::new(MockDirectory::default());
        let handle = start(store.clone());

        handle.input("a");
        handle.input("an");
        handle.input("ana");
        time::sleep(Duration::from_millis(300)).await;

        assert_eq!(store.searches(), vec!["ana".to_string()]);
        let snap = handle.snapshot();
        assert_eq!(snap.phase, SearchPhase::Results);
        assert_eq!(snap.results.len(), 1);
        assert_eq!(snap.results[0].org_unit.as_deref(), Some("Operaciones"));
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_before_debounce_issues_nothing() {
        let store = Arc::new(MockDirectory::default());
        let handle = start(store.clone());

        handle.input("ana");
        time::sleep(Duration::from_millis(100)).await;
        handle.clear();
        time::sleep(Duration::from_millis(500)).await;

        assert!(store.searches().is_empty());
        assert_eq!(handle.snapshot().phase, SearchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_superseded_response_is_ignored() {
        let store = Arc::new(MockDirectory {
            delays: HashMap::from([("an".to_string(), Duration::from_millis(1000))]),
            ..Default::default()
        });
        let handle = start(store.clone());

        handle.input("an");
        time::sleep(Duration::from_millis(300)).await;
        assert_eq!(handle.snapshot().phase, SearchPhase::Searching);

        handle.input("ana");
        time::sleep(Duration::from_millis(300)).await;
        assert_eq!(handle.snapshot().results.len(), 1);

        // The "an" response (two hits) lands now and must not win.
        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(store.searches(), vec!["an".to_string(), "ana".to_string()]);
        let snap = handle.snapshot();
        assert_eq!(snap.query.as_deref(), Some("ana"));
        assert_eq!(snap.results.len(), 1);
        assert_eq!(snap.results[0].name.as_deref(), Some("Ana Rojas"));
    }

    #[tokio::test(start_paused = true)]
    async fn enrichment_failure_keeps_base_results() {
        let store = Arc::new(MockDirectory {
            fail_placements: true,
            ..Default::default()
        });
        let handle = start(store.clone());

        handle.input("faena");
        time::sleep(Duration::from_millis(300)).await;

        let snap = handle.snapshot();
        assert_eq!(snap.phase, SearchPhase::Results);
        assert_eq!(snap.results.len(), 2);
        assert!(snap.results.iter().all(|h| h.org_unit.is_none()));
    }
}
