//! Process-wide dashboard state.
//!
//! `CoreState` owns the collaborators (record store, session provider,
//! blob store) and the little state that outlives one load: the current
//! `SessionContext`, the alert banner and the running worker search. The
//! context is replaced wholesale on every auth event and dropped on
//! sign-out, together with any search it started.

use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::assets::{self, BlobStore, GalleryImage, UploadFile, UploadOutcome};
use crate::authorization::SessionContext;
use crate::banner::{AlertBanner, AlertBannerController};
use crate::config::DashboardConfig;
use crate::dashboard::{load_dashboard, Dashboard, Section};
use crate::db::{RecordStore, StoreError};
use crate::error::DashboardError;
use crate::session::{resolve_session, AuthEvent, SessionProvider};
use crate::supervisor::{
    load_worker_detail, spawn_search, SearchHandle, SearchSnapshot, WorkerDetail,
};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("No active session")]
    NoActiveSession,
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Session resolution failed: {0}")]
    Session(#[from] StoreError),
}

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    store: Arc<dyn RecordStore>,
    sessions: Arc<dyn SessionProvider>,
    blobs: Arc<dyn BlobStore>,
    pub config: DashboardConfig,
    /// `None` when signed out.
    context: RwLock<Option<SessionContext>>,
    banner: Mutex<AlertBannerController>,
    /// Only ever set under a health-staff context.
    search: Mutex<Option<SearchHandle>>,
    dashboard: watch::Sender<Option<Dashboard>>,
}

impl CoreState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        sessions: Arc<dyn SessionProvider>,
        blobs: Arc<dyn BlobStore>,
        config: DashboardConfig,
    ) -> Self {
        let (dashboard, _) = watch::channel(None);
        Self {
            store,
            sessions,
            blobs,
            config,
            context: RwLock::new(None),
            banner: Mutex::new(AlertBannerController::new()),
            search: Mutex::new(None),
            dashboard,
        }
    }

    // ── Session ─────────────────────────────────────────────

    /// Current session context (owned copy).
    pub fn session(&self) -> Result<Option<SessionContext>, CoreError> {
        let guard = self.context.read().map_err(|_| CoreError::LockPoisoned)?;
        Ok(guard.clone())
    }

    fn require_session(&self) -> Result<SessionContext, CoreError> {
        self.session()?.ok_or(CoreError::NoActiveSession)
    }

    /// Replace the context. A running search survives only when the same
    /// user is still health staff.
    fn set_session(&self, context: Option<SessionContext>) -> Result<(), CoreError> {
        let keep_search = {
            let mut guard = self.context.write().map_err(|_| CoreError::LockPoisoned)?;
            let keep = match (guard.as_ref(), context.as_ref()) {
                (Some(old), Some(new)) => new.is_health_staff() && old.user.id == new.user.id,
                _ => false,
            };
            *guard = context;
            keep
        };
        if !keep_search {
            self.stop_search()?;
        }
        Ok(())
    }

    /// Drop the session, the search, the banner and the published dashboard.
    pub fn clear_session(&self) -> Result<(), CoreError> {
        self.set_session(None)?;
        self.banner
            .lock()
            .map_err(|_| CoreError::LockPoisoned)?
            .begin_cycle();
        self.dashboard.send_replace(None);
        tracing::info!("Session cleared");
        Ok(())
    }

    // ── Banner & dashboard ──────────────────────────────────

    pub fn banner(&self) -> Result<AlertBanner, CoreError> {
        let guard = self.banner.lock().map_err(|_| CoreError::LockPoisoned)?;
        Ok(guard.current().clone())
    }

    /// Latest dashboard, updated by every refresh.
    pub fn subscribe_dashboard(&self) -> watch::Receiver<Option<Dashboard>> {
        self.dashboard.subscribe()
    }

    /// Resolve the session and reload the own-data dashboard.
    ///
    /// Returns `Ok(None)` when nobody is signed in. When the provider fails
    /// the previous session is dropped before the error is returned.
    pub async fn refresh(&self, now: DateTime<Utc>) -> Result<Option<Dashboard>, CoreError> {
        let resolved = match resolve_session(self.sessions.as_ref(), self.store.as_ref()).await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(error = %e, "Session resolution failed, signing out");
                self.clear_session()?;
                return Err(e.into());
            }
        };
        let Some(session) = resolved else {
            self.clear_session()?;
            return Ok(None);
        };
        self.set_session(Some(session.context.clone()))?;

        let mut dashboard =
            load_dashboard(&session, self.store.as_ref(), &self.config, now).await;

        // One cycle per refresh, swapped in whole.
        let mut cycle = AlertBannerController::new();
        if dashboard.banner.is_visible() {
            cycle.raise(dashboard.banner.clone());
        }
        dashboard.banner = cycle.current().clone();
        *self.banner.lock().map_err(|_| CoreError::LockPoisoned)? = cycle;

        self.dashboard.send_replace(Some(dashboard.clone()));
        Ok(Some(dashboard))
    }

    /// React to an auth-state change. Sign-out drops the session without
    /// touching the store; every other event re-resolves it.
    pub async fn handle_auth_event(
        &self,
        event: AuthEvent,
        now: DateTime<Utc>,
    ) -> Result<Option<Dashboard>, CoreError> {
        tracing::info!(event = ?event, "Auth state changed");
        match event {
            AuthEvent::SignedOut => {
                self.clear_session()?;
                Ok(None)
            }
            AuthEvent::SignedIn | AuthEvent::TokenRefreshed => self.refresh(now).await,
        }
    }

    /// Follow the provider's auth events until the channel closes.
    pub fn watch_auth(self: Arc<Self>) -> JoinHandle<()> {
        let mut events = self.sessions.subscribe();
        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth events lagged, refreshing");
                        AuthEvent::TokenRefreshed
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if let Err(e) = self.handle_auth_event(event, Utc::now()).await {
                    tracing::error!(error = %e, "Dashboard refresh failed");
                }
            }
        })
    }

    // ── Supervisor ──────────────────────────────────────────

    /// Start (or restart) the worker search and return its snapshots.
    /// `None` unless the session is health staff.
    ///
    /// The search is owned here and stops when the session is cleared or
    /// loses the health-staff role; the receiver then reports closed.
    pub fn start_search(&self) -> Result<Option<watch::Receiver<SearchSnapshot>>, CoreError> {
        let ctx = self.require_session()?;
        let Some(access) = ctx.staff_access() else {
            return Ok(None);
        };
        let handle = spawn_search(access, self.store.clone(), &self.config);
        let snapshots = handle.subscribe();
        *self.search.lock().map_err(|_| CoreError::LockPoisoned)? = Some(handle);
        Ok(Some(snapshots))
    }

    /// Feed a keystroke to the running search. `false` when none is running.
    pub fn search_input(&self, raw: &str) -> Result<bool, CoreError> {
        let guard = self.search.lock().map_err(|_| CoreError::LockPoisoned)?;
        let Some(handle) = guard.as_ref() else {
            return Ok(false);
        };
        handle.input(raw);
        Ok(true)
    }

    /// Clear the running search's query. `false` when none is running.
    pub fn clear_search(&self) -> Result<bool, CoreError> {
        let guard = self.search.lock().map_err(|_| CoreError::LockPoisoned)?;
        let Some(handle) = guard.as_ref() else {
            return Ok(false);
        };
        handle.clear();
        Ok(true)
    }

    fn stop_search(&self) -> Result<(), CoreError> {
        let stopped = self
            .search
            .lock()
            .map_err(|_| CoreError::LockPoisoned)?
            .take();
        if stopped.is_some() {
            tracing::info!("Worker search stopped");
        }
        Ok(())
    }

    pub async fn worker_detail(
        &self,
        national_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<WorkerDetail>, CoreError> {
        let ctx = self.require_session()?;
        Ok(load_worker_detail(&ctx, self.store.as_ref(), national_id, &self.config, now).await)
    }

    // ── Recommendation assets ───────────────────────────────

    pub fn global_pdf_url(&self) -> String {
        assets::global_pdf_url(self.blobs.as_ref())
    }

    pub async fn gallery(&self) -> Result<Section<Vec<GalleryImage>>, CoreError> {
        let ctx = self.require_session()?;
        Ok(assets::load_gallery(&ctx, self.blobs.as_ref(), &self.config).await)
    }

    pub async fn upload_assets(
        &self,
        files: Vec<UploadFile>,
        now: DateTime<Utc>,
    ) -> Result<Vec<UploadOutcome>, DashboardError> {
        let ctx = self
            .require_session()
            .map_err(|_| DashboardError::PermissionDenied)?;
        assets::upload_assets(&ctx, self.blobs.as_ref(), files, now).await
    }

    pub async fn delete_image(&self, name: &str, confirmed: bool) -> Result<(), DashboardError> {
        let ctx = self
            .require_session()
            .map_err(|_| DashboardError::PermissionDenied)?;
        assets::delete_image(&ctx, self.blobs.as_ref(), name, confirmed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::FsBlobStore;
    use crate::authorization::Role;
    use crate::banner::BannerKind;
    use crate::db::{Query, Row, SqliteRecordStore};
    use crate::session::{SessionUser, StaticSessionProvider};
    use crate::supervisor::SearchPhase;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn user(email: &str) -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            email: Some(email.into()),
        }
    }

    fn seeded() -> SqliteRecordStore {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        store
            .execute_batch(
                "INSERT INTO usuarios (rut, nombre, email, rol) VALUES
                 ('11-1', 'Ana Rojas', 'ana@faena.cl', 'trabajador'),
                 ('22-2', 'Mariana Soto', 'msoto@faena.cl', 'salud');
                 INSERT INTO trabajadores (rut, nombre, peso_kg, altura_cm) VALUES
                 ('11-1', 'Ana Rojas', '80', '170'),
                 ('22-2', 'Mariana Soto', '60', '165');",
            )
            .unwrap();
        store
    }

    fn core_with(
        store: impl RecordStore + 'static,
        sessions: Arc<dyn SessionProvider>,
    ) -> (tempfile::TempDir, Arc<CoreState>) {
        let dir = tempfile::tempdir().unwrap();
        let core = Arc::new(CoreState::new(
            Arc::new(store),
            sessions,
            Arc::new(FsBlobStore::new(dir.path())),
            DashboardConfig::default(),
        ));
        (dir, core)
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        sessions: Arc<StaticSessionProvider>,
        core: Arc<CoreState>,
    }

    fn fixture(signed_in: Option<&str>) -> Fixture {
        let sessions = Arc::new(StaticSessionProvider::new(signed_in.map(user)));
        let (dir, core) = core_with(seeded(), sessions.clone());
        Fixture {
            _dir: dir,
            sessions,
            core,
        }
    }

    /// Provider whose `current_user` can be switched to fail.
    struct FlakySessions {
        inner: StaticSessionProvider,
        failing: AtomicBool,
    }

    #[async_trait]
    impl SessionProvider for FlakySessions {
        async fn current_user(&self) -> Result<Option<SessionUser>, StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Session("token expired".into()));
            }
            self.inner.current_user().await
        }

        fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
            self.inner.subscribe()
        }
    }

    /// Hands out one queued user per `current_user` call.
    struct QueuedSessions {
        users: Mutex<VecDeque<SessionUser>>,
        events: broadcast::Sender<AuthEvent>,
    }

    #[async_trait]
    impl SessionProvider for QueuedSessions {
        async fn current_user(&self) -> Result<Option<SessionUser>, StoreError> {
            Ok(self.users.lock().unwrap().pop_front())
        }

        fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
            self.events.subscribe()
        }
    }

    /// Yields before every query so concurrent loads interleave.
    struct Yielding(SqliteRecordStore);

    #[async_trait]
    impl RecordStore for Yielding {
        async fn query(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
            tokio::task::yield_now().await;
            self.0.query(query).await
        }
    }

    #[tokio::test]
    async fn refresh_sets_context_and_banner() {
        let f = fixture(Some("ana@faena.cl"));
        let dashboard = f.core.refresh(now()).await.unwrap().unwrap();
        assert_eq!(dashboard.role, Role::Worker);
        assert_eq!(dashboard.banner.kind, BannerKind::Warning);
        assert_eq!(f.core.banner().unwrap().kind, BannerKind::Warning);
        assert_eq!(
            f.core.session().unwrap().unwrap().national_id.as_deref(),
            Some("11-1")
        );
        assert!(f.core.subscribe_dashboard().borrow().is_some());
    }

    #[tokio::test]
    async fn sign_out_drops_role_and_banner() {
        let f = fixture(Some("msoto@faena.cl"));
        f.core.refresh(now()).await.unwrap();
        assert!(f.core.session().unwrap().unwrap().is_health_staff());

        f.sessions.sign_out().unwrap();
        let out = f
            .core
            .handle_auth_event(AuthEvent::SignedOut, now())
            .await
            .unwrap();
        assert!(out.is_none());
        assert!(f.core.session().unwrap().is_none());
        assert!(!f.core.banner().unwrap().is_visible());
        assert!(matches!(
            f.core.start_search(),
            Err(CoreError::NoActiveSession)
        ));
        let err = f.core.delete_image("a.png", true).await.unwrap_err();
        assert!(matches!(err, DashboardError::PermissionDenied));
    }

    #[tokio::test(start_paused = true)]
    async fn sign_out_stops_a_running_search() {
        let f = fixture(Some("msoto@faena.cl"));
        f.core.refresh(now()).await.unwrap();
        let mut snapshots = f.core.start_search().unwrap().unwrap();

        assert!(f.core.search_input("ana").unwrap());
        tokio::time::sleep(Duration::from_millis(400)).await;
        let snapshot = snapshots.borrow_and_update().clone();
        assert_eq!(snapshot.phase, SearchPhase::Results);
        assert_eq!(snapshot.results.len(), 2);

        f.sessions.sign_out().unwrap();
        f.core
            .handle_auth_event(AuthEvent::SignedOut, now())
            .await
            .unwrap();

        assert!(!f.core.search_input("mariana").unwrap());
        assert!(!f.core.clear_search().unwrap());
        let closed = tokio::time::timeout(Duration::from_secs(1), async {
            while snapshots.changed().await.is_ok() {}
        })
        .await;
        assert!(closed.is_ok(), "search task still running after sign-out");
    }

    #[tokio::test]
    async fn role_follows_the_new_user_after_switch() {
        let f = fixture(Some("msoto@faena.cl"));
        f.core.refresh(now()).await.unwrap();
        assert!(f.core.start_search().unwrap().is_some());
        assert!(f.core.search_input("a").unwrap());

        f.sessions.sign_in(user("ana@faena.cl")).unwrap();
        f.core
            .handle_auth_event(AuthEvent::SignedIn, now())
            .await
            .unwrap();
        assert_eq!(f.core.session().unwrap().unwrap().role(), Role::Worker);
        assert!(!f.core.search_input("an").unwrap());
        assert!(f.core.start_search().unwrap().is_none());
        assert!(f.core.worker_detail("22-2", now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_resolution_drops_the_previous_role() {
        let sessions = Arc::new(FlakySessions {
            inner: StaticSessionProvider::new(Some(user("msoto@faena.cl"))),
            failing: AtomicBool::new(false),
        });
        let (_dir, core) = core_with(seeded(), sessions.clone());
        core.refresh(now()).await.unwrap();
        assert!(core.start_search().unwrap().is_some());

        sessions.failing.store(true, Ordering::SeqCst);
        let err = core
            .handle_auth_event(AuthEvent::TokenRefreshed, now())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Session(StoreError::Session(_))));
        assert!(core.session().unwrap().is_none());
        assert!(!core.search_input("ana").unwrap());
        assert!(core.subscribe_dashboard().borrow().is_none());
    }

    #[tokio::test]
    async fn overlapping_refreshes_keep_their_own_banner() {
        let store = seeded();
        store
            .execute_batch(
                "UPDATE trabajadores SET peso_kg = '95' WHERE rut = '11-1';",
            )
            .unwrap();
        let (events, _) = broadcast::channel(4);
        let sessions = Arc::new(QueuedSessions {
            users: Mutex::new(VecDeque::from([user("ana@faena.cl"), user("msoto@faena.cl")])),
            events,
        });
        let (_dir, core) = core_with(Yielding(store), sessions);

        let (first, second) = tokio::join!(core.refresh(now()), core.refresh(now()));
        let first = first.unwrap().unwrap();
        let second = second.unwrap().unwrap();

        assert_eq!(first.banner.kind, BannerKind::Danger);
        assert!(!second.banner.is_visible());
        assert!(second.supervisor_enabled);
    }

    #[tokio::test]
    async fn nobody_signed_in_yields_no_dashboard() {
        let f = fixture(None);
        assert!(f.core.refresh(now()).await.unwrap().is_none());
        assert!(f.core.session().unwrap().is_none());
    }

    #[tokio::test]
    async fn watcher_follows_provider_events() {
        let f = fixture(None);
        let mut dashboards = f.core.subscribe_dashboard();
        let task = f.core.clone().watch_auth();

        f.sessions.sign_in(user("msoto@faena.cl")).unwrap();
        dashboards.changed().await.unwrap();
        assert!(dashboards.borrow().as_ref().unwrap().supervisor_enabled);

        f.sessions.sign_out().unwrap();
        dashboards.changed().await.unwrap();
        assert!(dashboards.borrow().is_none());
        task.abort();
    }
}
