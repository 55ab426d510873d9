//! Session provider capability and session resolution.
//!
//! Authentication itself lives outside the core. The core only needs the
//! current user and a stream of auth-state changes; on each change the
//! role is resolved again from the user's account row.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::authorization::SessionContext;
use crate::dashboard::Section;
use crate::db::repository::fetch_account_by_email;
use crate::db::{RecordStore, StoreError};
use crate::models::UserAccount;

/// Buffered auth events per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 16;

const POISONED_SLOT: &str = "user slot lock poisoned";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_user(&self) -> Result<Option<SessionUser>, StoreError>;

    /// Auth-state changes (sign-in, sign-out, token refresh).
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// A signed-in session with its resolved role and the account row it came from.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub context: SessionContext,
    pub account: Section<Option<UserAccount>>,
}

/// Resolve the current user and role. `Ok(None)` when nobody is signed in.
///
/// A failed account lookup does not fail the session: the role falls back
/// to worker and the profile widget shows the error.
pub async fn resolve_session(
    provider: &dyn SessionProvider,
    store: &dyn RecordStore,
) -> Result<Option<ResolvedSession>, StoreError> {
    let Some(user) = provider.current_user().await? else {
        return Ok(None);
    };

    let lookup = match user.email.as_deref() {
        Some(email) => fetch_account_by_email(store, email).await,
        None => Ok(None),
    };
    let account = Section::from_result("profile", lookup);
    let context = SessionContext::new(user, account.data().and_then(Option::as_ref));

    tracing::info!(
        user_id = %context.user.id,
        role = context.role().as_str(),
        "Session resolved"
    );

    Ok(Some(ResolvedSession { context, account }))
}

// ═══════════════════════════════════════════════════════════
// StaticSessionProvider
// ═══════════════════════════════════════════════════════════

/// In-process provider: the embedding application signs users in and out
/// explicitly. Used by the binary and by tests.
pub struct StaticSessionProvider {
    user: RwLock<Option<SessionUser>>,
    events: broadcast::Sender<AuthEvent>,
}

impl StaticSessionProvider {
    pub fn new(user: Option<SessionUser>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            user: RwLock::new(user),
            events,
        }
    }

    pub fn sign_in(&self, user: SessionUser) -> Result<(), StoreError> {
        *self.user.write().map_err(|_| slot_poisoned())? = Some(user);
        self.emit(AuthEvent::SignedIn);
        Ok(())
    }

    pub fn sign_out(&self) -> Result<(), StoreError> {
        *self.user.write().map_err(|_| slot_poisoned())? = None;
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    pub fn refresh_token(&self) {
        self.emit(AuthEvent::TokenRefreshed);
    }

    fn emit(&self, event: AuthEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

fn slot_poisoned() -> StoreError {
    StoreError::Session(POISONED_SLOT.into())
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn current_user(&self) -> Result<Option<SessionUser>, StoreError> {
        let guard = self.user.read().map_err(|_| slot_poisoned())?;
        Ok(guard.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::Role;
    use crate::db::{Query, Row, SqliteRecordStore};

    fn user(email: &str) -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            email: Some(email.into()),
        }
    }

    fn store() -> SqliteRecordStore {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        store
            .execute_batch(
                "INSERT INTO usuarios (rut, nombre, email, rol) VALUES
                 ('11-1', 'Ana Rojas', 'ana@faena.cl', 'trabajador'),
                 ('22-2', 'Mariana Soto', 'msoto@faena.cl', 'SALUD');",
            )
            .unwrap();
        store
    }

    struct FailingStore;

    #[async_trait]
    impl RecordStore for FailingStore {
        async fn query(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
            Err(StoreError::Query {
                table: query.table.as_str().into(),
                message: "network down".into(),
            })
        }
    }

    #[tokio::test]
    async fn no_user_means_no_session() {
        let provider = StaticSessionProvider::new(None);
        assert!(resolve_session(&provider, &store()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn staff_role_resolved_from_account() {
        let provider = StaticSessionProvider::new(Some(user("msoto@faena.cl")));
        let session = resolve_session(&provider, &store()).await.unwrap().unwrap();
        assert_eq!(session.context.role(), Role::HealthStaff);
        assert_eq!(session.context.national_id.as_deref(), Some("22-2"));
    }

    #[tokio::test]
    async fn unknown_account_is_worker() {
        let provider = StaticSessionProvider::new(Some(user("nuevo@faena.cl")));
        let session = resolve_session(&provider, &store()).await.unwrap().unwrap();
        assert_eq!(session.context.role(), Role::Worker);
        assert!(matches!(session.account, Section::Loaded { data: None }));
    }

    #[tokio::test]
    async fn failed_lookup_degrades_to_worker() {
        let provider = StaticSessionProvider::new(Some(user("msoto@faena.cl")));
        let session = resolve_session(&provider, &FailingStore).await.unwrap().unwrap();
        assert_eq!(session.context.role(), Role::Worker);
        assert!(session.account.is_failed());
    }

    #[tokio::test]
    async fn sign_in_and_out_emit_events() {
        let provider = StaticSessionProvider::new(None);
        let mut events = provider.subscribe();
        provider.sign_in(user("ana@faena.cl")).unwrap();
        provider.refresh_token();
        provider.sign_out().unwrap();
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedIn);
        assert_eq!(events.recv().await.unwrap(), AuthEvent::TokenRefreshed);
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
        assert!(provider.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn poisoned_user_slot_is_a_session_error() {
        let provider = std::sync::Arc::new(StaticSessionProvider::new(None));
        let holder = provider.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.user.write().unwrap();
            panic!("poison the slot");
        })
        .join();

        let err = provider.current_user().await.unwrap_err();
        assert!(matches!(err, StoreError::Session(_)));
        assert!(matches!(provider.sign_out(), Err(StoreError::Session(_))));
    }
}
