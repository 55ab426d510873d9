//! Role gate.
//!
//! The session role is resolved once per authentication event and carried
//! as an explicit `SessionContext` value into every gated operation.
//! Gated operations ask the context for a `StaffAccess` proof; there is no
//! mutable role flag to go stale across a sign-out.
//!
//! Default-deny: any role value other than "salud" is the worker role.

use serde::{Deserialize, Serialize};

use crate::models::UserAccount;
use crate::session::SessionUser;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Session role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Least privileged: own data only.
    #[default]
    Worker,
    /// Cross-worker search, drill-down and asset management.
    HealthStaff,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Worker => "worker",
            Self::HealthStaff => "health_staff",
        }
    }
}

/// UI affordances that depend on the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    /// Supervisor tab with the worker search.
    WorkerSearch,
    AssetUpload,
    AssetDelete,
}

/// Map the raw role column to a `Role`.
pub fn resolve_role(raw: Option<&str>) -> Role {
    match raw.map(str::to_lowercase).as_deref() {
        Some("salud") => Role::HealthStaff,
        _ => Role::Worker,
    }
}

// ═══════════════════════════════════════════════════════════
// Session context
// ═══════════════════════════════════════════════════════════

/// Who is signed in and with which role. Replaced wholesale on every
/// auth-state change.
/// Serialize-only: a context is built from the account row, never decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionContext {
    pub user: SessionUser,
    /// Identifier linking the login to worker records, when known.
    pub national_id: Option<String>,
    role: Role,
}

impl SessionContext {
    pub fn new(user: SessionUser, account: Option<&UserAccount>) -> Self {
        Self {
            user,
            national_id: account.and_then(|a| a.national_id.clone()),
            role: resolve_role(account.and_then(|a| a.role.as_deref())),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_health_staff(&self) -> bool {
        self.role == Role::HealthStaff
    }

    /// Proof of health-staff role, or `None` for workers.
    pub fn staff_access(&self) -> Option<StaffAccess<'_>> {
        self.is_health_staff().then_some(StaffAccess { context: self })
    }

    pub fn permits(&self, affordance: Affordance) -> bool {
        match affordance {
            Affordance::WorkerSearch
            | Affordance::AssetUpload
            | Affordance::AssetDelete => self.is_health_staff(),
        }
    }
}

/// Evidence that the caller holds the health-staff role. Only obtainable
/// through `SessionContext::staff_access`.
#[derive(Debug, Clone, Copy)]
pub struct StaffAccess<'a> {
    context: &'a SessionContext,
}

impl<'a> StaffAccess<'a> {
    pub fn context(&self) -> &'a SessionContext {
        self.context
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
