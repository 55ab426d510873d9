//! Error taxonomy shared by the dashboard widgets.
//!
//! Every failure is contained to the widget that raised it: callers turn
//! these into an inline message and keep rendering the rest of the view.

use thiserror::Error;

use crate::assets::AssetError;
use crate::db::StoreError;

#[derive(Error, Debug)]
pub enum DashboardError {
    /// The store or the network reported an error.
    #[error("{section}: {source}")]
    QueryFailure {
        section: &'static str,
        #[source]
        source: StoreError,
    },

    /// The blob store rejected an asset operation.
    #[error("Storage error: {0}")]
    StorageFailure(#[from] AssetError),

    /// Rejected input (unsupported file type, declined confirmation).
    #[error("{0}")]
    ValidationFailure(String),

    /// The session role does not allow this operation.
    #[error("Operation requires the health-staff role")]
    PermissionDenied,
}

impl DashboardError {
    pub fn query(section: &'static str, source: StoreError) -> Self {
        Self::QueryFailure { section, source }
    }

    /// Message shown inline in the affected widget.
    pub fn inline_message(&self) -> String {
        match self {
            Self::QueryFailure { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }
}
