use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "Vigia";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Quiet period after the last keystroke before a worker search is issued.
pub const SEARCH_DEBOUNCE_MS: u64 = 280;
/// Maximum rows returned by a worker directory search.
pub const SEARCH_RESULT_LIMIT: usize = 20;
/// Maximum rows per record list (labs, hygiene, appointments).
pub const RECORD_LIST_LIMIT: usize = 200;
/// Maximum images listed in the recommendation gallery.
pub const GALLERY_LIMIT: usize = 100;

/// Storage bucket holding shared recommendation assets.
pub const ASSET_BUCKET: &str = "recomendaciones";
/// Object key of the global recommendations PDF.
pub const GLOBAL_PDF_KEY: &str = "global.pdf";
/// Key prefix for gallery images.
pub const IMAGE_PREFIX: &str = "imagenes";

/// Environment prefix for `DashboardConfig` overrides (`VIGIA_SEARCH_LIMIT`, ...).
const ENV_PREFIX: &str = "VIGIA";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "vigia_lib=info,vigia=info,warn"
}

/// Get the application data directory
/// ~/Vigia/ on all platforms, falling back to the temp dir when no home exists.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Root of the filesystem blob store.
pub fn storage_dir() -> PathBuf {
    app_data_dir().join("storage")
}

/// Local record store database.
pub fn database_path() -> PathBuf {
    app_data_dir().join("vigia.db")
}

/// Tunables for the dashboard pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub search_debounce_ms: u64,
    pub search_limit: usize,
    pub detail_limit: usize,
    pub gallery_limit: usize,
    /// Embedded third-party portal shown in its own tab. Not used by the core.
    pub external_portal_url: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: SEARCH_DEBOUNCE_MS,
            search_limit: SEARCH_RESULT_LIMIT,
            detail_limit: RECORD_LIST_LIMIT,
            gallery_limit: GALLERY_LIMIT,
            external_portal_url: None,
        }
    }
}

impl DashboardConfig {
    /// Defaults overridden by `VIGIA_*` environment variables.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_and_database_under_app_data() {
        let app = app_data_dir();
        assert!(app.ends_with("Vigia"));
        assert!(storage_dir().starts_with(&app));
        assert!(database_path().starts_with(&app));
    }

    #[test]
    fn defaults_match_constants() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.search_debounce(), Duration::from_millis(280));
        assert_eq!(cfg.search_limit, 20);
        assert_eq!(cfg.detail_limit, 200);
        assert_eq!(cfg.gallery_limit, 100);
        assert!(cfg.external_portal_url.is_none());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: DashboardConfig = serde_json::from_str(r#"{"search_limit": 5}"#).unwrap();
        assert_eq!(cfg.search_limit, 5);
        assert_eq!(cfg.search_debounce_ms, SEARCH_DEBOUNCE_MS);
    }

    #[test]
    fn app_name_is_vigia() {
        assert_eq!(APP_NAME, "Vigia");
    }
}
