pub mod config;
pub mod models;
pub mod db;
pub mod intelligence; // Metrics, thresholds, recommendations
pub mod banner;
pub mod authorization; // Role gate
pub mod session;
pub mod dashboard;
pub mod supervisor; // Worker search + detail (health staff)
pub mod assets; // Recommendation PDF + image gallery
pub mod core_state;
pub mod error;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}
