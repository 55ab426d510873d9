use std::sync::Arc;

use uuid::Uuid;

use vigia_lib::assets::FsBlobStore;
use vigia_lib::config::{self, DashboardConfig};
use vigia_lib::core_state::CoreState;
use vigia_lib::db::SqliteRecordStore;
use vigia_lib::session::{SessionUser, StaticSessionProvider};

/// Signed-in user's email for the local session.
const USER_EMAIL_VAR: &str = "VIGIA_USER_EMAIL";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    vigia_lib::init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let dashboard_config = DashboardConfig::from_env()?;

    let data_dir = config::app_data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let store = SqliteRecordStore::open(&config::database_path())?;

    let user = std::env::var(USER_EMAIL_VAR).ok().map(|email| SessionUser {
        id: Uuid::new_v4(),
        email: Some(email),
    });
    if user.is_none() {
        tracing::warn!("{USER_EMAIL_VAR} not set; no one is signed in");
    }

    let core = CoreState::new(
        Arc::new(store),
        Arc::new(StaticSessionProvider::new(user)),
        Arc::new(FsBlobStore::new(config::storage_dir())),
        dashboard_config,
    );

    match core.refresh(chrono::Utc::now()).await? {
        Some(dashboard) => println!("{}", serde_json::to_string_pretty(&dashboard)?),
        None => println!("null"),
    }
    Ok(())
}
