pub mod api; // HTTP surface
pub mod config;
pub mod db;
pub mod export; // CSV export
pub mod models;
pub mod pipeline; // inference clients + labeling pipeline
pub mod review; // human corrections
pub mod sessions; // Session Store

use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use crate::api::types::SharedStore;
use crate::api::{start_server, ApiContext, ServerError};
use crate::config::AppConfig;
use crate::db::SqliteKvStore;
use crate::models::LlmBackend;
use crate::pipeline::inference::LlmProvider;
use crate::sessions::SessionStore;

/// Install the global tracing subscriber. `RUST_LOG` wins over the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}

/// Start the service and block until Ctrl-C.
///
/// The session database is opened before the listener binds and closed
/// after the server has drained.
pub async fn run() -> Result<(), ServerError> {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    if config.inference.backend == LlmBackend::Anthropic && config.inference.api_key.is_none() {
        tracing::warn!("ANTHROPIC_API_KEY is not set; labeling requests will fail");
    }

    let store = SessionStore::new(SqliteKvStore::open(&config.db_path)?);
    let store: SharedStore = Arc::new(Mutex::new(store));
    let provider: Arc<dyn LlmProvider> = Arc::new(config.inference.clone());
    let ctx = ApiContext::new(store.clone(), provider, config.labeling.clone());

    let server = start_server(ctx, config.bind).await?;
    tracing::info!(
        addr = %server.addr,
        started_at = %server.started_at.to_rfc3339(),
        db = %config.db_path.display(),
        backend = config.inference.backend.as_str(),
        model = %config.inference.model,
        "Listening"
    );

    tokio::signal::ctrl_c().await?;
    server.stop().await;
    close_store(store)
}

fn close_store(store: SharedStore) -> Result<(), ServerError> {
    match Arc::try_unwrap(store) {
        Ok(mutex) => {
            let store = mutex.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
            store.close()?;
            tracing::info!("Session store closed");
        }
        Err(_) => tracing::warn!("Session store still referenced at shutdown, leaving it open"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_store_releases_sole_owner() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(SqliteKvStore::open(&dir.path().join("s.db")).unwrap());
        let shared: SharedStore = Arc::new(Mutex::new(store));
        assert!(close_store(shared).is_ok());
    }

    #[test]
    fn close_store_tolerates_outstanding_handle() {
        let store = SessionStore::new(SqliteKvStore::open_in_memory().unwrap());
        let shared: SharedStore = Arc::new(Mutex::new(store));
        let _other = shared.clone();
        assert!(close_store(shared).is_ok());
    }
}
