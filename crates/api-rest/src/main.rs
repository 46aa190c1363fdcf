//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development when only the REST server (with OpenAPI/Swagger UI) is needed. The
//! workspace's main `frontdesk-run` binary runs gRPC and REST concurrently.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use api_shared::AccessPolicy;
use frontdesk_core::{CoreConfig, FrontDeskService, TableStore};

/// Starts the REST API on `FRONTDESK_REST_ADDR` (default `0.0.0.0:3000`).
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the data directory cannot be loaded,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("frontdesk_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("FRONTDESK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::from_lookup(|key| std::env::var(key).ok())?);
    let access = Arc::new(AccessPolicy::from_lookup(|key| std::env::var(key).ok())?);
    let store = Arc::new(TableStore::from_config(&cfg)?);
    match store.data_dir() {
        Some(dir) => tracing::info!("tables persisted under {}", dir.display()),
        None => tracing::warn!("FRONTDESK_DATA_DIR not set; using an in-memory store"),
    }

    tracing::info!("-- Starting front desk REST API on {}", addr);

    let app = router(AppState {
        desk: FrontDeskService::new(store, cfg),
        access,
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
