use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tonic_reflection::server::Builder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_grpc::{FrontDeskGrpc, auth_interceptor};
use api_rest::{AppState, router};
use api_shared::pb::front_desk_server::FrontDeskServer;
use api_shared::{AccessPolicy, FILE_DESCRIPTOR_SET};
use frontdesk_core::{CoreConfig, FrontDeskService, TableStore};

/// Main entry point for the front desk
///
/// Starts both servers concurrently over one shared store:
/// - gRPC on `FRONTDESK_GRPC_ADDR` (default 0.0.0.0:50051), requiring the `x-api-key` header
/// - REST on `FRONTDESK_REST_ADDR` (default 0.0.0.0:3000), with Swagger UI at `/swagger-ui`
///
/// # Environment Variables
/// - `FRONTDESK_DATA_DIR`: directory for the table files; unset keeps everything in memory
/// - `FRONTDESK_QUEUE_MODE`: `serialized` (default) or `compatible`
/// - `FRONTDESK_APPOINTMENT_PATIENT_LINK`: `enforce` (default) or `detached`
/// - `FRONTDESK_LOW_STOCK_THRESHOLD`, `FRONTDESK_EXPIRY_WINDOW_DAYS`: inventory alert settings
/// - `FRONTDESK_API_KEY`: API key for gRPC authentication
/// - `FRONTDESK_DEFAULT_ROLE`: role used when a request names none (default `admin`)
/// - `FRONTDESK_ENABLE_REFLECTION`: `true` to register gRPC reflection
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("frontdesk_core=info".parse()?)
                .add_directive("frontdesk_run=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let grpc_addr: SocketAddr = std::env::var("FRONTDESK_GRPC_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:50051".into())
        .parse()?;
    let rest_addr = std::env::var("FRONTDESK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::from_lookup(|key| std::env::var(key).ok())?);
    let access = Arc::new(AccessPolicy::from_lookup(|key| std::env::var(key).ok())?);
    let store = Arc::new(TableStore::from_config(&cfg)?);
    match store.data_dir() {
        Some(dir) => tracing::info!("tables persisted under {}", dir.display()),
        None => tracing::warn!("FRONTDESK_DATA_DIR not set; using an in-memory store"),
    }
    if !access.has_api_key() {
        tracing::warn!("FRONTDESK_API_KEY not set; every gRPC call will be refused");
    }
    tracing::info!(
        queue_mode = ?cfg.queue_mode(),
        default_role = %access.default_role(),
        "front desk configured"
    );

    let desk = FrontDeskService::new(store, cfg);

    tracing::info!("++ Starting front desk gRPC on {}", grpc_addr);
    tracing::info!("++ Starting front desk REST on {}", rest_addr);

    let rest_app = router(AppState {
        desk: desk.clone(),
        access: access.clone(),
    });
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    let rest_server = tokio::spawn(async move { axum::serve(listener, rest_app).await });

    let mut grpc_builder = Server::builder().add_service(FrontDeskServer::with_interceptor(
        FrontDeskGrpc::new(desk, access.clone()),
        auth_interceptor(access),
    ));
    if std::env::var("FRONTDESK_ENABLE_REFLECTION").is_ok_and(|v| v == "true") {
        let reflection_service = Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;
        grpc_builder = grpc_builder.add_service(reflection_service);
        tracing::info!("gRPC server reflection enabled");
    }
    let grpc_server = grpc_builder.serve(grpc_addr);

    // Run both
    let (rest_result, grpc_result) = tokio::join!(rest_server, grpc_server);
    rest_result??;
    grpc_result?;

    Ok(())
}
