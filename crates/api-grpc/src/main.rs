//! Standalone gRPC server binary.
//!
//! Useful when only the gRPC surface is needed. The workspace's `frontdesk-run` binary runs gRPC
//! and REST together over one store.

use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tonic_reflection::server::Builder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_grpc::{auth_interceptor, pb::front_desk_server::FrontDeskServer, FrontDeskGrpc};
use api_shared::{AccessPolicy, FILE_DESCRIPTOR_SET};
use frontdesk_core::{CoreConfig, FrontDeskService, TableStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("frontdesk_core=info".parse()?)
                .add_directive("api_grpc=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = std::env::var("FRONTDESK_GRPC_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:50051".into())
        .parse()?;

    let cfg = Arc::new(CoreConfig::from_lookup(|key| std::env::var(key).ok())?);
    let access = Arc::new(AccessPolicy::from_lookup(|key| std::env::var(key).ok())?);
    let store = Arc::new(TableStore::from_config(&cfg)?);
    if !access.has_api_key() {
        tracing::warn!("FRONTDESK_API_KEY not set; every gRPC call will be refused");
    }

    tracing::info!("-- Starting front desk gRPC on {}", addr);

    let svc = FrontDeskGrpc::new(FrontDeskService::new(store, cfg), access.clone());
    let mut server_builder = Server::builder().add_service(FrontDeskServer::with_interceptor(
        svc,
        auth_interceptor(access),
    ));

    if std::env::var("FRONTDESK_ENABLE_REFLECTION").unwrap_or_else(|_| "false".to_string())
        == "true"
    {
        let reflection_service = Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;
        server_builder = server_builder.add_service(reflection_service);
        tracing::info!("gRPC server reflection enabled");
    } else {
        tracing::info!("gRPC server reflection disabled");
    }

    server_builder.serve(addr).await?;

    Ok(())
}
