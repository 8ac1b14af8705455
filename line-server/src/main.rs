use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use line_server::pool::{LinePoolAggregator, default_brt_pool};
use line_server::resolver::{ResolverConfig, ScheduleResolver};
use line_server::status::{StatusConfig, StatusResolver};
use line_server::store::ScheduleStore;
use line_server::topology::default_rail_topology;
use line_server::upstream::{UpstreamClient, UpstreamConfig};
use line_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,line_server=debug")),
        )
        .init();

    let base_url = std::env::var("UPSTREAM_BASE_URL").unwrap_or_else(|_| {
        tracing::warn!("UPSTREAM_BASE_URL not set; upstream calls will fail");
        String::new()
    });
    let db_path = std::env::var("SCHEDULE_DB_PATH").unwrap_or_else(|_| "schedule_cache.db".into());

    // Upstream client
    let upstream_config = UpstreamConfig::new(&base_url);
    let upstream =
        Arc::new(UpstreamClient::new(upstream_config).expect("Failed to create upstream client"));

    // Persistent store
    let store = ScheduleStore::open(&db_path)
        .await
        .expect("Failed to open schedule store");
    tracing::info!(db_path, "schedule store ready");

    // Resolver graph
    let schedules = Arc::new(ScheduleResolver::new(
        upstream.clone(),
        store,
        ResolverConfig::default(),
    ));
    let pool = Arc::new(LinePoolAggregator::new(
        default_brt_pool(),
        schedules.clone(),
    ));
    let status = Arc::new(StatusResolver::new(
        upstream,
        schedules.clone(),
        pool.clone(),
        Arc::new(default_rail_topology()),
        StatusConfig::default(),
    ));

    let state = AppState::new(schedules, pool, status);
    let app = create_router(state);

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".into())
        .parse()
        .expect("Invalid BIND_ADDR");
    tracing::info!(%addr, "line server listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server error");
}
