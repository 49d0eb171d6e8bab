mod bridge;
mod clock;
mod config;
mod db;
mod errors;
mod models;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::bridge::client::AgentClient;
use crate::bridge::poll::PollPolicy;
use crate::bridge::runner::SyncRunner;
use crate::bridge::Bridge;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::memory::MemoryNewsStore;
use crate::store::postgres::PgNewsStore;
use crate::store::NewsStore;

/// Per-request timeout for calls to the agent. Runs themselves are awaited by polling.
const AGENT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting news backend v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn NewsStore> = if config.database_url.starts_with("memory://") {
        info!("Using in-memory news store");
        Arc::new(MemoryNewsStore::new())
    } else {
        Arc::new(PgNewsStore::new(create_pool(&config.database_url).await?))
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let agent = AgentClient::new(&config.agent_url, AGENT_REQUEST_TIMEOUT)?;
    let policy = PollPolicy {
        interval: config.poll_interval,
        grace: config.poll_grace,
        max_attempts: config.poll_max_attempts,
    };
    info!("Agent at {} (poll policy: {policy:?})", config.agent_url);

    let bridge = Bridge::new(Arc::new(agent), store.clone(), clock.clone(), policy);
    let state = AppState {
        store,
        sync: SyncRunner::new(Arc::new(bridge), clock),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
