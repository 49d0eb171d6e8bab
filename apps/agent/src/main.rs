mod annotate;
mod clock;
mod config;
mod errors;
mod llm_client;
mod models;
mod orchestrator;
mod report;
mod routes;
mod sources;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::annotate::Annotator;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::llm_client::catalog::{load_models, ModelCatalog};
use crate::llm_client::{ChatModel, LlmClient};
use crate::orchestrator::collection::DailyCollection;
use crate::orchestrator::status::StatusTracker;
use crate::orchestrator::Orchestrator;
use crate::report::builder::ReportBuilder;
use crate::report::store::ReportStore;
use crate::routes::build_router;
use crate::sources::reader::{HttpFeedFetcher, SourceReader};
use crate::sources::{default_sources, load_sources};
use crate::state::AppState;

/// Pause between consecutive feed downloads.
const POLITENESS_DELAY: Duration = Duration::from_secs(1);

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

    info!("Starting AI news agent v{}", env!("CARGO_PKG_VERSION"));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let sources = match &config.sources_file {
        Some(path) => load_sources(path)?,
        None => default_sources(),
    };
    info!("Loaded {} feed sources", sources.len());

    let llm = LlmClient::new(
        &config.llm_base_url,
        config.llm_api_key.clone(),
        config.llm_model.clone(),
        config.llm_timeout,
    )?;
    info!(
        "LLM client initialized (model: {}, endpoint: {})",
        llm.model(),
        llm.endpoint()
    );
    let catalog = match &config.models_file {
        Some(path) => load_models(path)?,
        None => Vec::new(),
    };
    let models = ModelCatalog::new(catalog, llm.model());
    info!(
        "{} models available, default {}",
        models.models().len(),
        models.current().model_id
    );
    let model: Arc<dyn ChatModel> = Arc::new(llm);

    let reports = ReportStore::open(&config.output_dir).await?;
    info!("Reports stored in {}", reports.dir().display());

    let fetcher = HttpFeedFetcher::new(config.feed_timeout)?;
    let collection = DailyCollection {
        sources: sources.clone(),
        reader: SourceReader::new(Arc::new(fetcher), POLITENESS_DELAY),
        annotator: Annotator::new(model.clone(), clock.clone()),
        builder: ReportBuilder::new(model, clock.clone()),
        store: reports.clone(),
        clock: clock.clone(),
    };
    let orchestrator = Orchestrator::new(StatusTracker::new(clock.clone()), Arc::new(collection));

    let state = AppState {
        orchestrator,
        reports,
        sources: Arc::new(sources),
        models,
        clock,
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
