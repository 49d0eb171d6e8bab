use std::sync::Arc;

use crate::clock::Clock;
use crate::llm_client::catalog::ModelCatalog;
use crate::models::news::Source;
use crate::orchestrator::Orchestrator;
use crate::report::store::ReportStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub reports: ReportStore,
    pub sources: Arc<Vec<Source>>,
    pub models: ModelCatalog,
    pub clock: Arc<dyn Clock>,
}
