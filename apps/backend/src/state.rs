use std::sync::Arc;

use crate::bridge::runner::SyncRunner;
use crate::store::NewsStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn NewsStore>,
    pub sync: SyncRunner,
}
