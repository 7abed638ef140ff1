use std::sync::Arc;

use crate::db::{CacheStore, GraphStore};
use crate::services::RecommendationEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
}

impl AppState {
    /// Wires the engine to its graph store and cache
    pub fn new(graph: Arc<dyn GraphStore>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            engine: Arc::new(RecommendationEngine::new(graph, cache)),
        }
    }
}
