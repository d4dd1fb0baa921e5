use crate::config::Config;
use crate::pipeline::{BatchOptions, Pipeline};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the extractor, the embedding model handle, and the skill vocabulary.
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(config: Config, pipeline: Pipeline) -> Self {
        Self { config, pipeline }
    }

    /// Batch options before any per-request overrides.
    pub fn default_options(&self) -> BatchOptions {
        BatchOptions {
            limit: 0,
            weights: self.config.fusion_weights,
            policy: self.config.invalid_file_policy,
        }
    }
}
