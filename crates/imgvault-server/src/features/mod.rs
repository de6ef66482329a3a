//! Feature slices
//!
//! Each feature keeps its write side in `commands/`, its read side in
//! `queries/` and its HTTP wiring in `routes.rs`.

pub mod images;

use axum::Router;
use std::sync::Arc;

use crate::db::ImageRepository;
use crate::ingest::IngestPipeline;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub pipeline: IngestPipeline,
    pub repository: Arc<dyn ImageRepository>,
}

impl FeatureState {
    /// Listing reads through the same repository the pipeline writes to.
    pub fn new(pipeline: IngestPipeline) -> Self {
        let repository = pipeline.repository();
        Self {
            pipeline,
            repository,
        }
    }
}

/// Mounts every feature under its path prefix.
pub fn router(state: FeatureState) -> Router<()> {
    Router::new().nest("/images", images::images_routes().with_state(state))
}
