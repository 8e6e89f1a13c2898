//! psdb-curator library
//!
//! Submission intake and curation for the song/synth preset database:
//! public submissions land in a review queue, admins approve (with edits) or
//! deny them, and approval merges the submission into the canonical tables.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod storage;

pub use config::CuratorConfig;
pub use error::{ApiError, ApiResult};

use axum::{extract::DefaultBodyLimit, middleware, Router};
use pipeline::SubmissionPipeline;
use sqlx::SqlitePool;
use std::sync::Arc;
use storage::FileStore;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Submission workflows over the pool and upload storage
    pub pipeline: SubmissionPipeline,
    /// Runtime configuration
    pub config: Arc<CuratorConfig>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: CuratorConfig) -> Self {
        let files = FileStore::new(config.upload_dirs());
        Self {
            pipeline: SubmissionPipeline::new(db.clone(), files),
            db,
            config: Arc::new(config),
        }
    }

    pub fn files(&self) -> &FileStore {
        self.pipeline.files()
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .merge(api::admin_routes())
        .merge(api::entry_routes())
        .layer(middleware::from_fn_with_state(state.clone(), api::admin_guard));

    let public = Router::new()
        .merge(api::submit_routes())
        .merge(api::health_routes());

    Router::new()
        .merge(admin)
        .merge(public)
        .layer(DefaultBodyLimit::max(state.config.request_body_limit()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
