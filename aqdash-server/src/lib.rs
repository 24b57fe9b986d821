//! aqdash-server library - air-quality dashboard API
//!
//! Thin HTTP consumer of the telemetry core in `aqdash-common`: every
//! handler obtains the snapshot from the shared feed cache and runs one of
//! the core transforms over it.

use std::sync::Arc;

use aqdash_common::config::Settings;
use aqdash_common::{FeedCache, FeedSnapshot, GetOptions};
use axum::Router;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod refresh;

pub use crate::error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Process-wide feed cache
    pub cache: Arc<FeedCache>,
    /// Resolved settings
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create new application state
    pub fn new(cache: Arc<FeedCache>, settings: Settings) -> Self {
        Self {
            cache,
            settings: Arc::new(settings),
        }
    }

    /// Snapshot no older than the configured cache max age
    pub async fn snapshot(&self) -> ApiResult<Arc<FeedSnapshot>> {
        let options = GetOptions {
            force: false,
            max_age: self.settings.cache_max_age,
        };
        Ok(self.cache.get(options).await?)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::feed_routes())
        .merge(api::sensor_routes())
        .merge(api::alert_routes())
        .merge(api::selection_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
