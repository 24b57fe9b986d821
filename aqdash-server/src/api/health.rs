//! Health and build identification endpoints
//!
//! Neither endpoint touches the feed: health reports what the cache holds
//! right now, so it keeps answering while the upstream feed is down.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use aqdash_common::time::Clock;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub feed: FeedHealth,
}

/// Cache contents at the time of the check
#[derive(Debug, Serialize)]
pub struct FeedHealth {
    pub cached: bool,
    pub fetched_at: Option<DateTime<Utc>>,
    pub age_secs: Option<i64>,
    pub sensor_count: Option<usize>,
}

/// Values embedded by build.rs
#[derive(Debug, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub build_profile: &'static str,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let entry = state.cache.entry();
    let now = state.cache.clock().now();

    Json(HealthResponse {
        status: "ok",
        module: "aqdash-server",
        version: env!("CARGO_PKG_VERSION"),
        feed: FeedHealth {
            cached: entry.is_some(),
            fetched_at: entry.as_ref().map(|e| e.fetched_at),
            age_secs: entry.as_ref().map(|e| (now - e.fetched_at).num_seconds()),
            sensor_count: entry.as_ref().map(|e| e.snapshot.sensors.len()),
        },
    })
}

/// GET /api/buildinfo
pub async fn build_info() -> Json<BuildInfo> {
    Json(BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("GIT_HASH"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        build_profile: env!("BUILD_PROFILE"),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/buildinfo", get(build_info))
}
