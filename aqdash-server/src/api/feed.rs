//! Feed status and cache control

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use aqdash_common::{FeedSnapshot, GetOptions};

use crate::{ApiResult, AppState};

/// Snapshot summary
#[derive(Debug, Serialize)]
pub struct FeedSummary {
    pub generated_at: Option<DateTime<Utc>>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub sensor_count: usize,
    pub quarantined_sensors: usize,
    pub denylisted: Vec<String>,
}

impl FeedSummary {
    fn new(state: &AppState, snapshot: &FeedSnapshot) -> Self {
        Self {
            generated_at: snapshot.generated_at,
            fetched_at: state.cache.entry().map(|e| e.fetched_at),
            sensor_count: snapshot.sensors.len(),
            quarantined_sensors: snapshot.quarantined_sensors,
            denylisted: state.cache.denylist().ids().map(str::to_string).collect(),
        }
    }
}

/// GET /api/feed
pub async fn get_feed(State(state): State<AppState>) -> ApiResult<Json<FeedSummary>> {
    let snapshot = state.snapshot().await?;
    Ok(Json(FeedSummary::new(&state, &snapshot)))
}

/// POST /api/refresh
///
/// Forced refetch. On failure the previous snapshot stays cached.
pub async fn refresh_feed(State(state): State<AppState>) -> ApiResult<Json<FeedSummary>> {
    let options = GetOptions {
        force: true,
        max_age: state.settings.cache_max_age,
    };
    let snapshot = state.cache.get(options).await?;
    info!("Feed refreshed on request");
    Ok(Json(FeedSummary::new(&state, &snapshot)))
}

/// DELETE /api/cache
pub async fn invalidate_cache(State(state): State<AppState>) -> StatusCode {
    state.cache.invalidate();
    StatusCode::NO_CONTENT
}

pub fn feed_routes() -> Router<AppState> {
    Router::new()
        .route("/api/feed", get(get_feed))
        .route("/api/refresh", post(refresh_feed))
        .route("/api/cache", delete(invalidate_cache))
}
