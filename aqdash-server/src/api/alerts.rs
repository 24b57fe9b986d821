//! Advisory banner endpoint

use aqdash_common::alerts::{active_alerts, alert_banner, AlertBanner, AlertLocation};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    /// `null` when no advisory is active
    pub banner: Option<AlertBanner>,
    pub alerts: Vec<AlertLocation>,
}

/// GET /api/alerts
pub async fn get_alerts(State(state): State<AppState>) -> ApiResult<Json<AlertsResponse>> {
    let snapshot = state.snapshot().await?;
    Ok(Json(AlertsResponse {
        banner: alert_banner(&snapshot),
        alerts: active_alerts(&snapshot),
    }))
}

pub fn alert_routes() -> Router<AppState> {
    Router::new().route("/api/alerts", get(get_alerts))
}
