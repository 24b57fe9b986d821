//! View selection endpoint
//!
//! The persisted `{sensor, pollutant}` entry lives client-side; the client
//! forwards it in `saved` alongside the page's query parameters.

use aqdash_common::selection::{resolve_selection, SelectionQuery, ViewSelection};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct SelectionParams {
    pub sensor: Option<String>,
    pub pollutant: Option<String>,
    /// Persisted selection JSON, as stored by the client
    pub saved: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub selection: ViewSelection,
    /// Value for the client to persist
    pub persisted: String,
}

/// GET /api/selection
pub async fn get_selection(
    State(state): State<AppState>,
    Query(params): Query<SelectionParams>,
) -> ApiResult<Json<SelectionResponse>> {
    let snapshot = state.snapshot().await?;
    let query = SelectionQuery {
        sensor: params.sensor,
        pollutant: params.pollutant,
    };

    let selection = resolve_selection(&snapshot, &query, params.saved.as_deref())
        .ok_or_else(|| ApiError::NotFound("Feed has no sensors".to_string()))?;

    Ok(Json(SelectionResponse {
        persisted: selection.to_persisted_json(),
        selection,
    }))
}

pub fn selection_routes() -> Router<AppState> {
    Router::new().route("/api/selection", get(get_selection))
}
