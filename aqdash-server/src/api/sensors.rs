//! Sensor list, map markers, sensor detail and the 24-hour chart series

use aqdash_common::aqhi::{band_for, colour_for, AqhiBand};
use aqdash_common::feed::Latest;
use aqdash_common::series::{self, SeriesWindow};
use aqdash_common::staleness::{self, Staleness};
use aqdash_common::views::{map_markers, sensor_list, ListRow, MapMarker, SortKey, SortOrder};
use aqdash_common::Pollutant;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{ApiResult, AppState};

/// Query parameters for the sensor list
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Column to sort by (default: id)
    pub sort: Option<String>,

    /// Sort order: "asc" or "desc"
    #[serde(default = "default_order")]
    pub order: String,
}

fn default_order() -> String {
    "asc".to_string()
}

/// GET /api/sensors
pub async fn list_sensors(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<ListRow>>> {
    let key = match query.sort.as_deref() {
        Some(sort) => sort.parse::<SortKey>()?,
        None => SortKey::default(),
    };
    let order = SortOrder::parse(&query.order);

    let snapshot = state.snapshot().await?;
    Ok(Json(sensor_list(&snapshot, key, order)))
}

/// GET /api/map
pub async fn get_map(State(state): State<AppState>) -> ApiResult<Json<Vec<MapMarker>>> {
    let snapshot = state.snapshot().await?;
    Ok(Json(map_markers(&snapshot)))
}

#[derive(Debug, Serialize)]
pub struct SensorDetail {
    pub id: String,
    pub label: String,
    pub name: Option<String>,
    pub region: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub latest: Option<Latest>,
    pub colour: Option<&'static str>,
    pub band: AqhiBand,
    pub active_alert: bool,
}

/// GET /api/sensors/:id
pub async fn get_sensor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SensorDetail>> {
    let snapshot = state.snapshot().await?;
    let sensor = snapshot.require_sensor(&id)?;
    let aqhi = sensor.aqhi();

    Ok(Json(SensorDetail {
        id: sensor.id.clone(),
        label: sensor.label().to_string(),
        name: sensor.name.clone(),
        region: sensor.region.clone(),
        lat: sensor.lat,
        lon: sensor.lon,
        latest: sensor.latest.clone(),
        colour: aqhi.map(colour_for),
        band: band_for(aqhi),
        active_alert: sensor.active_alert,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    /// Pollutant key (default: PM2.5)
    pub pollutant: Option<String>,
}

/// Chart payload: the window plus everything needed to label it
#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub title: String,
    pub unit: &'static str,
    pub reference_bands: [f64; 4],
    pub suggested_max: Option<f64>,
    pub has_data: bool,
    pub staleness: Staleness,
    pub warning: Option<String>,
    #[serde(flatten)]
    pub window: SeriesWindow,
}

/// GET /api/sensors/:id/series
pub async fn get_series(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SeriesQuery>,
) -> ApiResult<Json<SeriesResponse>> {
    // Validate the key before touching the feed
    let pollutant = match query.pollutant.as_deref() {
        Some(key) => key.parse::<Pollutant>()?,
        None => Pollutant::default(),
    };

    let snapshot = state.snapshot().await?;
    let sensor = snapshot.require_sensor(&id)?;
    let window = series::build_for(sensor, pollutant)?;
    let staleness = staleness::evaluate(window.last_valid_timestamp, state.cache.clock().as_ref());

    Ok(Json(SeriesResponse {
        title: window.title(sensor),
        unit: pollutant.unit(),
        reference_bands: pollutant.reference_bands(),
        suggested_max: window.suggested_max(),
        has_data: window.has_data(),
        warning: staleness.message(),
        staleness,
        window,
    }))
}

pub fn sensor_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sensors", get(list_sensors))
        .route("/api/sensors/:id", get(get_sensor))
        .route("/api/sensors/:id/series", get(get_series))
        .route("/api/map", get(get_map))
}
