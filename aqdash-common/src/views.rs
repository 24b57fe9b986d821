//! Read-only projections of a snapshot for the list and map views
//!
//! Both functions build new vectors; the snapshot itself is never reordered
//! or filtered in place.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aqhi::{band_for, colour_for, AqhiBand};
use crate::feed::{FeedSnapshot, Sensor};
use crate::Error;

/// Column the sensor list is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Id,
    Name,
    Aqhi,
    Primary,
    Timestamp,
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(SortKey::Id),
            "name" => Ok(SortKey::Name),
            "aqhi" => Ok(SortKey::Aqhi),
            "primary" => Ok(SortKey::Primary),
            "timestamp" => Ok(SortKey::Timestamp),
            other => Err(Error::InvalidInput(format!("Unknown sort key: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Anything other than "desc" sorts ascending
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("desc") {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }
}

/// One row of the sortable sensor list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListRow {
    pub id: String,
    pub name: Option<String>,
    pub aqhi: f64,
    pub colour: &'static str,
    pub band: AqhiBand,
    pub primary: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// One map marker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: String,
    pub label: String,
    pub lat: f64,
    pub lon: f64,
    pub aqhi: Option<f64>,
    pub colour: &'static str,
    pub primary: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
}

/// Sensors with a current AQHI, sorted by `key`.
///
/// Missing values sort lowest; ties keep feed order.
pub fn sensor_list(snapshot: &FeedSnapshot, key: SortKey, order: SortOrder) -> Vec<ListRow> {
    let mut rows: Vec<ListRow> = snapshot.sensors.iter().filter_map(list_row).collect();

    rows.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });

    rows
}

fn list_row(sensor: &Sensor) -> Option<ListRow> {
    let latest = sensor.latest.as_ref()?;
    let aqhi = latest.aqhi?;
    Some(ListRow {
        id: sensor.id.clone(),
        name: sensor.name.clone(),
        aqhi,
        colour: colour_for(aqhi),
        band: band_for(Some(aqhi)),
        primary: latest.primary.clone(),
        timestamp: latest.timestamp,
    })
}

fn compare(a: &ListRow, b: &ListRow, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => a.id.cmp(&b.id),
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Aqhi => a.aqhi.total_cmp(&b.aqhi),
        SortKey::Primary => a.primary.cmp(&b.primary),
        SortKey::Timestamp => a.timestamp.cmp(&b.timestamp),
    }
}

/// Markers for sensors that have both coordinates
pub fn map_markers(snapshot: &FeedSnapshot) -> Vec<MapMarker> {
    snapshot
        .sensors
        .iter()
        .filter_map(|sensor| {
            let (lat, lon) = (sensor.lat?, sensor.lon?);
            let aqhi = sensor.aqhi();
            Some(MapMarker {
                id: sensor.id.clone(),
                label: sensor.label().to_string(),
                lat,
                lon,
                aqhi,
                colour: colour_for(aqhi.unwrap_or(0.0)),
                primary: sensor.latest.as_ref().and_then(|l| l.primary.clone()),
                generated_at: snapshot.generated_at,
            })
        })
        .collect()
}
