//! Feed schema: the JSON document published by the sensor network
//!
//! The raw document is loosely typed (numbers arrive as strings, "NA" tokens,
//! rows of mixed width). Everything is validated here, once, on ingestion;
//! downstream code only ever sees the typed structures below.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::time::parse_timestamp;
use crate::{Error, Result};

/// Root of one fetch
#[derive(Debug, Clone, Serialize)]
pub struct FeedSnapshot {
    pub sensors: Vec<Sensor>,
    pub generated_at: Option<DateTime<Utc>>,
    /// Sensor entries rejected during ingestion
    pub quarantined_sensors: usize,
}

/// One monitoring site
#[derive(Debug, Clone, Serialize)]
pub struct Sensor {
    pub id: String,
    pub name: Option<String>,
    pub region: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(skip)]
    pub history: Vec<HistoryRow>,
    pub latest: Option<Latest>,
    pub active_alert: bool,
    /// History rows dropped because they had no usable timestamp
    pub quarantined_rows: usize,
}

/// Most recent computed reading for a sensor
#[derive(Debug, Clone, Default, Serialize)]
pub struct Latest {
    pub aqhi: Option<f64>,
    pub primary: Option<String>,
    pub pollutants: BTreeMap<String, Option<f64>>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// One history row: its timestamp plus the raw positional cells.
///
/// `cells` is the full row as published, so index 0 is the raw timestamp
/// and pollutant column indices match the feed layout.
#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub timestamp: DateTime<Utc>,
    pub cells: Vec<Value>,
}

impl HistoryRow {
    /// Reading at column `index`; out-of-range or non-numeric cells are `None`
    pub fn reading(&self, index: usize) -> Option<f64> {
        self.cells.get(index).and_then(parse_reading)
    }
}

impl Sensor {
    /// Display label: the name when present, else the id
    pub fn label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.id,
        }
    }

    pub fn aqhi(&self) -> Option<f64> {
        self.latest.as_ref().and_then(|l| l.aqhi)
    }

    pub fn has_coordinates(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }
}

impl FeedSnapshot {
    /// Parse and validate a feed document
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let raw: RawFeed =
            serde_json::from_slice(bytes).map_err(|e| Error::Parse(e.to_string()))?;

        let mut sensors = Vec::with_capacity(raw.sensors.len());
        let mut quarantined_sensors = 0;

        for (position, value) in raw.sensors.into_iter().enumerate() {
            match serde_json::from_value::<RawSensor>(value) {
                Ok(raw_sensor) => sensors.push(Sensor::from_raw(raw_sensor)),
                Err(e) => {
                    warn!(position, error = %e, "Quarantined malformed sensor entry");
                    quarantined_sensors += 1;
                }
            }
        }

        let generated_at = raw.generated_at.as_deref().and_then(parse_timestamp);
        if generated_at.is_none() {
            debug!("Feed has no parseable generated_at");
        }

        Ok(Self {
            sensors,
            generated_at,
            quarantined_sensors,
        })
    }

    pub fn sensor(&self, id: &str) -> Option<&Sensor> {
        self.sensors.iter().find(|s| s.id == id)
    }

    /// Like [`FeedSnapshot::sensor`], but a missing id is an error
    pub fn require_sensor(&self, id: &str) -> Result<&Sensor> {
        self.sensor(id)
            .ok_or_else(|| Error::SensorNotFound(id.to_string()))
    }
}

impl Sensor {
    fn from_raw(raw: RawSensor) -> Self {
        let mut history = Vec::with_capacity(raw.history.len());
        let mut quarantined_rows = 0;

        for row in raw.history {
            match into_history_row(row) {
                Some(row) => history.push(row),
                None => quarantined_rows += 1,
            }
        }

        if quarantined_rows > 0 {
            warn!(
                sensor = %raw.id,
                quarantined_rows,
                "Dropped history rows without a parseable timestamp"
            );
        }

        let latest = raw.latest.map(|l| Latest {
            aqhi: parse_reading(&l.aqhi),
            primary: l.primary.filter(|p| !p.trim().is_empty()),
            pollutants: l
                .pollutants
                .iter()
                .map(|(key, value)| (key.clone(), parse_reading(value)))
                .collect(),
            timestamp: l.timestamp.as_deref().and_then(parse_timestamp),
        });

        Self {
            id: raw.id,
            name: raw.name,
            region: raw.region,
            lat: parse_reading(&raw.lat),
            lon: parse_reading(&raw.lon),
            history,
            latest,
            active_alert: is_truthy(&raw.active_alert),
            quarantined_rows,
        }
    }
}

fn into_history_row(row: Value) -> Option<HistoryRow> {
    let Value::Array(cells) = row else {
        return None;
    };
    let timestamp = cells.first().and_then(Value::as_str).and_then(parse_timestamp)?;
    Some(HistoryRow { timestamp, cells })
}

/// Strict reading parser shared by history cells and latest values.
///
/// The cell is rendered to a trimmed string and must parse as a finite
/// number. Empty strings, "NA"-style tokens, booleans, nulls and
/// non-finite values are all absent; none of them become zero.
pub fn parse_reading(cell: &Value) -> Option<f64> {
    let parsed = match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Truthiness of a loosely typed flag
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0 && !v.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Debug, Deserialize)]
struct RawFeed {
    sensors: Vec<Value>,
    #[serde(default)]
    generated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSensor {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    lat: Value,
    #[serde(default)]
    lon: Value,
    #[serde(default)]
    history: Vec<Value>,
    #[serde(default)]
    latest: Option<RawLatest>,
    #[serde(default)]
    active_alert: Value,
}

#[derive(Debug, Deserialize)]
struct RawLatest {
    #[serde(default)]
    aqhi: Value,
    #[serde(default)]
    primary: Option<String>,
    #[serde(default)]
    pollutants: BTreeMap<String, Value>,
    #[serde(default)]
    timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: Value) -> FeedSnapshot {
        FeedSnapshot::from_json(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_reading_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_reading(&json!(12.5)), Some(12.5));
        assert_eq!(parse_reading(&json!(0)), Some(0.0));
        assert_eq!(parse_reading(&json!(" 7.25 ")), Some(7.25));
        assert_eq!(parse_reading(&json!("0")), Some(0.0));
    }

    #[test]
    fn test_parse_reading_folds_non_numeric_to_none() {
        assert_eq!(parse_reading(&json!("NA")), None);
        assert_eq!(parse_reading(&json!("")), None);
        assert_eq!(parse_reading(&json!("   ")), None);
        assert_eq!(parse_reading(&json!("NaN")), None);
        assert_eq!(parse_reading(&json!("inf")), None);
        assert_eq!(parse_reading(&json!("12abc")), None);
        assert_eq!(parse_reading(&json!(null)), None);
        assert_eq!(parse_reading(&json!(true)), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(is_truthy(&json!({"level": "moderate"})));
    }

    #[test]
    fn test_from_json_parses_sensor_fields() {
        let snap = snapshot(json!({
            "generated_at": "2024-01-01T06:00:00Z",
            "sensors": [{
                "id": "MOD-1",
                "name": "Harbour",
                "region": "North Shore",
                "lat": 49.3,
                "lon": "-123.1",
                "active_alert": 1,
                "history": [["2024-01-01T05:00:00", 1, 2, 3, 4, 5, 6, 7, 8.5]],
                "latest": {
                    "aqhi": "4",
                    "primary": "PM2.5",
                    "pollutants": {"PM2.5": 8.5, "O3": "NA"},
                    "timestamp": "2024-01-01T05:00:00"
                }
            }]
        }));

        assert_eq!(snap.sensors.len(), 1);
        assert!(snap.generated_at.is_some());
        let sensor = &snap.sensors[0];
        assert_eq!(sensor.label(), "Harbour");
        assert_eq!(sensor.lon, Some(-123.1));
        assert!(sensor.active_alert);
        assert_eq!(sensor.history.len(), 1);
        assert_eq!(sensor.history[0].reading(8), Some(8.5));
        assert_eq!(sensor.history[0].reading(20), None);

        let latest = sensor.latest.as_ref().unwrap();
        assert_eq!(latest.aqhi, Some(4.0));
        assert_eq!(latest.pollutants["PM2.5"], Some(8.5));
        assert_eq!(latest.pollutants["O3"], None);
    }

    #[test]
    fn test_from_json_quarantines_bad_rows_and_sensors() {
        let snap = snapshot(json!({
            "sensors": [
                {"id": "MOD-1", "history": [
                    ["2024-01-01T05:00:00", 1],
                    ["not a date", 2],
                    "not a row",
                    []
                ]},
                {"name": "no id"},
                42
            ]
        }));

        assert_eq!(snap.sensors.len(), 1);
        assert_eq!(snap.quarantined_sensors, 2);
        assert_eq!(snap.sensors[0].history.len(), 1);
        assert_eq!(snap.sensors[0].quarantined_rows, 3);
        assert!(!snap.sensors[0].active_alert);
    }

    #[test]
    fn test_from_json_rejects_malformed_documents() {
        assert!(matches!(
            FeedSnapshot::from_json(b"{not json"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            FeedSnapshot::from_json(br#"{"sensors": "nope"}"#),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_label_falls_back_to_id() {
        let snap = snapshot(json!({"sensors": [
            {"id": "MOD-2"},
            {"id": "MOD-3", "name": ""}
        ]}));
        assert_eq!(snap.sensors[0].label(), "MOD-2");
        assert_eq!(snap.sensors[1].label(), "MOD-3");
    }

    #[test]
    fn test_require_sensor_reports_missing_id() {
        let snap = snapshot(json!({"sensors": [{"id": "MOD-2"}]}));
        assert!(snap.require_sensor("MOD-2").is_ok());
        assert!(matches!(
            snap.require_sensor("MOD-9"),
            Err(Error::SensorNotFound(id)) if id == "MOD-9"
        ));
    }
}
