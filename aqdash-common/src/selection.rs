//! Which sensor and pollutant the detail view shows
//!
//! The client persists the last `{sensor, pollutant}` pair as JSON; page
//! query parameters override it when they name something that exists.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::feed::FeedSnapshot;
use crate::pollutant::Pollutant;

/// Resolved selection, also the shape of the persisted entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSelection {
    pub sensor: String,
    pub pollutant: Pollutant,
}

impl ViewSelection {
    pub fn to_persisted_json(&self) -> String {
        // Two plain string fields; serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Raw query parameters, unvalidated
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionQuery {
    pub sensor: Option<String>,
    pub pollutant: Option<String>,
}

/// Persisted entry as stored; either field may be missing or stale
#[derive(Debug, Default, Deserialize)]
struct PersistedSelection {
    sensor: Option<String>,
    pollutant: Option<String>,
}

/// Resolve the selection for `snapshot`.
///
/// Each field is taken from the query if valid, else from the persisted
/// entry if valid, else falls back to the first sensor and fine
/// particulates. `None` only when the snapshot has no sensors.
pub fn resolve_selection(
    snapshot: &FeedSnapshot,
    query: &SelectionQuery,
    persisted: Option<&str>,
) -> Option<ViewSelection> {
    let first = snapshot.sensors.first()?;

    let persisted: PersistedSelection = persisted
        .and_then(|raw| match serde_json::from_str(raw) {
            Ok(p) => Some(p),
            Err(e) => {
                debug!(error = %e, "Ignoring malformed persisted selection");
                None
            }
        })
        .unwrap_or_default();

    let sensor_exists = |id: &&String| snapshot.sensor(id).is_some();
    let sensor = query
        .sensor
        .as_ref()
        .filter(sensor_exists)
        .or(persisted.sensor.as_ref().filter(sensor_exists))
        .cloned()
        .unwrap_or_else(|| first.id.clone());

    let parse = |key: &Option<String>| key.as_deref().and_then(|k| k.parse::<Pollutant>().ok());
    let pollutant = parse(&query.pollutant)
        .or_else(|| parse(&persisted.pollutant))
        .unwrap_or_default();

    Some(ViewSelection { sensor, pollutant })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> FeedSnapshot {
        FeedSnapshot::from_json(
            json!({"sensors": [{"id": "MOD-1"}, {"id": "MOD-2"}, {"id": "MOD-3"}]})
                .to_string()
                .as_bytes(),
        )
        .unwrap()
    }

    fn query(sensor: Option<&str>, pollutant: Option<&str>) -> SelectionQuery {
        SelectionQuery {
            sensor: sensor.map(str::to_string),
            pollutant: pollutant.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults_to_first_sensor_and_fine_particulates() {
        let sel = resolve_selection(&snapshot(), &SelectionQuery::default(), None).unwrap();
        assert_eq!(sel.sensor, "MOD-1");
        assert_eq!(sel.pollutant, Pollutant::Pm25);
    }

    #[test]
    fn test_query_overrides_persisted() {
        let persisted = r#"{"sensor":"MOD-2","pollutant":"O3"}"#;
        let sel = resolve_selection(&snapshot(), &query(Some("MOD-3"), Some("NO2")), Some(persisted))
            .unwrap();
        assert_eq!(sel.sensor, "MOD-3");
        assert_eq!(sel.pollutant, Pollutant::No2);
    }

    #[test]
    fn test_invalid_query_falls_back_to_persisted() {
        let persisted = r#"{"sensor":"MOD-2","pollutant":"O3"}"#;
        let sel = resolve_selection(&snapshot(), &query(Some("MOD-9"), Some("PM10")), Some(persisted))
            .unwrap();
        assert_eq!(sel.sensor, "MOD-2");
        assert_eq!(sel.pollutant, Pollutant::O3);
    }

    #[test]
    fn test_stale_persisted_sensor_falls_back_to_first() {
        let persisted = r#"{"sensor":"MOD-00616","pollutant":"CO"}"#;
        let sel = resolve_selection(&snapshot(), &SelectionQuery::default(), Some(persisted)).unwrap();
        assert_eq!(sel.sensor, "MOD-1");
        assert_eq!(sel.pollutant, Pollutant::Co);
    }

    #[test]
    fn test_malformed_persisted_entry_is_ignored() {
        let sel = resolve_selection(&snapshot(), &SelectionQuery::default(), Some("{oops")).unwrap();
        assert_eq!(sel.sensor, "MOD-1");
    }

    #[test]
    fn test_empty_snapshot_has_no_selection() {
        let empty = FeedSnapshot::from_json(br#"{"sensors": []}"#).unwrap();
        assert!(resolve_selection(&empty, &SelectionQuery::default(), None).is_none());
    }

    #[test]
    fn test_persisted_json_shape() {
        let sel = ViewSelection {
            sensor: "MOD-1".to_string(),
            pollutant: Pollutant::Pm25,
        };
        assert_eq!(sel.to_persisted_json(), r#"{"sensor":"MOD-1","pollutant":"PM2.5"}"#);
    }
}
