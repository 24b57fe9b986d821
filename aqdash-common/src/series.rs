//! 24-hour series windowing with explicit gaps
//!
//! Turns a sensor's irregular history rows into an aligned series for one
//! pollutant. Points without a finite reading are gaps (distinct from a
//! reading of zero), and maximal runs of gaps are reported as half-open
//! ranges for shading.

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::Serialize;

use crate::feed::Sensor;
use crate::pollutant::Pollutant;
use crate::{Error, Result};

/// Length of the series window in hours
pub const WINDOW_HOURS: i64 = 24;

/// One point of the series; `value` is `None` for a gap
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub time: DateTime<Utc>,
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub fn is_gap(&self) -> bool {
        self.value.is_none()
    }
}

/// Maximal run of gap points, `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GapRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Windowed series for one sensor and pollutant
#[derive(Debug, Clone, Serialize)]
pub struct SeriesWindow {
    pub pollutant: Pollutant,
    pub points: Vec<SeriesPoint>,
    pub gaps: Vec<GapRange>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub last_raw_timestamp: DateTime<Utc>,
    pub last_valid_timestamp: Option<DateTime<Utc>>,
}

impl SeriesWindow {
    /// True when at least one point carries a value
    pub fn has_data(&self) -> bool {
        self.last_valid_timestamp.is_some()
    }

    /// Y-axis headroom: 10% above the largest reading
    pub fn suggested_max(&self) -> Option<f64> {
        self.points
            .iter()
            .filter_map(|p| p.value)
            .reduce(f64::max)
            .map(|max| max * 1.1)
    }

    pub fn title(&self, sensor: &Sensor) -> String {
        format!("{} at {} (last 24 h)", self.pollutant, sensor.label())
    }
}

/// Build the series for a pollutant given by its feed key.
///
/// An unknown key is a caller bug and fails with
/// [`Error::UnknownPollutant`] rather than yielding an empty series.
pub fn build(sensor: &Sensor, pollutant_key: &str) -> Result<SeriesWindow> {
    let pollutant: Pollutant = pollutant_key.parse()?;
    build_for(sensor, pollutant)
}

/// Build the series for a known pollutant
pub fn build_for(sensor: &Sensor, pollutant: Pollutant) -> Result<SeriesWindow> {
    let mut rows: Vec<_> = sensor.history.iter().collect();
    // Stable: equal timestamps keep feed order
    rows.sort_by_key(|row| row.timestamp);

    let last_raw_timestamp = rows
        .last()
        .map(|row| row.timestamp)
        .ok_or_else(|| Error::EmptyHistory(sensor.id.clone()))?;

    let window_end = round_up_to_hour(last_raw_timestamp);
    let window_start = window_end - Duration::hours(WINDOW_HOURS);

    let points: Vec<SeriesPoint> = rows
        .into_iter()
        .filter(|row| row.timestamp >= window_start && row.timestamp <= window_end)
        .map(|row| SeriesPoint {
            time: row.timestamp,
            value: pollutant.reading(row),
        })
        .collect();

    let last_valid_timestamp = points
        .iter()
        .rev()
        .find(|p| !p.is_gap())
        .map(|p| p.time);

    let gaps = if last_valid_timestamp.is_none() {
        vec![GapRange {
            start: window_start,
            end: window_end,
        }]
    } else {
        gap_ranges(&points, window_start, window_end)
    };

    Ok(SeriesWindow {
        pollutant,
        points,
        gaps,
        window_start,
        window_end,
        last_raw_timestamp,
        last_valid_timestamp,
    })
}

/// Round up to the next whole hour; exact hours are unchanged
pub fn round_up_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    match ts.duration_trunc(Duration::hours(1)) {
        Ok(floor) if floor == ts => ts,
        Ok(floor) => floor + Duration::hours(1),
        // Out of chrono's representable range; leave untouched
        Err(_) => ts,
    }
}

/// Single pass over time-ordered points.
///
/// A run of gaps opens at its first gap point, or at `window_start` when
/// the series begins with gaps, and closes at the next value point, or at
/// `window_end` when the series ends inside it.
fn gap_ranges(
    points: &[SeriesPoint],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<GapRange> {
    let mut gaps = Vec::new();
    let mut open: Option<DateTime<Utc>> = None;
    let mut seen_value = false;

    for point in points {
        match (point.is_gap(), open) {
            (true, None) => {
                open = Some(if seen_value { point.time } else { window_start });
            }
            (false, Some(start)) => {
                gaps.push(GapRange {
                    start,
                    end: point.time,
                });
                open = None;
                seen_value = true;
            }
            (false, None) => seen_value = true,
            (true, Some(_)) => {}
        }
    }

    if let Some(start) = open {
        gaps.push(GapRange {
            start,
            end: window_end,
        });
    }

    gaps
}
