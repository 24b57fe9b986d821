//! Pollutant keys, history column layout and display units

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::feed::HistoryRow;
use crate::Error;

/// Pollutants the feed reports in its history rows
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    #[default]
    #[serde(rename = "PM2.5")]
    Pm25,
    #[serde(rename = "CO")]
    Co,
    #[serde(rename = "NO")]
    No,
    #[serde(rename = "NO2")]
    No2,
    #[serde(rename = "O3")]
    O3,
    #[serde(rename = "CO2")]
    Co2,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Co,
        Pollutant::No,
        Pollutant::No2,
        Pollutant::O3,
        Pollutant::Co2,
    ];

    /// Key used by the feed and by clients
    pub fn key(self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Co => "CO",
            Pollutant::No => "NO",
            Pollutant::No2 => "NO2",
            Pollutant::O3 => "O3",
            Pollutant::Co2 => "CO2",
        }
    }

    /// Column holding this pollutant within `row`.
    ///
    /// Fine particulates always occupy the last column; row width differs
    /// between feed versions so the index is taken from the row itself.
    pub fn column(self, row: &HistoryRow) -> Option<usize> {
        match self {
            Pollutant::Pm25 => row.cells.len().checked_sub(1).filter(|&i| i > 0),
            Pollutant::Co => Some(3),
            Pollutant::No => Some(4),
            Pollutant::No2 => Some(5),
            Pollutant::O3 => Some(6),
            Pollutant::Co2 => Some(7),
        }
    }

    /// Reading for this pollutant in `row`, `None` when the cell is a gap
    pub fn reading(self, row: &HistoryRow) -> Option<f64> {
        self.column(row).and_then(|index| row.reading(index))
    }

    /// Display unit (labels only)
    pub fn unit(self) -> &'static str {
        match self {
            Pollutant::Pm25 => "μg/m³",
            Pollutant::O3 | Pollutant::No2 | Pollutant::No => "ppb",
            Pollutant::Co | Pollutant::Co2 => "ppm",
        }
    }

    /// Limits of the three background shading bands drawn behind the chart
    /// (good / elevated / high)
    pub fn reference_bands(self) -> [f64; 4] {
        match self {
            Pollutant::Pm25 => [0.0, 12.0, 25.0, 100.0],
            Pollutant::O3 => [0.0, 33.0, 66.0, 200.0],
            Pollutant::No2 | Pollutant::No => [0.0, 53.0, 106.0, 400.0],
            Pollutant::Co => [0.0, 4.0, 13.0, 50.0],
            Pollutant::Co2 => [350.0, 800.0, 1200.0, 2000.0],
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Pollutant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pollutant::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownPollutant(s.to_string()))
    }
}
