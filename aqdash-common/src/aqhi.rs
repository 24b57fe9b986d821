//! AQHI classification: colour scale and risk bands
//!
//! Every view colours and labels sensors through these two functions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Colour tokens for bins 1..=9 followed by the "10+" bin
const AQHI_COLOURS: [&str; 10] = [
    "#67c1f1", "#4e95c7", "#396798", "#e7eb38", "#f1cb2e", "#e79647", "#dd6869", "#d82732",
    "#bf2733", "#8b2328",
];

/// Colour token for an AQHI value.
///
/// Each bin `n` in 1..=9 takes values `<= n` not claimed by a lower bin, so
/// an index of exactly 3 is in the third bin. Anything above 9 lands in the
/// tenth bin, as does a non-finite value (no boundary comparison holds).
pub fn colour_for(index: f64) -> &'static str {
    (1..=9)
        .zip(AQHI_COLOURS)
        .find(|&(boundary, _)| index <= f64::from(boundary))
        .map(|(_, colour)| colour)
        .unwrap_or(AQHI_COLOURS[9])
}

/// Coarse four-level risk band, plus `Unknown` for a missing index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AqhiBand {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
    Unknown,
}

impl AqhiBand {
    pub fn as_str(self) -> &'static str {
        match self {
            AqhiBand::Low => "Low",
            AqhiBand::Moderate => "Moderate",
            AqhiBand::High => "High",
            AqhiBand::VeryHigh => "Very High",
            AqhiBand::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AqhiBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk band for an AQHI value; absent or non-finite values are `Unknown`
pub fn band_for(index: Option<f64>) -> AqhiBand {
    match index {
        Some(v) if !v.is_finite() => AqhiBand::Unknown,
        Some(v) if v <= 3.0 => AqhiBand::Low,
        Some(v) if v <= 6.0 => AqhiBand::Moderate,
        Some(v) if v <= 10.0 => AqhiBand::High,
        Some(_) => AqhiBand::VeryHigh,
        None => AqhiBand::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_boundaries_map_to_own_bin() {
        for i in 1..=9 {
            assert_eq!(colour_for(f64::from(i)), AQHI_COLOURS[i as usize - 1]);
        }
    }

    #[test]
    fn test_adjacent_integers_have_distinct_colours() {
        for i in 1..=9 {
            assert_ne!(colour_for(f64::from(i)), colour_for(f64::from(i + 1)));
        }
    }

    #[test]
    fn test_fractional_values_round_up_into_next_bin() {
        assert_eq!(colour_for(2.1), colour_for(3.0));
        assert_eq!(colour_for(0.0), colour_for(1.0));
        assert_eq!(colour_for(-1.0), colour_for(1.0));
    }

    #[test]
    fn test_ten_plus_bin_absorbs_everything_above_nine() {
        assert_eq!(colour_for(10.5), colour_for(15.0));
        assert_eq!(colour_for(9.01), "#8b2328");
        assert_eq!(colour_for(f64::NAN), "#8b2328");
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(band_for(Some(1.0)), AqhiBand::Low);
        assert_eq!(band_for(Some(3.0)), AqhiBand::Low);
        assert_eq!(band_for(Some(4.0)), AqhiBand::Moderate);
        assert_eq!(band_for(Some(6.0)), AqhiBand::Moderate);
        assert_eq!(band_for(Some(7.0)), AqhiBand::High);
        assert_eq!(band_for(Some(10.0)), AqhiBand::High);
        assert_eq!(band_for(Some(11.0)), AqhiBand::VeryHigh);
    }

    #[test]
    fn test_band_unknown_for_missing_or_non_numeric() {
        assert_eq!(band_for(None), AqhiBand::Unknown);
        assert_eq!(band_for(Some(f64::NAN)), AqhiBand::Unknown);
        assert_eq!(band_for(Some(f64::INFINITY)), AqhiBand::Unknown);
    }

    #[test]
    fn test_band_display() {
        assert_eq!(AqhiBand::VeryHigh.to_string(), "Very High");
        assert_eq!(
            serde_json::to_string(&AqhiBand::VeryHigh).unwrap(),
            "\"Very High\""
        );
    }
}
