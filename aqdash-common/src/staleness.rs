//! Staleness policy for windowed series

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::time::Clock;

/// A series is stale once its newest valid reading is older than this (2 h)
pub const STALE_THRESHOLD_MS: i64 = 7_200_000;

pub fn stale_threshold() -> Duration {
    Duration::milliseconds(STALE_THRESHOLD_MS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StaleReason {
    NoData,
    AgeExceeded,
    Fresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Staleness {
    pub stale: bool,
    pub reason: StaleReason,
    /// Age of the newest valid reading at evaluation time
    #[serde(skip)]
    pub age: Option<Duration>,
}

impl Staleness {
    /// User-facing warning, `None` when the data is fresh
    pub fn message(&self) -> Option<String> {
        match self.reason {
            StaleReason::Fresh => None,
            StaleReason::NoData => Some("No valid readings in the last 24 hours".to_string()),
            StaleReason::AgeExceeded => {
                let age = self.age.unwrap_or_else(Duration::zero);
                Some(format!(
                    "Latest valid reading is {}h {}m old",
                    age.num_hours(),
                    age.num_minutes() % 60
                ))
            }
        }
    }
}

/// Evaluate against an explicit `now` and threshold
pub fn evaluate_at(
    last_valid: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    threshold: Duration,
) -> Staleness {
    let Some(last_valid) = last_valid else {
        return Staleness {
            stale: true,
            reason: StaleReason::NoData,
            age: None,
        };
    };

    let age = now - last_valid;
    if age > threshold {
        Staleness {
            stale: true,
            reason: StaleReason::AgeExceeded,
            age: Some(age),
        }
    } else {
        Staleness {
            stale: false,
            reason: StaleReason::Fresh,
            age: Some(age),
        }
    }
}

/// Evaluate with the fixed policy threshold against `clock`
pub fn evaluate(last_valid: Option<DateTime<Utc>>, clock: &dyn Clock) -> Staleness {
    evaluate_at(last_valid, clock.now(), stale_threshold())
}
