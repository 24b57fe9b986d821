//! Common error types for aqdash

use thiserror::Error;

/// Common result type for aqdash operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the telemetry core and the HTTP service
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Feed could not be fetched: network failure (no status) or
    /// non-success HTTP response (status carried)
    #[error("Failed to fetch feed{}: {message}", status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Fetch {
        status: Option<u16>,
        message: String,
    },

    /// Feed body was not valid JSON or did not match the feed schema
    #[error("Failed to parse feed: {0}")]
    Parse(String),

    /// Pollutant key with no column mapping (usage error)
    #[error("Unknown pollutant: {0}")]
    UnknownPollutant(String),

    /// Sensor has no history rows to window
    #[error("Sensor {0} has no history")]
    EmptyHistory(String),

    /// No sensor with the requested id in the current snapshot
    #[error("Sensor not found: {0}")]
    SensorNotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status carried by a fetch failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Fetch { status, .. } => *status,
            _ => None,
        }
    }
}
