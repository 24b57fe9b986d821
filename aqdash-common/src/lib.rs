//! # aqdash common library
//!
//! The telemetry core shared by every air-quality view:
//! - Feed schema and ingestion validation
//! - Time-bounded, single-flight feed cache with a sensor denylist
//! - 24-hour series windowing with gap ranges
//! - Staleness policy
//! - AQHI colour scale and risk bands
//! - Advisory banner aggregation
//! - List/map projections and view selection
//! - Configuration loading

pub mod alerts;
pub mod aqhi;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod pollutant;
pub mod selection;
pub mod series;
pub mod staleness;
pub mod time;
pub mod views;

pub use cache::{Denylist, FeedCache, FeedSource, GetOptions, HttpFeedSource};
pub use error::{Error, Result};
pub use feed::{FeedSnapshot, Sensor};
pub use pollutant::Pollutant;
