//! HTTP API handlers for aqdash-server

pub mod alerts;
pub mod feed;
pub mod health;
pub mod selection;
pub mod sensors;

pub use alerts::alert_routes;
pub use feed::feed_routes;
pub use health::health_routes;
pub use selection::selection_routes;
pub use sensors::sensor_routes;
