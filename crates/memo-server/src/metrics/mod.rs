//! Prometheus exposition and HTTP request metrics.

pub mod http;
pub mod setup;

pub use setup::init_metrics;
