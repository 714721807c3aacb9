//! Prometheus scrape endpoint and per-request HTTP metrics

pub mod handlers;
pub mod middleware;

pub use handlers::{render_metrics, MetricsState};
pub use middleware::track_http_metrics;
