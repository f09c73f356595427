pub mod log;
pub mod metrics;

pub use log::SessionLog;
pub use metrics::{LoadMetrics, MetricsSnapshot};
