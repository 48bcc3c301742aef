//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers.

use dgx_spark_exporter::health_stats::HealthStats;
use prometheus::{Gauge, IntCounter, Registry};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    /// Registry holding the collector bridges and exporter self-metrics.
    pub registry: Registry,
    pub scrape_duration: Gauge,
    pub scrapes_total: IntCounter,
    pub config: Arc<Config>,
    pub health_stats: Arc<HealthStats>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
