//! Metrics endpoint handler for Prometheus scraping.
//!
//! Every request runs all enabled collectors once through
//! `Registry::gather()` and returns the result in the Prometheus text format.
//! Nothing is cached between scrapes.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use prometheus::{Encoder, TextEncoder};
use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::state::SharedState;

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 16 * 1024;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    CollectionFailed,
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        let message = match self {
            MetricsError::CollectionFailed => "Failed to collect metrics",
            MetricsError::EncodingFailed => "Failed to encode metrics",
        };
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, MetricsError> {
    let start = Instant::now();
    debug!("Processing /metrics request");
    state.health_stats.record_http_request();

    // Collectors read files and spawn the GPU tool, keep them off the runtime threads.
    // The scrape gauge still holds the previous request's duration at this point.
    let registry = state.registry.clone();
    let families = match tokio::task::spawn_blocking(move || registry.gather()).await {
        Ok(families) => families,
        Err(e) => {
            error!("Metrics collection task failed: {}", e);
            state.health_stats.record_scrape_failure();
            return Err(MetricsError::CollectionFailed);
        }
    };

    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    let encoder = TextEncoder::new();

    if let Err(e) = encoder.encode(&families, &mut buffer) {
        error!("Failed to encode Prometheus metrics: {}", e);
        state.health_stats.record_scrape_failure();
        return Err(MetricsError::EncodingFailed);
    }

    let time_series = families.iter().map(|f| f.get_metric().len()).sum::<usize>() as u64;
    let elapsed = start.elapsed();

    state.scrape_duration.set(elapsed.as_secs_f64());
    state.scrapes_total.inc();
    state
        .health_stats
        .record_scrape(elapsed.as_secs_f64() * 1000.0, time_series, buffer.len());

    debug!(
        "Metrics request completed: {} series, {} bytes, {:.3}ms",
        time_series,
        buffer.len(),
        elapsed.as_secs_f64() * 1000.0
    );

    String::from_utf8(buffer).map_err(|_| MetricsError::EncodingFailed)
}
