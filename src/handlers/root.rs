//! Root endpoint handler for the landing page.
//!
//! This module provides the `/` endpoint handler that displays
//! a landing page with all available endpoints and descriptions.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use tracing::{debug, instrument};

use dgx_spark_exporter::CollectorConfig;

use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

const HEALTH_ITEM: &str = r#"        <li>
            <a href="/health">/health</a>
            <div class="endpoint-desc">Exporter internal scrape statistics (text)</div>
        </li>
"#;

fn enabled_collector_names(config: &CollectorConfig) -> Vec<&'static str> {
    [
        ("cpu", config.enable_cpu),
        ("gpu", config.enable_gpu),
        ("memory", config.enable_memory),
        ("disk", config.enable_disk),
        ("network", config.enable_network),
    ]
    .into_iter()
    .filter_map(|(name, enabled)| enabled.then_some(name))
    .collect()
}

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");
    state.health_stats.record_http_request();

    let version = env!("CARGO_PKG_VERSION");

    let uptime_secs = state.start_time.elapsed().as_secs();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;
    let uptime_str = format!("{}h {}m {}s", hours, minutes, seconds);

    let collectors = enabled_collector_names(&state.config.collectors).join(", ");
    let health_item = if state.config.enable_health.unwrap_or(true) {
        HEALTH_ITEM
    } else {
        ""
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>DGX Spark Prometheus Exporter</title>
    <style>
        body {{ font-family: system-ui, sans-serif; margin: 0; padding: 24px; background: #f4f6f4; }}
        .container {{ max-width: 760px; margin: 0 auto; background: #fff; padding: 32px; border-radius: 6px; }}
        h1 {{ color: #2b2b2b; border-bottom: 3px solid #76b900; padding-bottom: 12px; }}
        .subtitle {{ color: #666; margin-bottom: 24px; }}
        .info {{ display: flex; gap: 32px; background: #eef2ea; padding: 12px 16px; border-radius: 4px; }}
        .info-label {{ display: block; font-size: 0.85em; font-weight: 600; color: #555; }}
        .info-value {{ color: #4a7a00; }}
        .endpoint-list {{ list-style: none; padding: 0; }}
        .endpoint-list li {{ margin: 14px 0; padding: 12px; border-left: 4px solid #76b900; background: #f8f9f7; }}
        .endpoint-list a {{ color: #4a7a00; font-weight: 600; text-decoration: none; }}
        .endpoint-desc {{ color: #666; margin-top: 4px; }}
        .footer {{ margin-top: 32px; padding-top: 16px; border-top: 1px solid #ddd; color: #777; font-size: 0.9em; }}
    </style>
</head>
<body>
<div class="container">
    <h1>DGX Spark Prometheus Exporter</h1>
    <p class="subtitle">CPU, GPU, memory, disk and network metrics for DGX Spark hosts</p>

    <div class="info">
        <div class="info-item">
            <span class="info-label">Version</span>
            <span class="info-value">{version}</span>
        </div>
        <div class="info-item">
            <span class="info-label">Uptime</span>
            <span class="info-value">{uptime}</span>
        </div>
        <div class="info-item">
            <span class="info-label">Collectors</span>
            <span class="info-value">{collectors}</span>
        </div>
    </div>

    <h2>Available Endpoints</h2>
    <ul class="endpoint-list">
        <li>
            <a href="/metrics">/metrics</a>
            <div class="endpoint-desc">Prometheus-compatible metrics endpoint</div>
        </li>
{health_item}    </ul>

    <div class="footer">
        <p>{footer}</p>
    </div>
</div>
</body>
</html>"#,
        version = version,
        uptime = uptime_str,
        collectors = collectors,
        health_item = health_item,
        footer = FOOTER_TEXT
    );

    Html(html)
}
