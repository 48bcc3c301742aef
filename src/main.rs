//! dgx-spark-exporter
//!
//! Prometheus exporter for DGX Spark hosts with tracing logging.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod startup_checks;
mod state;

use axum::{routing::get, Router};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use dgx_spark_exporter::build_registry;
use dgx_spark_exporter::health_stats::HealthStats;
use prometheus::{Gauge, IntCounter};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info, warn, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_test};
use config::{
    parse_log_level, resolve_config, show_config, validate_effective_config, Config,
    DEFAULT_BIND_ADDR, DEFAULT_PORT,
};
use handlers::{health_handler, metrics_handler, root_handler};
use state::AppState;

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &Config) {
    let log_level = config
        .log_level
        .as_deref()
        .and_then(|l| parse_log_level(l).ok())
        .unwrap_or(LogLevel::Info);

    let level = match log_level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    };

    let Some(level) = level else {
        return;
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", log_level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Labels attached to every exported series.
fn registry_labels(config: &Config) -> HashMap<String, String> {
    let mut labels = HashMap::new();
    if !config.host_label.unwrap_or(true) {
        return labels;
    }

    match nix::unistd::gethostname() {
        Ok(name) => {
            labels.insert("host".to_string(), name.to_string_lossy().into_owned());
        }
        Err(e) => warn!("Failed to read hostname, exporting without host label: {}", e),
    }
    labels
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        if let Commands::Config {
            output,
            format,
            commented,
        } = command
        {
            return command_config(output.clone(), format.clone(), *commented);
        }

        let config = load_validated_config(&args)?;
        setup_logging(&config);

        return match command {
            Commands::Check => command_check(&config),
            Commands::Test {
                iterations,
                interval_ms,
            } => command_test(*iterations, *interval_ms, &config),
            Commands::Config { .. } => unreachable!("Config handled above"),
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;

    setup_logging(&config);

    info!("Starting dgx-spark-exporter {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = startup_checks::validate_requirements(&config.collectors) {
        warn!("⚠️  Startup validation failed: {}", e);
        if let Some(path) = e.path() {
            warn!("   Check that {} is mounted and readable", path.display());
        }
        warn!("   The exporter will start and omit metrics it cannot read");
    }

    let bind_ip_str = config
        .bind
        .clone()
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    let port = config.port.unwrap_or(DEFAULT_PORT);

    // Initialize Prometheus metrics registry
    let registry = build_registry(&config.collectors, registry_labels(&config))?;
    debug!("Prometheus registry initialized");

    let scrape_duration = Gauge::new(
        "exporter_scrape_duration_seconds",
        "Time spent serving the previous /metrics request",
    )?;
    let scrapes_total = IntCounter::new(
        "exporter_scrapes_total",
        "Number of /metrics requests served",
    )?;

    registry.register(Box::new(scrape_duration.clone()))?;
    registry.register(Box::new(scrapes_total.clone()))?;

    debug!("All metrics registered successfully");

    let enable_health = config.enable_health.unwrap_or(true);
    let enable_tls = config.enable_tls.unwrap_or(false);
    let tls_paths = config.tls_cert_path.clone().zip(config.tls_key_path.clone());

    let state = Arc::new(AppState {
        registry,
        scrape_duration,
        scrapes_total,
        config: Arc::new(config),
        health_stats: Arc::new(HealthStats::new()),
        start_time: Instant::now(),
    });

    // Configure HTTP server routes
    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler));

    if enable_health {
        app = app.route("/health", get(health_handler));
    }

    let app = app.with_state(state.clone());

    if enable_tls {
        // Both paths were checked by validate_effective_config()
        let Some((cert_path, key_path)) = tls_paths else {
            return Err("TLS is enabled but tls_cert_path or tls_key_path is not set".into());
        };

        info!("Loading TLS certificate from: {}", cert_path);
        info!("Loading TLS private key from: {}", key_path);

        let tls_config = RustlsConfig::from_pem_file(&cert_path, &key_path)
            .await
            .map_err(|e| {
                error!("Failed to load TLS configuration: {}", e);
                e
            })?;

        info!(
            "dgx-spark-exporter listening on https://{}:{}",
            bind_ip_str, port
        );

        let server = axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service());

        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!("Server error: {}", e);
                    return Err(e.into());
                }
            }
            _ = shutdown_signal() => {
                info!("Shutdown signal received, exiting...");
            }
        }
    } else {
        let listener = TcpListener::bind(addr).await?;
        info!(
            "dgx-spark-exporter listening on http://{}:{}",
            bind_ip_str, port
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                error!("Server error: {}", e);
                e
            })?;
    }

    info!("dgx-spark-exporter stopped gracefully");
    Ok(())
}
