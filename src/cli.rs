//! CLI arguments and subcommands for dgx-spark-exporter.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "dgx-spark-exporter",
    about = "Prometheus exporter for DGX Spark CPU, GPU, memory, disk and network metrics",
    long_about = "Prometheus exporter for DGX Spark CPU, GPU, memory, disk and network metrics.\n\n\
                  Samples /proc, /sys, statvfs and nvidia-smi on every scrape and exposes \
                  the current values on /metrics.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (overrides log_level from the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Do not attach the host="<hostname>" label to exported series
    #[arg(long)]
    pub no_host_label: bool,

    /// Monitored network interfaces (comma-separated, replaces the default list)
    #[arg(long)]
    pub interfaces: Option<String>,

    /// GPU query tool to invoke
    #[arg(long)]
    pub gpu_command: Option<String>,

    /// Kill the GPU query tool after N milliseconds (0 = wait forever)
    #[arg(long)]
    pub gpu_timeout_ms: Option<u64>,

    /// Collectors to disable (comma-separated: cpu,gpu,memory,disk,network)
    #[arg(long)]
    pub disable_collectors: Option<String>,

    /// Enable TLS/SSL for HTTPS
    #[arg(long)]
    pub enable_tls: bool,

    /// Path to TLS certificate file (PEM format)
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM format)
    #[arg(long)]
    pub tls_key: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe every data source the collectors read
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Run collection passes and print the samples
    Test {
        /// Number of collection passes
        #[arg(short = 'n', long, default_value_t = 2)]
        iterations: usize,

        /// Pause between passes in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}
