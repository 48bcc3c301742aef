//! Configuration management for dgx-spark-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use clap::ValueEnum;
use dgx_spark_exporter::CollectorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9835;

/// Exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Feature flags
    pub enable_health: Option<bool>,
    /// Attach host="<hostname>" to every exported series
    #[serde(alias = "host-label")]
    pub host_label: Option<bool>,

    // Logging
    pub log_level: Option<String>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,

    // Collector Configuration
    #[serde(default)]
    pub collectors: CollectorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            enable_health: Some(true),
            host_label: Some(true),
            log_level: Some("info".into()),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
            collectors: CollectorConfig::default(),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let collectors = &cfg.collectors;

    if !collectors.any_enabled() {
        return Err("At least one of enable_cpu/enable_gpu/enable_memory/enable_disk/\
             enable_network must be true"
            .into());
    }

    if collectors.enable_network && collectors.network_interfaces.is_empty() {
        return Err("Network collector is enabled but network_interfaces is empty".into());
    }

    if collectors.enable_disk {
        if collectors.disk_include_prefixes.is_empty() {
            return Err("Disk collector is enabled but disk_include_prefixes is empty".into());
        }
        if let Some(prefix) = collectors
            .disk_include_prefixes
            .iter()
            .find(|p| collectors.disk_exclude_prefixes.contains(p))
        {
            return Err(format!(
                "Disk prefix '{}' is listed in both disk_include_prefixes and \
                 disk_exclude_prefixes",
                prefix
            )
            .into());
        }
    }

    if collectors.enable_gpu && collectors.gpu_command.trim().is_empty() {
        return Err("GPU collector is enabled but gpu_command is empty".into());
    }

    if let Some(level) = &cfg.log_level {
        parse_log_level(level)?;
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                return Err(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                );
            }
            (Some(_), None) => {
                return Err("TLS is enabled but tls_key_path is not set".into());
            }
            (None, Some(_)) => {
                return Err("TLS is enabled but tls_cert_path is not set".into());
            }
            (Some(cert), Some(key)) => {
                check_pem_file(cert, "certificate")?;
                check_pem_file(key, "private key")?;
            }
        }
    }

    Ok(())
}

/// Parses a log level name as accepted by `--log-level`.
pub fn parse_log_level(level: &str) -> Result<LogLevel, Box<dyn std::error::Error>> {
    LogLevel::from_str(level, true).map_err(|_| {
        format!(
            "Invalid log_level '{}' (expected off, error, warn, info, debug or trace)",
            level
        )
        .into()
    })
}

/// Checks that a TLS file exists, is readable and not empty.
fn check_pem_file(path: &str, kind: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        return Err(format!("TLS {} file not found: {}", kind, path).into());
    }

    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => Err(format!("TLS {} file is empty: {}", kind, path).into()),
        Err(e) => {
            Err(format!("TLS {} file is not readable: {} ({})", kind, path, e).into())
        }
        Ok(_) => Ok(()),
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    // Override with CLI args
    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }

    // Only override port if the user supplied it on the CLI.
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.no_host_label {
        config.host_label = Some(false);
    }

    // Parse comma-separated interface list
    if let Some(interfaces) = &args.interfaces {
        config.collectors.network_interfaces = split_list(interfaces);
    }

    if let Some(command) = &args.gpu_command {
        config.collectors.gpu_command = command.clone();
    }
    if let Some(timeout_ms) = args.gpu_timeout_ms {
        config.collectors.gpu_timeout_ms = timeout_ms;
    }

    if let Some(disabled) = &args.disable_collectors {
        for name in split_list(disabled) {
            match name.as_str() {
                "cpu" => config.collectors.enable_cpu = false,
                "gpu" => config.collectors.enable_gpu = false,
                "memory" => config.collectors.enable_memory = false,
                "disk" => config.collectors.enable_disk = false,
                "network" => config.collectors.enable_network = false,
                other => return Err(format!("Unknown collector '{}'", other).into()),
            }
        }
    }

    if let Some(level) = args.log_level.as_ref().and_then(|l| l.to_possible_value()) {
        config.log_level = Some(level.get_name().to_string());
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            // Try default locations
            let defaults = [
                "/etc/dgx-spark-exporter/config.yaml",
                "/etc/dgx-spark-exporter/config.yml",
                "/etc/dgx-spark-exporter/config.json",
                "./dgx-spark-exporter.yaml",
                "./dgx-spark-exporter.yml",
                "./dgx-spark-exporter.json",
            ];

            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders configuration in the requested format
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}
