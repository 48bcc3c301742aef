//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("dgx-spark-exporter.yaml"),
    };

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# DGX Spark Prometheus Exporter Configuration
# ============================================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 9835                   # HTTP port
# enable_health: true          # Enable /health endpoint
# host_label: true             # Add host="<hostname>" to every series
# log_level: "info"            # off, error, warn, info, debug, trace
#
# TLS/SSL Configuration
# ---------------------
# enable_tls: false            # Enable HTTPS (default: false)
# tls_cert_path: null          # Path to TLS certificate (PEM format)
# tls_key_path: null           # Path to TLS private key (PEM format)
#
# Collectors
# ----------
# collectors:
#   procfs_root: /proc         # Where /proc/stat, meminfo, diskstats are read
#   sysfs_root: /sys           # Where thermal, cpufreq, net counters are read
#   capacity_mount: /          # Filesystem reported as storage_used_percent
#   thermal_zone_scan_limit: 10
#   max_cpu_cores: 256
#   network_interfaces: [...]  # Interfaces reported, in output order
#   disk_include_prefixes: [...]
#   disk_exclude_prefixes: [...] # Exclusion wins over inclusion
#   gpu_command: nvidia-smi
#   gpu_timeout_ms: 5000       # 0 = wait for the tool forever
#   enable_cpu / enable_gpu / enable_memory / enable_disk / enable_network
"#;

    format!("{comments}\n{yaml}")
}
