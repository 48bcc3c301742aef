//! Startup requirement validation for dgx-spark-exporter.
//!
//! This module checks that the data sources the enabled collectors read
//! are reachable before the server starts. Failures are reported but the
//! exporter starts anyway and omits what it cannot read.

use dgx_spark_exporter::CollectorConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Validate all runtime requirements
pub fn validate_requirements(config: &CollectorConfig) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    check_procfs(config)?;
    check_sysfs(config);

    if config.enable_gpu {
        check_gpu_command(&config.gpu_command)?;
    }

    info!("✅ All runtime requirements validated");
    Ok(())
}

fn check_procfs(config: &CollectorConfig) -> Result<(), ValidationError> {
    let mut required = Vec::new();
    if config.enable_cpu {
        required.push("stat");
    }
    if config.enable_memory {
        required.push("meminfo");
    }
    if config.enable_disk {
        required.push("diskstats");
    }

    for name in required {
        let path = config.procfs_root.join(name);
        if let Err(e) = fs::metadata(&path) {
            error!("❌ Cannot access {}: {}", path.display(), e);
            return Err(ValidationError::SourceUnavailable {
                path,
                reason: e.to_string(),
            });
        }
    }

    info!("✅ procfs sources accessible under {}", config.procfs_root.display());
    Ok(())
}

fn check_sysfs(config: &CollectorConfig) {
    let net = config.sysfs_root.join("class/net");
    if config.enable_network && !net.is_dir() {
        warn!("⚠️  {} not found - network counters will be missing", net.display());
    }

    let thermal = config.sysfs_root.join("class/thermal");
    if config.enable_cpu && !thermal.is_dir() {
        warn!(
            "⚠️  {} not found - cpu_temperature_celsius will be missing",
            thermal.display()
        );
    }
}

/// Resolves a command the way the shell would: as given if it has a path
/// separator, otherwise by searching `PATH`.
pub fn find_command(command: &str) -> Option<PathBuf> {
    if command.contains('/') {
        let path = PathBuf::from(command);
        return path.is_file().then_some(path);
    }

    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(command))
        .find(|candidate| candidate.is_file())
}

fn check_gpu_command(command: &str) -> Result<(), ValidationError> {
    match find_command(command) {
        Some(path) => {
            info!("✅ GPU query tool found at {}", path.display());
            Ok(())
        }
        None => {
            error!("❌ GPU query tool '{}' not found", command);
            error!("   GPU metrics will be missing until it is installed");
            error!("   or the collector is disabled (--disable-collectors gpu)");
            Err(ValidationError::CommandNotFound(command.to_string()))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{} is not accessible: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("GPU query tool not found: {0}")]
    CommandNotFound(String),
}

impl ValidationError {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ValidationError::SourceUnavailable { path, .. } => Some(path),
            ValidationError::CommandNotFound(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(root: &Path) -> CollectorConfig {
        CollectorConfig {
            procfs_root: root.join("proc"),
            sysfs_root: root.join("sys"),
            enable_gpu: false,
            ..CollectorConfig::default()
        }
    }

    #[test]
    fn test_missing_procfs_source_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("proc")).unwrap();
        fs::write(dir.path().join("proc/stat"), "cpu  1 2 3 4 5 6 7\n").unwrap();

        let err = validate_requirements(&config_for(dir.path())).unwrap_err();
        assert_eq!(err.path(), Some(dir.path().join("proc/meminfo").as_path()));
    }

    #[test]
    fn test_complete_procfs_passes() {
        let dir = TempDir::new().unwrap();
        let proc = dir.path().join("proc");
        fs::create_dir_all(&proc).unwrap();
        for name in ["stat", "meminfo", "diskstats"] {
            fs::write(proc.join(name), "").unwrap();
        }

        assert!(validate_requirements(&config_for(dir.path())).is_ok());
    }

    #[test]
    fn test_find_command() {
        assert!(find_command("sh").is_some());
        assert!(find_command("/nonexistent/nvidia-smi").is_none());
        assert!(find_command("definitely-not-a-real-tool-xyz").is_none());
    }
}
