//! Collector configuration.
//!
//! Data source roots and naming lists are configuration rather than
//! compiled-in constants so collectors can run against synthetic trees.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Network interfaces monitored on a DGX Spark host.
pub const DEFAULT_INTERFACES: &[&str] = &[
    "enP7s7",
    "enp1s0f1np1",
    "enP2p1s0f1np1",
    "enp1s0f0np0",
    "enP2p1s0f0np0",
    "wlP9s9",
];

/// Block device name prefixes treated as physical disks.
pub const DEFAULT_DISK_INCLUDE: &[&str] = &["sd", "nvme", "vd", "hd", "xvd", "mmcblk"];

/// Block device name prefixes that are never reported.
pub const DEFAULT_DISK_EXCLUDE: &[&str] = &["loop", "ram", "dm-", "sr", "fd"];

/// Settings shared by all collectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Mount point of procfs (default: /proc)
    pub procfs_root: PathBuf,

    /// Mount point of sysfs (default: /sys)
    pub sysfs_root: PathBuf,

    /// Filesystem whose capacity is reported (default: /)
    pub capacity_mount: PathBuf,

    /// Number of thermal_zone slots searched for a CPU/SoC sensor (default: 10)
    #[serde(alias = "thermal-zone-scan-limit")]
    pub thermal_zone_scan_limit: usize,

    /// Upper bound on cpufreq core indices probed (default: 256)
    #[serde(alias = "max-cpu-cores")]
    pub max_cpu_cores: usize,

    /// Interfaces reported by the network collector, in output order
    #[serde(alias = "interfaces")]
    pub network_interfaces: Vec<String>,

    #[serde(alias = "disk-include-prefixes")]
    pub disk_include_prefixes: Vec<String>,

    #[serde(alias = "disk-exclude-prefixes")]
    pub disk_exclude_prefixes: Vec<String>,

    /// GPU query tool (default: nvidia-smi)
    #[serde(alias = "gpu-command")]
    pub gpu_command: String,

    /// Bound on one GPU tool invocation in milliseconds; 0 waits forever
    #[serde(alias = "gpu-timeout-ms")]
    pub gpu_timeout_ms: u64,

    pub enable_cpu: bool,
    pub enable_gpu: bool,
    pub enable_memory: bool,
    pub enable_disk: bool,
    pub enable_network: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            procfs_root: PathBuf::from("/proc"),
            sysfs_root: PathBuf::from("/sys"),
            capacity_mount: PathBuf::from("/"),
            thermal_zone_scan_limit: 10,
            max_cpu_cores: 256,
            network_interfaces: to_strings(DEFAULT_INTERFACES),
            disk_include_prefixes: to_strings(DEFAULT_DISK_INCLUDE),
            disk_exclude_prefixes: to_strings(DEFAULT_DISK_EXCLUDE),
            gpu_command: "nvidia-smi".to_string(),
            gpu_timeout_ms: 5000,
            enable_cpu: true,
            enable_gpu: true,
            enable_memory: true,
            enable_disk: true,
            enable_network: true,
        }
    }
}

impl CollectorConfig {
    /// Returns true when at least one collector is enabled.
    pub fn any_enabled(&self) -> bool {
        self.enable_cpu
            || self.enable_gpu
            || self.enable_memory
            || self.enable_disk
            || self.enable_network
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_dgx_spark_layout() {
        let cfg = CollectorConfig::default();
        assert_eq!(cfg.network_interfaces.len(), 6);
        assert_eq!(cfg.network_interfaces[0], "enP7s7");
        assert_eq!(cfg.thermal_zone_scan_limit, 10);
        assert!(cfg.any_enabled());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg: CollectorConfig =
            serde_yaml::from_str("interfaces: [eth0]\nenable_gpu: false\n").unwrap();
        assert_eq!(cfg.network_interfaces, vec!["eth0".to_string()]);
        assert!(!cfg.enable_gpu);
        assert_eq!(cfg.gpu_command, "nvidia-smi");
        assert_eq!(cfg.procfs_root, PathBuf::from("/proc"));
    }
}
