//! Memory collector reading /proc/meminfo.

use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use crate::collectors::source::{self, SourceError};
use crate::collectors::{Descriptor, MetricCollector, Sample};
use crate::settings::CollectorConfig;

const TOTAL: Descriptor = Descriptor::gauge("memory_total_bytes", "Total physical RAM in bytes");
const USED: Descriptor = Descriptor::gauge(
    "memory_used_bytes",
    "Used RAM in bytes (total - free - buffers - cached)",
);

/// Parses `Key: value [kB]` lines into a map of key to kB value.
///
/// Lines without a colon or with a non-integer value are skipped.
pub fn parse_meminfo(content: &str) -> HashMap<String, u64> {
    let mut info = HashMap::new();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        let value = value.trim();
        let value = value.strip_suffix("kB").unwrap_or(value).trim();

        if let Ok(kb) = value.parse::<u64>() {
            info.insert(key.trim().to_string(), kb);
        }
    }

    info
}

/// Total and used memory in bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryUsage {
    pub total_bytes: f64,
    pub used_bytes: f64,
}

/// Computes total/used from parsed meminfo.
///
/// Used is `total - free - buffers - cached`; when a racy snapshot makes that
/// negative, `total - free` is reported instead.
pub fn memory_usage(info: &HashMap<String, u64>) -> Result<MemoryUsage, SourceError> {
    let field = |key: &str| {
        info.get(key)
            .copied()
            .map(i128::from)
            .ok_or_else(|| SourceError::Unavailable(format!("{} missing from meminfo", key)))
    };

    let total = field("MemTotal")?;
    let free = field("MemFree")?;
    let buffers = field("Buffers")?;
    let cached = field("Cached")?;

    let mut used_kb = total - free - buffers - cached;
    if used_kb < 0 {
        used_kb = total - free;
    }

    Ok(MemoryUsage {
        total_bytes: (total * 1024) as f64,
        used_bytes: (used_kb * 1024) as f64,
    })
}

/// Collects total and used RAM.
pub struct MemoryCollector {
    meminfo_path: PathBuf,
    descriptors: [Descriptor; 2],
}

impl MemoryCollector {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            meminfo_path: config.procfs_root.join("meminfo"),
            descriptors: [TOTAL, USED],
        }
    }

    pub fn read_usage(&self) -> Result<MemoryUsage, SourceError> {
        let content = source::read_to_string(&self.meminfo_path)?;
        memory_usage(&parse_meminfo(&content))
    }
}

impl MetricCollector for MemoryCollector {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn describe(&self) -> &[Descriptor] {
        &self.descriptors
    }

    fn collect(&self) -> Vec<Sample> {
        match self.read_usage() {
            Ok(usage) => vec![
                TOTAL.sample(usage.total_bytes, &[]),
                USED.sample(usage.used_bytes, &[]),
            ],
            Err(e) => {
                debug!("Memory metrics absent: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MEMINFO: &str = "MemTotal:           1000 kB\n\
                           MemFree:             200 kB\n\
                           MemAvailable:        500 kB\n\
                           Buffers:             100 kB\n\
                           Cached:              100 kB\n\
                           HugePages_Total:       0\n";

    #[test]
    fn test_parse_meminfo_strips_unit() {
        let info = parse_meminfo(MEMINFO);
        assert_eq!(info.get("MemTotal"), Some(&1000));
        assert_eq!(info.get("HugePages_Total"), Some(&0));
    }

    #[test]
    fn test_parse_meminfo_skips_bad_lines() {
        let info = parse_meminfo("garbage line\nMemFree: lots kB\nCached: 7 kB\n");
        assert_eq!(info.len(), 1);
        assert_eq!(info.get("Cached"), Some(&7));
    }

    #[test]
    fn test_used_excludes_buffers_and_cache() {
        let usage = memory_usage(&parse_meminfo(MEMINFO)).unwrap();
        assert_eq!(usage.total_bytes, 1000.0 * 1024.0);
        assert_eq!(usage.used_bytes, 600.0 * 1024.0);
    }

    #[test]
    fn test_negative_used_falls_back_to_total_minus_free() {
        let info = parse_meminfo(
            "MemTotal: 1000 kB\nMemFree: 200 kB\nBuffers: 300 kB\nCached: 600 kB\n",
        );
        let usage = memory_usage(&info).unwrap();
        assert_eq!(usage.used_bytes, 800.0 * 1024.0);
    }

    #[test]
    fn test_missing_required_key() {
        let info = parse_meminfo("MemTotal: 1000 kB\nMemFree: 200 kB\n");
        assert!(memory_usage(&info).is_err());
    }

    #[test]
    fn test_collect_from_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("meminfo"), MEMINFO).unwrap();
        let config = CollectorConfig {
            procfs_root: dir.path().to_path_buf(),
            ..CollectorConfig::default()
        };

        let samples = MemoryCollector::new(&config).collect();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].name, "memory_total_bytes");
        assert_eq!(samples[1].value, 614400.0);
    }

    #[test]
    fn test_collect_without_source_is_empty() {
        let dir = TempDir::new().unwrap();
        let config = CollectorConfig {
            procfs_root: dir.path().to_path_buf(),
            ..CollectorConfig::default()
        };
        assert!(MemoryCollector::new(&config).collect().is_empty());
    }
}
