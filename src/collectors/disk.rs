//! Disk I/O and root filesystem capacity collector.
//!
//! I/O completions come from /proc/diskstats for physical block devices only;
//! capacity comes from statvfs on the configured mount point.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::collectors::source::{self, has_any_prefix, SourceError};
use crate::collectors::{Descriptor, MetricCollector, Sample};
use crate::settings::CollectorConfig;

const READS: Descriptor = Descriptor::counter(
    "diskio_reads_completed_total",
    "Total number of completed disk read operations (use rate() in PromQL for IOPS)",
    &["device"],
);
const WRITES: Descriptor = Descriptor::counter(
    "diskio_writes_completed_total",
    "Total number of completed disk write operations (use rate() in PromQL for IOPS)",
    &["device"],
);
const USED_PERCENT: Descriptor = Descriptor::gauge(
    "storage_used_percent",
    "Used storage capacity of / filesystem in percent",
);

/// Completed I/O operations of one block device.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskIo {
    pub device: String,
    pub reads_completed: f64,
    pub writes_completed: f64,
}

/// Block device name filter: excludes win over includes.
#[derive(Debug, Clone)]
pub struct DeviceFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl DeviceFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    pub fn matches(&self, device: &str) -> bool {
        !has_any_prefix(device, &self.exclude) && has_any_prefix(device, &self.include)
    }
}

/// Parses /proc/diskstats, keeping devices accepted by `filter`.
///
/// Format: major minor name reads_completed reads_merged sectors_read
/// time_reading writes_completed ... (at least 14 fields per line).
pub fn parse_diskstats(content: &str, filter: &DeviceFilter) -> Vec<DiskIo> {
    let mut devices = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 {
            continue;
        }

        let device = parts[2];
        if !filter.matches(device) {
            continue;
        }

        devices.push(DiskIo {
            device: device.to_string(),
            reads_completed: parts[3].parse().unwrap_or(0.0),
            writes_completed: parts[7].parse().unwrap_or(0.0),
        });
    }

    devices
}

/// Used share of a filesystem from the unprivileged user's point of view.
pub fn used_percent(total_bytes: u64, available_bytes: u64) -> Option<f64> {
    if total_bytes == 0 {
        return None;
    }
    Some(total_bytes.saturating_sub(available_bytes) as f64 / total_bytes as f64 * 100.0)
}

/// Returns (total_bytes, available_bytes) for the filesystem holding `path`.
pub fn filesystem_capacity(path: &Path) -> Result<(u64, u64), SourceError> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| SourceError::Unavailable(format!("invalid path {}: {}", path.display(), e)))?;

    // SAFETY: statvfs is a plain C struct, valid when zeroed, and c_path
    // stays alive for the duration of the call.
    let stat = unsafe {
        let mut stat: libc::statvfs = std::mem::zeroed();
        if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
            return Err(SourceError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::last_os_error(),
            });
        }
        stat
    };

    let block_size = stat.f_frsize as u64;
    let total = (stat.f_blocks as u64).saturating_mul(block_size);
    let available = (stat.f_bavail as u64).saturating_mul(block_size);
    Ok((total, available))
}

/// Collects per-device I/O completions and root filesystem usage.
pub struct DiskCollector {
    diskstats_path: PathBuf,
    capacity_mount: PathBuf,
    filter: DeviceFilter,
    descriptors: [Descriptor; 3],
}

impl DiskCollector {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            diskstats_path: config.procfs_root.join("diskstats"),
            capacity_mount: config.capacity_mount.clone(),
            filter: DeviceFilter::new(
                config.disk_include_prefixes.clone(),
                config.disk_exclude_prefixes.clone(),
            ),
            descriptors: [READS, WRITES, USED_PERCENT],
        }
    }

    pub fn read_io(&self) -> Result<Vec<DiskIo>, SourceError> {
        let content = source::read_to_string(&self.diskstats_path)?;
        Ok(parse_diskstats(&content, &self.filter))
    }

    pub fn read_used_percent(&self) -> Result<f64, SourceError> {
        let (total, available) = filesystem_capacity(&self.capacity_mount)?;
        used_percent(total, available).ok_or_else(|| {
            SourceError::Unavailable(format!(
                "{} reports zero capacity",
                self.capacity_mount.display()
            ))
        })
    }
}

impl MetricCollector for DiskCollector {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn describe(&self) -> &[Descriptor] {
        &self.descriptors
    }

    fn collect(&self) -> Vec<Sample> {
        let mut samples = Vec::new();

        match self.read_io() {
            Ok(devices) => {
                for io in devices {
                    samples.push(READS.sample(io.reads_completed, &[io.device.as_str()]));
                    samples.push(WRITES.sample(io.writes_completed, &[io.device.as_str()]));
                }
            }
            Err(e) => debug!("Disk I/O metrics absent: {}", e),
        }

        match self.read_used_percent() {
            Ok(percent) => samples.push(USED_PERCENT.sample(percent, &[])),
            Err(e) => debug!("{} absent: {}", USED_PERCENT.name, e),
        }

        samples
    }
}
