//! CPU usage, temperature and frequency collector.
//!
//! - Usage is derived from the aggregate `cpu` line of /proc/stat as the
//!   busy share of ticks elapsed since the previous scrape.
//! - Temperature comes from the first thermal zone whose type names a CPU or
//!   SoC sensor, falling back to thermal_zone0.
//! - Frequency is the mean of every core's cpufreq `scaling_cur_freq`.
//!
//! The three sub-metrics are read independently; a failure in one never
//! suppresses the others.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use crate::collectors::source::{self, SourceError};
use crate::collectors::{Descriptor, MetricCollector, Sample};
use crate::settings::CollectorConfig;

const USAGE: Descriptor = Descriptor::gauge("cpu_usage_percent", "CPU usage percentage (0-100)");
const TEMPERATURE: Descriptor = Descriptor::gauge(
    "cpu_temperature_celsius",
    "CPU temperature in degrees Celsius",
);
const FREQUENCY: Descriptor =
    Descriptor::gauge("cpu_frequency_mhz", "Average CPU core frequency in MHz");

/// Aggregate tick counters taken from one /proc/stat read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub total: u64,
    /// idle + iowait
    pub idle: u64,
}

/// Parses the aggregate `cpu ` line of /proc/stat.
///
/// Fields: cpu user nice system idle iowait irq softirq [steal guest guest_nice].
/// Only the first seven counters contribute to the total.
pub fn parse_stat(content: &str, path: &Path) -> Result<CpuTicks, SourceError> {
    let line = content
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| SourceError::malformed(path, "no aggregate cpu line"))?;

    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 8 {
        return Err(SourceError::malformed(
            path,
            format!("expected at least 8 fields, got {}", parts.len()),
        ));
    }

    let mut counters = [0u64; 7];
    for (slot, raw) in counters.iter_mut().zip(&parts[1..8]) {
        *slot = raw.parse::<u64>().map_err(|_| SourceError::Parse {
            path: path.to_path_buf(),
            value: raw.to_string(),
        })?;
    }

    let overflow = || SourceError::malformed(path, "tick counters overflow u64");
    let total = counters
        .iter()
        .try_fold(0u64, |acc, &v| acc.checked_add(v))
        .ok_or_else(overflow)?;
    let idle = counters[3].checked_add(counters[4]).ok_or_else(overflow)?;

    Ok(CpuTicks { total, idle })
}

/// Busy percentage between two tick snapshots.
///
/// A zero previous total means there is no baseline yet and yields 0.
/// The result is not clamped: counter resets pass through as computed.
pub fn usage_percent(previous: CpuTicks, current: CpuTicks) -> f64 {
    if previous.total == 0 {
        return 0.0;
    }

    let total_delta = current.total as i128 - previous.total as i128;
    let idle_delta = current.idle as i128 - previous.idle as i128;
    if total_delta == 0 {
        return 0.0;
    }

    (total_delta - idle_delta) as f64 / total_delta as f64 * 100.0
}

/// Collects CPU usage, temperature and frequency.
pub struct CpuCollector {
    stat_path: PathBuf,
    thermal_root: PathBuf,
    cpufreq_root: PathBuf,
    thermal_zone_scan_limit: usize,
    max_cpu_cores: usize,
    previous: Mutex<CpuTicks>,
    descriptors: [Descriptor; 3],
}

impl CpuCollector {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            stat_path: config.procfs_root.join("stat"),
            thermal_root: config.sysfs_root.join("class/thermal"),
            cpufreq_root: config.sysfs_root.join("devices/system/cpu"),
            thermal_zone_scan_limit: config.thermal_zone_scan_limit,
            max_cpu_cores: config.max_cpu_cores,
            previous: Mutex::new(CpuTicks::default()),
            descriptors: [USAGE, TEMPERATURE, FREQUENCY],
        }
    }

    /// Reads /proc/stat and advances the stored baseline.
    ///
    /// The lock is held across read, compute and store so concurrent scrapes
    /// on a shared collector cannot interleave their snapshots.
    pub fn read_usage(&self) -> Result<f64, SourceError> {
        let mut previous = self
            .previous
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let content = source::read_to_string(&self.stat_path)?;
        let current = parse_stat(&content, &self.stat_path)?;

        let last = std::mem::replace(&mut *previous, current);
        Ok(usage_percent(last, current))
    }

    /// Reads the CPU/SoC thermal zone temperature in degrees Celsius.
    pub fn read_temperature(&self) -> Result<f64, SourceError> {
        for index in 0..self.thermal_zone_scan_limit {
            let zone = self.thermal_root.join(format!("thermal_zone{}", index));
            let zone_type = match source::read_trimmed(&zone.join("type")) {
                Ok(t) => t.to_lowercase(),
                Err(_) => continue,
            };

            if zone_type.contains("cpu") || zone_type.contains("soc") {
                debug!("Using thermal zone {} ({}) for CPU temperature", index, zone_type);
                return read_millidegrees(&zone.join("temp"));
            }
        }

        read_millidegrees(&self.thermal_root.join("thermal_zone0/temp"))
    }

    /// Reads the mean current core frequency in MHz.
    pub fn read_frequency(&self) -> Result<f64, SourceError> {
        let mut sum_khz = 0.0;
        let mut count = 0usize;

        for core in 0..self.max_cpu_cores {
            let path = self
                .cpufreq_root
                .join(format!("cpu{}/cpufreq/scaling_cur_freq", core));

            let content = match source::read_trimmed(&path) {
                Ok(c) => c,
                // cpu0 missing means no cpufreq support at all
                Err(e) if core == 0 => return Err(e),
                Err(_) => break,
            };

            match content.parse::<f64>() {
                Ok(khz) => {
                    sum_khz += khz;
                    count += 1;
                }
                Err(_) => debug!(
                    "Skipping unparsable frequency {:?} in {}",
                    content,
                    path.display()
                ),
            }
        }

        if count == 0 {
            return Err(SourceError::Unavailable(
                "no parsable scaling_cur_freq values".to_string(),
            ));
        }

        Ok(sum_khz / count as f64 / 1000.0)
    }
}

fn read_millidegrees(path: &Path) -> Result<f64, SourceError> {
    source::read_f64(path).map(|millidegrees| millidegrees / 1000.0)
}

impl MetricCollector for CpuCollector {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn describe(&self) -> &[Descriptor] {
        &self.descriptors
    }

    fn collect(&self) -> Vec<Sample> {
        let readings = [
            (&USAGE, self.read_usage()),
            (&TEMPERATURE, self.read_temperature()),
            (&FREQUENCY, self.read_frequency()),
        ];

        let mut samples = Vec::with_capacity(readings.len());
        for (desc, reading) in readings {
            match reading {
                Ok(value) => samples.push(desc.sample(value, &[])),
                Err(e) => debug!("{} absent: {}", desc.name, e),
            }
        }
        samples
    }
}
