//! DGX Spark Exporter Library
//!
//! This library provides the host metric collectors behind the exporter
//! binary. Collectors are framework-agnostic: each one describes the metrics
//! it can produce and returns plain [`collectors::Sample`]s when asked. The
//! [`exposition`] module plugs them into a `prometheus::Registry`.
//!
//! # Features
//!
//! - **CPU**: usage from /proc/stat deltas, CPU/SoC thermal zone, mean cpufreq
//! - **GPU**: utilization, temperature, power and clock via `nvidia-smi`
//! - **Memory**: total and used RAM from /proc/meminfo
//! - **Disk**: per-device I/O completions and root filesystem usage
//! - **Network**: byte/packet counters for a fixed interface list
//!
//! # Usage
//!
//! ```rust,no_run
//! use dgx_spark_exporter::collectors::{MemoryCollector, MetricCollector};
//! use dgx_spark_exporter::CollectorConfig;
//!
//! let config = CollectorConfig::default();
//! let memory = MemoryCollector::new(&config);
//!
//! for sample in memory.collect() {
//!     println!("{} {}", sample.name, sample.value);
//! }
//! ```

pub mod collectors;
pub mod exposition;
pub mod health_stats;
pub mod settings;

// Re-export main types for convenience
pub use collectors::{Descriptor, MetricCollector, Sample, SampleKind};
pub use exposition::{build_registry, enabled_collectors, PrometheusBridge};
pub use settings::CollectorConfig;
