//! Collectors module for host metrics.
//!
//! Each collector reads one category of OS/hardware state (CPU, GPU, memory,
//! disk, network) and turns it into typed [`Sample`]s. Collectors are
//! independent of each other and are invoked once per scrape.
//!
//! A collector never fails as a whole: sub-metrics whose source is missing or
//! malformed are simply left out of the returned samples.

pub mod cpu;
pub mod disk;
pub mod gpu;
pub mod memory;
pub mod network;
pub mod source;

pub use cpu::CpuCollector;
pub use disk::DiskCollector;
pub use gpu::GpuCollector;
pub use memory::MemoryCollector;
pub use network::NetworkCollector;

/// Kind of a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Gauge,
    Counter,
}

/// Static description of a metric a collector may emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub help: &'static str,
    pub label_names: &'static [&'static str],
    pub kind: SampleKind,
}

impl Descriptor {
    pub const fn gauge(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            label_names: &[],
            kind: SampleKind::Gauge,
        }
    }

    pub const fn counter(
        name: &'static str,
        help: &'static str,
        label_names: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            label_names,
            kind: SampleKind::Counter,
        }
    }

    /// Builds a sample for this descriptor.
    pub fn sample(&self, value: f64, labels: &[&str]) -> Sample {
        Sample {
            name: self.name,
            kind: self.kind,
            value,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// One measured value, produced and consumed within a single collection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: &'static str,
    pub kind: SampleKind,
    pub value: f64,
    /// Label values in the order of the descriptor's `label_names`.
    pub labels: Vec<String>,
}

/// A source of host metrics.
///
/// `describe` must be stable for the lifetime of the collector, and `collect`
/// must only emit samples whose name appears in `describe`.
pub trait MetricCollector: Send + Sync {
    /// Short collector name used in logs and self-telemetry labels.
    fn name(&self) -> &'static str;

    fn describe(&self) -> &[Descriptor];

    /// Reads current values. May return fewer samples than descriptors.
    fn collect(&self) -> Vec<Sample>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_sample_copies_labels_in_order() {
        const DESC: Descriptor =
            Descriptor::counter("reads_total", "Reads", &["device", "queue"]);
        let sample = DESC.sample(3.0, &["sda", "0"]);

        assert_eq!(sample.name, "reads_total");
        assert_eq!(sample.kind, SampleKind::Counter);
        assert_eq!(sample.labels, vec!["sda".to_string(), "0".to_string()]);
    }

    #[test]
    fn test_gauge_descriptor_has_no_labels() {
        let desc = Descriptor::gauge("usage", "Usage");
        assert!(desc.label_names.is_empty());
        assert_eq!(desc.kind, SampleKind::Gauge);
    }
}
