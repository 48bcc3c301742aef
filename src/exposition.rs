//! Prometheus registry wiring for collectors.
//!
//! [`PrometheusBridge`] adapts a [`MetricCollector`] to the
//! `prometheus::core::Collector` trait so that every `Registry::gather()`
//! runs the collector once and exports exactly the samples it produced.

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{CounterVec, GaugeVec, Opts, Registry};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, warn};

use crate::collectors::{
    CpuCollector, Descriptor, DiskCollector, GpuCollector, MemoryCollector, MetricCollector,
    NetworkCollector, Sample, SampleKind,
};
use crate::settings::CollectorConfig;

/// Per-collector self-telemetry shared by all bridges of one registry.
#[derive(Clone)]
pub struct CollectorTelemetry {
    pub duration_seconds: GaugeVec,
    pub samples: GaugeVec,
}

impl CollectorTelemetry {
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let duration_seconds = GaugeVec::new(
            Opts::new(
                "exporter_collector_duration_seconds",
                "Time spent in the last collection pass of each collector",
            ),
            &["collector"],
        )?;
        let samples = GaugeVec::new(
            Opts::new(
                "exporter_collector_samples",
                "Number of samples produced by the last collection pass of each collector",
            ),
            &["collector"],
        )?;

        registry.register(Box::new(duration_seconds.clone()))?;
        registry.register(Box::new(samples.clone()))?;

        Ok(Self {
            duration_seconds,
            samples,
        })
    }
}

/// Exposes one [`MetricCollector`] through a Prometheus registry.
pub struct PrometheusBridge {
    inner: Box<dyn MetricCollector>,
    descs: Vec<Desc>,
    telemetry: Option<CollectorTelemetry>,
}

impl PrometheusBridge {
    pub fn new(inner: Box<dyn MetricCollector>) -> prometheus::Result<Self> {
        let descs = inner
            .describe()
            .iter()
            .map(|d| {
                Desc::new(
                    d.name.to_string(),
                    d.help.to_string(),
                    d.label_names.iter().map(|l| l.to_string()).collect(),
                    HashMap::new(),
                )
            })
            .collect::<prometheus::Result<Vec<_>>>()?;

        Ok(Self {
            inner,
            descs,
            telemetry: None,
        })
    }

    pub fn with_telemetry(mut self, telemetry: CollectorTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn collector_name(&self) -> &'static str {
        self.inner.name()
    }
}

impl Collector for PrometheusBridge {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let start = Instant::now();
        let samples = self.inner.collect();
        let elapsed = start.elapsed().as_secs_f64();

        let name = self.inner.name();
        debug!(
            "Collector {} produced {} samples in {:.3}ms",
            name,
            samples.len(),
            elapsed * 1000.0
        );

        if let Some(telemetry) = &self.telemetry {
            telemetry
                .duration_seconds
                .with_label_values(&[name])
                .set(elapsed);
            telemetry
                .samples
                .with_label_values(&[name])
                .set(samples.len() as f64);
        }

        encode_samples(name, self.inner.describe(), &samples)
    }
}

/// Groups samples by descriptor and converts them to metric families.
///
/// Samples whose name was not declared, or whose label count does not match
/// the descriptor, are dropped.
pub fn encode_samples(
    collector: &str,
    descriptors: &[Descriptor],
    samples: &[Sample],
) -> Vec<MetricFamily> {
    for sample in samples {
        match descriptors.iter().find(|d| d.name == sample.name) {
            None => warn!(
                "Collector {} emitted undeclared metric {}, dropping",
                collector, sample.name
            ),
            Some(desc) if desc.label_names.len() != sample.labels.len() => warn!(
                "Collector {} emitted {} with {} labels, expected {}, dropping",
                collector,
                sample.name,
                sample.labels.len(),
                desc.label_names.len()
            ),
            Some(_) => {}
        }
    }

    let mut families = Vec::new();

    for desc in descriptors {
        let matching: Vec<&Sample> = samples
            .iter()
            .filter(|s| s.name == desc.name && s.labels.len() == desc.label_names.len())
            .collect();
        if matching.is_empty() {
            continue;
        }

        let opts = Opts::new(desc.name, desc.help);
        let result = match desc.kind {
            SampleKind::Gauge => GaugeVec::new(opts, desc.label_names).map(|vec| {
                for sample in &matching {
                    vec.with_label_values(&label_refs(sample)).set(sample.value);
                }
                vec.collect()
            }),
            SampleKind::Counter => CounterVec::new(opts, desc.label_names).map(|vec| {
                for sample in &matching {
                    if sample.value >= 0.0 {
                        vec.with_label_values(&label_refs(sample))
                            .inc_by(sample.value);
                    }
                }
                vec.collect()
            }),
        };

        match result {
            Ok(mut encoded) => families.append(&mut encoded),
            Err(e) => warn!("Failed to encode {} from {}: {}", desc.name, collector, e),
        }
    }

    families
}

fn label_refs(sample: &Sample) -> Vec<&str> {
    sample.labels.iter().map(String::as_str).collect()
}

/// Instantiates every collector enabled in `config`.
pub fn enabled_collectors(config: &CollectorConfig) -> Vec<Box<dyn MetricCollector>> {
    let mut collectors: Vec<Box<dyn MetricCollector>> = Vec::new();

    if config.enable_cpu {
        collectors.push(Box::new(CpuCollector::new(config)));
    }
    if config.enable_gpu {
        collectors.push(Box::new(GpuCollector::new(config)));
    }
    if config.enable_memory {
        collectors.push(Box::new(MemoryCollector::new(config)));
    }
    if config.enable_disk {
        collectors.push(Box::new(DiskCollector::new(config)));
    }
    if config.enable_network {
        collectors.push(Box::new(NetworkCollector::new(config)));
    }

    collectors
}

/// Creates a registry with the enabled collectors and their self-telemetry.
///
/// `const_labels` are attached to every exported series (e.g. `host`).
pub fn build_registry(
    config: &CollectorConfig,
    const_labels: HashMap<String, String>,
) -> prometheus::Result<Registry> {
    let labels = if const_labels.is_empty() {
        None
    } else {
        Some(const_labels)
    };
    let registry = Registry::new_custom(None, labels)?;
    let telemetry = CollectorTelemetry::new(&registry)?;

    for collector in enabled_collectors(config) {
        let bridge = PrometheusBridge::new(collector)?.with_telemetry(telemetry.clone());
        debug!("Registering {} collector", bridge.collector_name());
        registry.register(Box::new(bridge))?;
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOAD: Descriptor = Descriptor::gauge("test_load", "Load");
    const BYTES: Descriptor = Descriptor::counter("test_bytes_total", "Bytes", &["iface"]);

    struct Fixed(Vec<Sample>);

    impl MetricCollector for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn describe(&self) -> &[Descriptor] {
            &[LOAD, BYTES]
        }

        fn collect(&self) -> Vec<Sample> {
            self.0.clone()
        }
    }

    #[test]
    fn test_encode_groups_by_descriptor() {
        let samples = vec![
            BYTES.sample(10.0, &["eth0"]),
            LOAD.sample(0.5, &[]),
            BYTES.sample(20.0, &["eth1"]),
        ];
        let families = encode_samples("fixed", &[LOAD, BYTES], &samples);

        assert_eq!(families.len(), 2);
        assert_eq!(families[0].get_name(), "test_load");
        assert_eq!(families[1].get_name(), "test_bytes_total");
        assert_eq!(families[1].get_metric().len(), 2);
    }

    #[test]
    fn test_encode_drops_undeclared_and_mislabelled_samples() {
        let stray = Sample {
            name: "not_declared",
            kind: SampleKind::Gauge,
            value: 1.0,
            labels: Vec::new(),
        };
        let samples = vec![stray, BYTES.sample(3.0, &[])];

        assert!(encode_samples("fixed", &[LOAD, BYTES], &samples).is_empty());
    }

    #[test]
    fn test_absent_metrics_are_not_exported() {
        let registry = Registry::new();
        let bridge = PrometheusBridge::new(Box::new(Fixed(vec![LOAD.sample(1.5, &[])]))).unwrap();
        registry.register(Box::new(bridge)).unwrap();

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|f| f.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["test_load".to_string()]);
    }

    #[test]
    fn test_bridge_updates_telemetry() {
        let registry = Registry::new();
        let telemetry = CollectorTelemetry::new(&registry).unwrap();
        let bridge = PrometheusBridge::new(Box::new(Fixed(vec![LOAD.sample(1.0, &[])])))
            .unwrap()
            .with_telemetry(telemetry.clone());
        registry.register(Box::new(bridge)).unwrap();

        registry.gather();
        assert_eq!(telemetry.samples.with_label_values(&["fixed"]).get(), 1.0);
    }

    #[test]
    fn test_build_registry_with_nothing_enabled() {
        let config = CollectorConfig {
            enable_cpu: false,
            enable_gpu: false,
            enable_memory: false,
            enable_disk: false,
            enable_network: false,
            ..CollectorConfig::default()
        };
        let registry = build_registry(&config, HashMap::new()).unwrap();
        assert!(registry.gather().is_empty());
    }
}
