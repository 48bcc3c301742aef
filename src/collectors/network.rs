//! Network interface counters from /sys/class/net.
//!
//! Only interfaces named in the configured list are considered, and only
//! while their operstate reads `up`.

use std::path::PathBuf;
use tracing::debug;

use crate::collectors::source;
use crate::collectors::{Descriptor, MetricCollector, Sample};
use crate::settings::CollectorConfig;

const RX_BYTES: Descriptor = Descriptor::counter(
    "network_receive_bytes_total",
    "Total bytes received on network interface",
    &["interface"],
);
const TX_BYTES: Descriptor = Descriptor::counter(
    "network_transmit_bytes_total",
    "Total bytes transmitted on network interface",
    &["interface"],
);
const RX_PACKETS: Descriptor = Descriptor::counter(
    "network_receive_packets_total",
    "Total packets received on network interface",
    &["interface"],
);
const TX_PACKETS: Descriptor = Descriptor::counter(
    "network_transmit_packets_total",
    "Total packets transmitted on network interface",
    &["interface"],
);

/// Counter files read from `<iface>/statistics`, paired with their metric.
const STATISTICS: [(&str, &Descriptor); 4] = [
    ("rx_bytes", &RX_BYTES),
    ("tx_bytes", &TX_BYTES),
    ("rx_packets", &RX_PACKETS),
    ("tx_packets", &TX_PACKETS),
];

/// Collects byte and packet counters for a fixed set of interfaces.
pub struct NetworkCollector {
    net_root: PathBuf,
    interfaces: Vec<String>,
    descriptors: [Descriptor; 4],
}

impl NetworkCollector {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            net_root: config.sysfs_root.join("class/net"),
            interfaces: config.network_interfaces.clone(),
            descriptors: [RX_BYTES, TX_BYTES, RX_PACKETS, TX_PACKETS],
        }
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Checks that the interface exists and its operstate is exactly `up`.
    pub fn is_up(&self, iface: &str) -> bool {
        match source::read_trimmed(&self.net_root.join(iface).join("operstate")) {
            Ok(state) => state == "up",
            Err(_) => false,
        }
    }

    /// Reads one statistics counter, defaulting to 0 on any failure.
    fn read_counter(&self, iface: &str, file: &str) -> u64 {
        let path = self.net_root.join(iface).join("statistics").join(file);
        source::read_u64(&path).unwrap_or_else(|e| {
            debug!("Reporting 0 for {}: {}", path.display(), e);
            0
        })
    }
}

impl MetricCollector for NetworkCollector {
    fn name(&self) -> &'static str {
        "network"
    }

    fn describe(&self) -> &[Descriptor] {
        &self.descriptors
    }

    fn collect(&self) -> Vec<Sample> {
        let mut samples = Vec::new();

        for iface in &self.interfaces {
            if !self.is_up(iface) {
                continue;
            }

            for (file, desc) in STATISTICS {
                let value = self.read_counter(iface, file);
                samples.push(desc.sample(value as f64, &[iface.as_str()]));
            }
        }

        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_iface(dir: &TempDir, name: &str, state: &str, counters: &[(&str, &str)]) {
        let iface = dir.path().join("class/net").join(name);
        fs::create_dir_all(iface.join("statistics")).unwrap();
        fs::write(iface.join("operstate"), format!("{}\n", state)).unwrap();
        for (file, value) in counters {
            fs::write(iface.join("statistics").join(file), format!("{}\n", value)).unwrap();
        }
    }

    fn collector(dir: &TempDir, interfaces: &[&str]) -> NetworkCollector {
        let config = CollectorConfig {
            sysfs_root: dir.path().to_path_buf(),
            network_interfaces: interfaces.iter().map(|s| s.to_string()).collect(),
            ..CollectorConfig::default()
        };
        NetworkCollector::new(&config)
    }

    #[test]
    fn test_up_interface_emits_four_counters() {
        let dir = TempDir::new().unwrap();
        write_iface(
            &dir,
            "enP7s7",
            "up",
            &[
                ("rx_bytes", "1000"),
                ("tx_bytes", "2000"),
                ("rx_packets", "10"),
                ("tx_packets", "20"),
            ],
        );

        let samples = collector(&dir, &["enP7s7"]).collect();
        let values: Vec<(&str, f64)> = samples.iter().map(|s| (s.name, s.value)).collect();
        assert_eq!(
            values,
            vec![
                ("network_receive_bytes_total", 1000.0),
                ("network_transmit_bytes_total", 2000.0),
                ("network_receive_packets_total", 10.0),
                ("network_transmit_packets_total", 20.0),
            ]
        );
        assert!(samples.iter().all(|s| s.labels == vec!["enP7s7".to_string()]));
    }

    #[test]
    fn test_down_interface_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_iface(&dir, "wlP9s9", "down", &[("rx_bytes", "5")]);
        write_iface(&dir, "enP7s7", "dormant", &[("rx_bytes", "5")]);

        assert!(collector(&dir, &["wlP9s9", "enP7s7"]).collect().is_empty());
    }

    #[test]
    fn test_unlisted_interface_is_ignored() {
        let dir = TempDir::new().unwrap();
        write_iface(&dir, "eth0", "up", &[("rx_bytes", "5")]);

        assert!(collector(&dir, &["enP7s7"]).collect().is_empty());
    }

    #[test]
    fn test_missing_or_bad_counters_default_to_zero() {
        let dir = TempDir::new().unwrap();
        write_iface(&dir, "enP7s7", "up", &[("rx_bytes", "garbage"), ("tx_bytes", "7")]);

        let samples = collector(&dir, &["enP7s7"]).collect();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0].value, 0.0);
        assert_eq!(samples[1].value, 7.0);
        assert_eq!(samples[2].value, 0.0);
        assert_eq!(samples[3].value, 0.0);
    }

    #[test]
    fn test_output_follows_configured_order() {
        let dir = TempDir::new().unwrap();
        write_iface(&dir, "a0", "up", &[]);
        write_iface(&dir, "b0", "up", &[]);

        let samples = collector(&dir, &["b0", "a0"]).collect();
        assert_eq!(samples[0].labels, vec!["b0".to_string()]);
        assert_eq!(samples[4].labels, vec!["a0".to_string()]);
    }
}
