//! Check command implementation.
//!
//! Probes every data source the enabled collectors read and validates
//! the configuration.

use std::fmt::Display;

use dgx_spark_exporter::collectors::{
    CpuCollector, DiskCollector, GpuCollector, MemoryCollector, NetworkCollector,
};

use crate::config::{validate_effective_config, Config};

/// Prints one probe result and reports whether it succeeded.
fn report<T, E: Display>(
    label: &str,
    result: Result<T, E>,
    show: impl FnOnce(T) -> String,
) -> bool {
    match result {
        Ok(value) => {
            println!("   ✅ {}: {}", label, show(value));
            true
        }
        Err(e) => {
            println!("   ❌ {}: {}", label, e);
            false
        }
    }
}

/// Validates data sources and configuration.
///
/// Missing thermal zones, cpufreq entries or a down interface are reported
/// as warnings because the exporter simply omits those series.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 DGX Spark Exporter - System Check");
    println!("====================================");

    let collectors = &config.collectors;
    let mut all_ok = true;

    if collectors.enable_cpu {
        println!("\n🧮 Checking CPU sources...");
        let cpu = CpuCollector::new(collectors);
        all_ok &= report("/proc/stat", cpu.read_usage(), |_| {
            "aggregate cpu line parsed".to_string()
        });
        if !report("temperature", cpu.read_temperature(), |c| format!("{:.1} °C", c)) {
            println!("   ⚠️  cpu_temperature_celsius will not be exported");
        }
        if !report("frequency", cpu.read_frequency(), |mhz| format!("{:.0} MHz", mhz)) {
            println!("   ⚠️  cpu_frequency_mhz will not be exported");
        }
    }

    if collectors.enable_gpu {
        println!("\n🎮 Checking GPU query tool ({})...", collectors.gpu_command);
        let gpu = GpuCollector::new(collectors);
        all_ok &= report("nvidia-smi", gpu.read(), |r| {
            format!(
                "{:.0}% util, {:.0} °C, {:.1} W, {:.0} MHz",
                r.utilization_percent, r.temperature_celsius, r.power_watts, r.frequency_mhz
            )
        });
    }

    if collectors.enable_memory {
        println!("\n💾 Checking /proc/meminfo...");
        let memory = MemoryCollector::new(collectors);
        all_ok &= report("meminfo", memory.read_usage(), |m| {
            format!(
                "{} MB used of {} MB",
                m.used_bytes as u64 / 1024 / 1024,
                m.total_bytes as u64 / 1024 / 1024
            )
        });
    }

    if collectors.enable_disk {
        println!("\n📀 Checking disk sources...");
        let disk = DiskCollector::new(collectors);
        all_ok &= report("diskstats", disk.read_io(), |devices| {
            let names: Vec<String> = devices.into_iter().map(|d| d.device).collect();
            format!("{} devices ({})", names.len(), names.join(", "))
        });
        all_ok &= report(
            &collectors.capacity_mount.display().to_string(),
            disk.read_used_percent(),
            |pct| format!("{:.1}% used", pct),
        );
    }

    if collectors.enable_network {
        println!("\n🌐 Checking network interfaces...");
        let network = NetworkCollector::new(collectors);
        let mut up = 0;
        for iface in network.interfaces() {
            if network.is_up(iface) {
                up += 1;
                println!("   ✅ {}: up", iface);
            } else {
                println!("   ⚠️  {}: not up, skipped", iface);
            }
        }
        if up == 0 {
            println!("   ⚠️  None of the configured interfaces is up");
        }
    }

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
