//! GPU collector backed by `nvidia-smi`.
//!
//! One invocation backs all four metrics, so the collector either emits all
//! of them or nothing. Only the first GPU line is read.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::collectors::source::SourceError;
use crate::collectors::{Descriptor, MetricCollector, Sample};
use crate::settings::CollectorConfig;

/// Query arguments; output columns follow the `--query-gpu` field order.
pub const QUERY_ARGS: &[&str] = &[
    "--query-gpu=utilization.gpu,temperature.gpu,power.draw,clocks.current.graphics",
    "--format=csv,noheader,nounits",
];

const POLL_INTERVAL: Duration = Duration::from_millis(10);

const UTILIZATION: Descriptor = Descriptor::gauge(
    "gpu_utilization_percent",
    "GPU (GB10) utilization percentage (0-100)",
);
const TEMPERATURE: Descriptor = Descriptor::gauge(
    "gpu_temperature_celsius",
    "GPU temperature in degrees Celsius",
);
const POWER: Descriptor = Descriptor::gauge("gpu_power_watts", "GPU power consumption in Watts");
const FREQUENCY: Descriptor =
    Descriptor::gauge("gpu_frequency_mhz", "GPU graphics clock frequency in MHz");

/// Values of one GPU row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpuReading {
    pub utilization_percent: f64,
    pub temperature_celsius: f64,
    pub power_watts: f64,
    pub frequency_mhz: f64,
}

/// Parses one tool value; `N/A`, `[N/A]`, empty or garbage map to 0.
pub fn parse_field(raw: &str) -> f64 {
    match raw.trim() {
        "" | "N/A" | "[N/A]" => 0.0,
        value => value.parse().unwrap_or(0.0),
    }
}

/// Parses the first line of the tool's output.
pub fn parse_output(output: &str) -> Result<GpuReading, SourceError> {
    let line = output.trim().lines().next().unwrap_or_default();

    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 4 {
        return Err(SourceError::Unavailable(format!(
            "unexpected output format: {:?}",
            line
        )));
    }

    Ok(GpuReading {
        utilization_percent: parse_field(fields[0]),
        temperature_celsius: parse_field(fields[1]),
        power_watts: parse_field(fields[2]),
        frequency_mhz: parse_field(fields[3]),
    })
}

/// Runs a command and returns its stdout, killing it once `timeout` elapses.
///
/// Stdout is drained on a reader thread while the exit is polled, so a tool
/// writing more than the pipe buffer cannot stall. `None` as timeout waits
/// until the command exits.
pub fn run_with_timeout(
    program: &str,
    args: &[String],
    timeout: Option<Duration>,
) -> Result<String, SourceError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| SourceError::Unavailable(format!("failed to start {}: {}", program, e)))?;

    let reader = child.stdout.take().map(|mut stdout| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        })
    });

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if timeout.is_some_and(|t| start.elapsed() >= t) {
                    let _ = child.kill();
                    let _ = child.wait();
                    // The reader is left detached; a grandchild may still hold the pipe.
                    return Err(SourceError::Unavailable(format!(
                        "{} timed out after {:?}",
                        program,
                        start.elapsed()
                    )));
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SourceError::Unavailable(format!(
                    "failed to wait for {}: {}",
                    program, e
                )));
            }
        }
    };

    if !status.success() {
        return Err(SourceError::Unavailable(format!(
            "{} exited with {}",
            program, status
        )));
    }

    let Some(reader) = reader else {
        return Ok(String::new());
    };
    let bytes = reader
        .join()
        .map_err(|_| SourceError::Unavailable(format!("{} output reader panicked", program)))?
        .map_err(|e| {
            SourceError::Unavailable(format!("failed to read {} output: {}", program, e))
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Collects utilization, temperature, power and clock of the first GPU.
pub struct GpuCollector {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    descriptors: [Descriptor; 4],
}

impl GpuCollector {
    pub fn new(config: &CollectorConfig) -> Self {
        let timeout = match config.gpu_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        Self::with_command(
            &config.gpu_command,
            QUERY_ARGS.iter().map(|a| a.to_string()).collect(),
            timeout,
        )
    }

    /// Builds a collector around an arbitrary command printing the query format.
    pub fn with_command(program: &str, args: Vec<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.to_string(),
            args,
            timeout,
            descriptors: [UTILIZATION, TEMPERATURE, POWER, FREQUENCY],
        }
    }

    pub fn read(&self) -> Result<GpuReading, SourceError> {
        let output = run_with_timeout(&self.program, &self.args, self.timeout)?;
        debug!("{} output: {:?}", self.program, output.trim());
        parse_output(&output)
    }
}

impl MetricCollector for GpuCollector {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn describe(&self) -> &[Descriptor] {
        &self.descriptors
    }

    fn collect(&self) -> Vec<Sample> {
        match self.read() {
            Ok(r) => vec![
                UTILIZATION.sample(r.utilization_percent, &[]),
                TEMPERATURE.sample(r.temperature_celsius, &[]),
                FREQUENCY.sample(r.frequency_mhz, &[]),
                POWER.sample(r.power_watts, &[]),
            ],
            Err(e) => {
                warn!("GPU metrics unavailable: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str, timeout: Option<Duration>) -> GpuCollector {
        GpuCollector::with_command("sh", vec!["-c".to_string(), script.to_string()], timeout)
    }

    #[test]
    fn test_parse_output() {
        let reading = parse_output("45, 62, 12.5, 1300\n").unwrap();
        assert_eq!(
            reading,
            GpuReading {
                utilization_percent: 45.0,
                temperature_celsius: 62.0,
                power_watts: 12.5,
                frequency_mhz: 1300.0,
            }
        );
    }

    #[test]
    fn test_not_applicable_fields_are_zero() {
        let reading = parse_output("45, [N/A], N/A, 1300").unwrap();
        assert_eq!(reading.utilization_percent, 45.0);
        assert_eq!(reading.temperature_celsius, 0.0);
        assert_eq!(reading.power_watts, 0.0);
        assert_eq!(reading.frequency_mhz, 1300.0);
    }

    #[test]
    fn test_garbage_field_is_zero() {
        assert_eq!(parse_field(" abc "), 0.0);
        assert_eq!(parse_field(""), 0.0);
        assert_eq!(parse_field(" 7.25 "), 7.25);
    }

    #[test]
    fn test_only_first_gpu_is_read() {
        let reading = parse_output("10, 50, 20.0, 900\n90, 80, 200.0, 1900\n").unwrap();
        assert_eq!(reading.utilization_percent, 10.0);
    }

    #[test]
    fn test_short_line_is_rejected() {
        assert!(parse_output("45, 62, 12.5").is_err());
        assert!(parse_output("").is_err());
    }

    #[test]
    fn test_collect_runs_command() {
        let collector = shell("echo '45, 62, 12.5, 1300'", Some(Duration::from_secs(5)));
        let samples = collector.collect();

        let values: Vec<(&str, f64)> = samples.iter().map(|s| (s.name, s.value)).collect();
        assert_eq!(
            values,
            vec![
                ("gpu_utilization_percent", 45.0),
                ("gpu_temperature_celsius", 62.0),
                ("gpu_frequency_mhz", 1300.0),
                ("gpu_power_watts", 12.5),
            ]
        );
    }

    #[test]
    fn test_failing_command_emits_nothing() {
        let collector = shell("echo '45, 62, 12.5, 1300'; exit 3", None);
        assert!(collector.collect().is_empty());
    }

    #[test]
    fn test_missing_command_emits_nothing() {
        let collector =
            GpuCollector::with_command("/nonexistent/nvidia-smi", Vec::new(), None);
        assert!(collector.collect().is_empty());
    }

    #[test]
    fn test_large_output_does_not_stall() {
        let collector = shell(
            "echo '45, 62, 12.5, 1300'; head -c 200000 /dev/zero | tr '\\0' x",
            Some(Duration::from_secs(5)),
        );
        let start = Instant::now();
        let reading = collector.read().unwrap();
        assert_eq!(reading.utilization_percent, 45.0);
        assert_eq!(reading.frequency_mhz, 1300.0);
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_hanging_command_times_out() {
        let collector = shell("sleep 5", Some(Duration::from_millis(100)));
        let start = Instant::now();
        assert!(collector.read().is_err());
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}
