//! Scrape statistics for the exporter.
//!
//! This module tracks how the `/metrics` endpoint performs over time
//! (duration, series count, response size) and renders the plain-text
//! table served on `/health`.

use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            *self = RunningStat {
                count: 1,
                sum: value,
                min: value,
                max: value,
                last: value,
            };
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Snapshot of a [`Stat`]: last, average, max, min and sample count.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StatSnapshot {
    pub last: f64,
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    pub count: u64,
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    pub fn snapshot(&self) -> StatSnapshot {
        match self.inner.lock() {
            Ok(s) => StatSnapshot {
                last: s.last,
                avg: s.avg(),
                max: s.max,
                min: s.min,
                count: s.count,
            },
            Err(_) => StatSnapshot::default(),
        }
    }
}

/// Sliding window of HTTP request timestamps.
pub struct RequestTimestamps {
    inner: Mutex<VecDeque<Instant>>,
}

impl Default for RequestTimestamps {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(256)),
        }
    }
}

impl RequestTimestamps {
    const WINDOW: Duration = Duration::from_secs(60);

    pub fn record(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            let now = Instant::now();
            guard.push_back(now);
            while guard
                .front()
                .is_some_and(|&t| now.duration_since(t) > Self::WINDOW)
            {
                guard.pop_front();
            }
        }
    }

    pub fn count_last_minute(&self) -> u64 {
        match self.inner.lock() {
            Ok(guard) => guard
                .iter()
                .filter(|t| t.elapsed() <= Self::WINDOW)
                .count() as u64,
            Err(_) => 0,
        }
    }
}

/// Exporter-internal statistics shown on `/health`.
pub struct HealthStats {
    pub scrape_duration_ms: Stat,
    pub time_series: Stat,
    pub response_size_kb: Stat,
    pub scrapes_total: AtomicU64,
    pub scrape_failures: AtomicU64,
    pub http_requests: RequestTimestamps,
    start_time: Instant,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            scrape_duration_ms: Stat::default(),
            time_series: Stat::default(),
            response_size_kb: Stat::default(),
            scrapes_total: AtomicU64::new(0),
            scrape_failures: AtomicU64::new(0),
            http_requests: RequestTimestamps::default(),
            start_time: Instant::now(),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records one successful `/metrics` response.
    pub fn record_scrape(&self, duration_ms: f64, time_series: u64, response_bytes: usize) {
        self.scrapes_total.fetch_add(1, Ordering::Relaxed);
        self.scrape_duration_ms.add_sample(duration_ms);
        self.time_series.add_sample(time_series as f64);
        self.response_size_kb
            .add_sample(response_bytes as f64 / 1024.0);
    }

    pub fn record_scrape_failure(&self) {
        self.scrape_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_http_request(&self) {
        self.http_requests.record();
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn render_table(&self) -> String {
        let left_col = 26usize;
        let col_w = 12usize;

        let mut out = String::new();

        writeln!(out, "HEALTH ENDPOINT - EXPORTER INTERNAL STATS").ok();
        writeln!(out, "==========================================").ok();
        writeln!(out).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(out).ok();
        writeln!(out, "SCRAPES").ok();
        writeln!(out, "-------").ok();

        let rows = [
            ("scrape_duration (ms)", self.scrape_duration_ms.snapshot(), 3usize),
            ("time_series", self.time_series.snapshot(), 0),
            ("response_size (kB)", self.response_size_kb.snapshot(), 1),
        ];
        for (label, snap, precision) in rows {
            writeln!(
                out,
                "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
                label,
                format!("{:.*}", precision, snap.last),
                format!("{:.*}", precision.max(1), snap.avg),
                format!("{:.*}", precision, snap.max),
                format!("{:.*}", precision, snap.min),
                left = left_col,
                col = col_w
            )
            .ok();
        }

        writeln!(out).ok();
        writeln!(out, "TOTALS").ok();
        writeln!(out, "------").ok();
        writeln!(
            out,
            "{:left$} | {}",
            "scrapes_total",
            self.scrapes_total.load(Ordering::Relaxed),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} | {}",
            "scrape_failures",
            self.scrape_failures.load(Ordering::Relaxed),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} | {}",
            "http_requests_last_minute",
            self.http_requests.count_last_minute(),
            left = left_col
        )
        .ok();

        out
    }
}
