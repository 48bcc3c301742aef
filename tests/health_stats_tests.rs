//! Integration tests for health stats module.
//!
//! These tests verify that HealthStats tracks scrape statistics and
//! renders them for the /health endpoint.

use dgx_spark_exporter::health_stats::HealthStats;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[test]
fn test_health_stats_initialize_empty() {
    let stats = HealthStats::new();

    assert_eq!(stats.scrapes_total.load(Ordering::Relaxed), 0);
    assert_eq!(stats.scrape_failures.load(Ordering::Relaxed), 0);
    assert_eq!(stats.scrape_duration_ms.snapshot().count, 0);
    assert_eq!(stats.http_requests.count_last_minute(), 0);
}

#[test]
fn test_record_scrape() {
    let stats = HealthStats::new();
    stats.record_scrape(10.0, 20, 2048);
    stats.record_scrape(30.0, 22, 4096);

    assert_eq!(stats.scrapes_total.load(Ordering::Relaxed), 2);

    let duration = stats.scrape_duration_ms.snapshot();
    assert_eq!(duration.last, 30.0);
    assert_eq!(duration.avg, 20.0);
    assert_eq!(duration.min, 10.0);
    assert_eq!(duration.max, 30.0);

    let size = stats.response_size_kb.snapshot();
    assert_eq!(size.last, 4.0);
    assert_eq!(stats.time_series.snapshot().max, 22.0);
}

#[test]
fn test_render_table_contains_sections() {
    let stats = HealthStats::new();
    stats.record_scrape(12.5, 20, 1024);
    stats.record_scrape_failure();
    stats.record_http_request();

    let table = stats.render_table();
    assert!(table.contains("HEALTH ENDPOINT - EXPORTER INTERNAL STATS"));
    assert!(table.contains("scrape_duration (ms)"));
    assert!(table.contains("12.500"));
    assert!(table.contains("scrape_failures"));
    assert!(table.contains("http_requests_last_minute"));
}

#[test]
fn test_concurrent_recording() {
    let stats = Arc::new(HealthStats::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let stats = Arc::clone(&stats);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    stats.record_scrape(1.0, 1, 100);
                    stats.record_http_request();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(stats.scrapes_total.load(Ordering::Relaxed), 400);
    assert_eq!(stats.scrape_duration_ms.snapshot().count, 400);
    assert_eq!(stats.http_requests.count_last_minute(), 400);
}
