use regionlat_common::{RegionStats, TelemetryRecord};
use regionlat_server::aggregate::{compute, nearest_rank_p95, region_stats, round_to};

// --- Test helpers ---

fn record(region: &str, latency_ms: f64, uptime_pct: f64) -> TelemetryRecord {
    TelemetryRecord { region: region.to_string(), latency_ms, uptime_pct }
}

fn regions(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn us_east_pair() -> Vec<TelemetryRecord> {
    vec![record("us-east", 100.0, 99.9), record("us-east", 300.0, 99.5)]
}

/// Twenty latencies 10, 20, ..., 200 spread across uptimes, in shuffled order.
fn twenty_records(region: &str) -> Vec<TelemetryRecord> {
    [70, 200, 10, 150, 40, 120, 190, 30, 90, 180, 20, 60, 110, 170, 50, 140, 80, 160, 100, 130]
        .iter()
        .map(|&l| record(region, l as f64, 99.0))
        .collect()
}

// --- compute ---

#[test]
fn test_two_record_scenario() {
    let report = compute(&us_east_pair(), &regions(&["us-east"]), 150.0);
    let stats = report.get("us-east").unwrap();

    assert_eq!(stats.avg_latency, Some(200.0));
    // n=2: idx = floor(1.9) - 1 = 0 → smaller value
    assert_eq!(stats.p95_latency, Some(100.0));
    assert_eq!(stats.avg_uptime, Some(99.7));
    assert_eq!(stats.breaches, 1);
}

#[test]
fn test_unknown_region_is_absent_with_zero_breaches() {
    let report = compute(&us_east_pair(), &regions(&["eu-west"]), 0.0);
    assert_eq!(report.get("eu-west"), Some(&RegionStats::absent()));
}

#[test]
fn test_region_match_is_case_sensitive() {
    let report = compute(&us_east_pair(), &regions(&["US-EAST", "us-east "]), 0.0);
    assert_eq!(report.get("US-EAST"), Some(&RegionStats::absent()));
    assert_eq!(report.get("us-east "), Some(&RegionStats::absent()));
}

#[test]
fn test_empty_table_yields_absent_for_every_region() {
    let report = compute(&[], &regions(&["a", "b"]), 100.0);
    assert_eq!(report.len(), 2);
    assert!(report.iter().all(|(_, stats)| *stats == RegionStats::absent()));
}

#[test]
fn test_empty_region_list_yields_empty_report() {
    let report = compute(&us_east_pair(), &[], 100.0);
    assert!(report.is_empty());
}

#[test]
fn test_output_follows_query_order() {
    let table = vec![record("b", 1.0, 100.0), record("a", 2.0, 100.0)];
    let report = compute(&table, &regions(&["c", "a", "b"]), 0.0);
    assert_eq!(report.keys().collect::<Vec<_>>(), vec!["c", "a", "b"]);
}

#[test]
fn test_duplicate_regions_collapse_to_one_entry() {
    let report = compute(&us_east_pair(), &regions(&["us-east", "x", "us-east"]), 150.0);
    assert_eq!(report.len(), 2);
    assert_eq!(report.keys().collect::<Vec<_>>(), vec!["us-east", "x"]);
    assert_eq!(report.get("us-east").unwrap().breaches, 1);
}

#[test]
fn test_other_regions_do_not_leak_into_stats() {
    let mut table = us_east_pair();
    table.push(record("eu-west", 5000.0, 10.0));
    let report = compute(&table, &regions(&["us-east"]), 150.0);
    let stats = report.get("us-east").unwrap();
    assert_eq!(stats.avg_latency, Some(200.0));
    assert_eq!(stats.breaches, 1);
}

#[test]
fn test_single_record_region() {
    let table = vec![record("solo", 123.456, 99.98765)];

    let above = compute(&table, &regions(&["solo"]), 100.0);
    let stats = above.get("solo").unwrap();
    assert_eq!(stats.avg_latency, Some(123.46));
    assert_eq!(stats.p95_latency, Some(123.46));
    assert_eq!(stats.avg_uptime, Some(99.988));
    assert_eq!(stats.breaches, 1);

    let below = compute(&table, &regions(&["solo"]), 200.0);
    assert_eq!(below.get("solo").unwrap().breaches, 0);
}

/// Breaches use strict greater-than: a latency equal to the threshold is not a breach.
#[test]
fn test_breach_is_strictly_greater_than_threshold() {
    let table = vec![record("r", 150.0, 99.0), record("r", 150.01, 99.0)];
    let report = compute(&table, &regions(&["r"]), 150.0);
    assert_eq!(report.get("r").unwrap().breaches, 1);
}

#[test]
fn test_negative_and_zero_thresholds_are_ordinary_numbers() {
    let table = vec![record("r", 0.0, 99.0), record("r", 10.0, 99.0)];
    assert_eq!(compute(&table, &regions(&["r"]), 0.0).get("r").unwrap().breaches, 1);
    assert_eq!(compute(&table, &regions(&["r"]), -1.0).get("r").unwrap().breaches, 2);
}

#[test]
fn test_breaches_non_increasing_as_threshold_rises() {
    let table = twenty_records("r");
    let mut previous = u64::MAX;
    for threshold in (-10..=220).step_by(5) {
        let breaches = compute(&table, &regions(&["r"]), threshold as f64).get("r").unwrap().breaches;
        assert!(breaches <= previous, "breaches rose at threshold {threshold}");
        previous = breaches;
    }
    assert_eq!(previous, 0);
}

#[test]
fn test_p95_is_always_an_observed_latency() {
    for n in 1..=25 {
        let table: Vec<TelemetryRecord> =
            (0..n).map(|i| record("r", (i * 37 % 101) as f64 + 0.25, 99.0)).collect();
        let p95 = compute(&table, &regions(&["r"]), 0.0).get("r").unwrap().p95_latency.unwrap();
        assert!(
            table.iter().any(|r| round_to(r.latency_ms, 2) == p95),
            "p95 {p95} not observed for n={n}"
        );
    }
}

#[test]
fn test_compute_is_idempotent() {
    let table = twenty_records("r");
    let query = regions(&["r", "missing"]);
    let first = compute(&table, &query, 123.0);
    let second = compute(&table, &query, 123.0);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

// --- region_stats ---

#[test]
fn test_region_stats_empty_slice_is_absent() {
    assert_eq!(region_stats(&[], 10.0), RegionStats::absent());
}

#[test]
fn test_region_stats_averages_are_rounded() {
    let a = record("r", 100.0, 99.0);
    let b = record("r", 100.0, 99.0);
    let c = record("r", 101.0, 99.5);
    let stats = region_stats(&[&a, &b, &c], 1000.0);
    // 301 / 3 = 100.333.. → 100.33; 297.5 / 3 = 99.1666.. → 99.167
    assert_eq!(stats.avg_latency, Some(100.33));
    assert_eq!(stats.avg_uptime, Some(99.167));
    assert_eq!(stats.breaches, 0);
}

// --- nearest_rank_p95 ---

#[test]
fn test_p95_empty_is_none() {
    assert_eq!(nearest_rank_p95(&[]), None);
}

#[test]
fn test_p95_small_samples() {
    // n=1 → idx 0
    assert_eq!(nearest_rank_p95(&[42.0]), Some(42.0));
    // n=2 → floor(1.9) - 1 = 0
    assert_eq!(nearest_rank_p95(&[300.0, 100.0]), Some(100.0));
    // n=3 → floor(2.85) - 1 = 1
    assert_eq!(nearest_rank_p95(&[3.0, 1.0, 2.0]), Some(2.0));
}

#[test]
fn test_p95_twenty_samples() {
    // n=20 → floor(19.0) - 1 = 18 → 19th smallest of 10..=200 step 10 = 190
    let latencies: Vec<f64> = twenty_records("r").iter().map(|r| r.latency_ms).collect();
    assert_eq!(nearest_rank_p95(&latencies), Some(190.0));
}

#[test]
fn test_p95_hundred_samples() {
    // n=100 → floor(95.0) - 1 = 94 → value 95 of 1..=100
    let latencies: Vec<f64> = (1..=100).rev().map(|v| v as f64).collect();
    assert_eq!(nearest_rank_p95(&latencies), Some(95.0));
}

// --- round_to ---

#[test]
fn test_round_to_places() {
    assert_eq!(round_to(123.456, 2), 123.46);
    assert_eq!(round_to(123.454, 2), 123.45);
    assert_eq!(round_to(99.98765, 3), 99.988);
    assert_eq!(round_to(200.0, 2), 200.0);
}

/// The decision is made on the stored binary value, not on a rescaled copy of it.
#[test]
fn test_round_to_uses_exact_binary_value() {
    // 2.675 is stored as 2.67499.., 1.115 as 1.11499..
    assert_eq!(round_to(2.675, 2), 2.67);
    assert_eq!(round_to(1.115, 2), 1.11);
    assert_eq!(round_to(-2.675, 2), -2.67);
}

#[test]
fn test_round_to_exact_ties_go_to_even() {
    assert_eq!(round_to(0.125, 2), 0.12);
    assert_eq!(round_to(0.375, 2), 0.38);
}

#[test]
fn test_single_record_latency_below_half_rounds_down() {
    let table = vec![record("r", 1.115, 99.0)];
    let report = compute(&table, &regions(&["r"]), 0.0);
    let stats = report.get("r").unwrap();
    assert_eq!(stats.avg_latency, Some(1.11));
    assert_eq!(stats.p95_latency, Some(1.11));
}

#[test]
fn test_round_to_huge_value_is_unchanged() {
    assert_eq!(round_to(f64::MAX, 3), f64::MAX);
}
