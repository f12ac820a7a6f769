//! Per-region latency/uptime aggregation.
//!
//! Everything here is a pure function of its inputs: the table is passed in
//! explicitly and nothing is cached between calls.

use crate::config::{LATENCY_DECIMALS, P95_RANK, UPTIME_DECIMALS};
use regionlat_common::{LatencyReport, RegionStats, TelemetryRecord};

/// Compute stats for each of `regions`, in the order given.
///
/// Region matching is exact and case-sensitive. A region with no records
/// (including every region when `table` is empty) gets [`RegionStats::absent`].
/// Duplicate regions collapse into a single entry at the first position.
pub fn compute(table: &[TelemetryRecord], regions: &[String], threshold_ms: f64) -> LatencyReport {
    let mut report = LatencyReport::new();
    for region in regions {
        let matching: Vec<&TelemetryRecord> =
            table.iter().filter(|record| record.region == *region).collect();
        report.insert(region.clone(), region_stats(&matching, threshold_ms));
    }
    report
}

/// Stats for the records of a single region.
///
/// `breaches` counts latencies strictly greater than `threshold_ms`.
pub fn region_stats(records: &[&TelemetryRecord], threshold_ms: f64) -> RegionStats {
    if records.is_empty() {
        return RegionStats::absent();
    }

    let n = records.len() as f64;
    let latencies: Vec<f64> = records.iter().map(|record| record.latency_ms).collect();
    let avg_latency = latencies.iter().sum::<f64>() / n;
    let avg_uptime = records.iter().map(|record| record.uptime_pct).sum::<f64>() / n;
    let breaches = latencies.iter().filter(|&&latency| latency > threshold_ms).count() as u64;

    RegionStats {
        avg_latency: Some(round_to(avg_latency, LATENCY_DECIMALS)),
        p95_latency: nearest_rank_p95(&latencies).map(|p95| round_to(p95, LATENCY_DECIMALS)),
        avg_uptime: Some(round_to(avg_uptime, UPTIME_DECIMALS)),
        breaches,
    }
}

/// Sort `latencies` ascending and return the element at `floor(0.95 * n) - 1`,
/// clamped to index 0. Returns `None` for an empty slice.
///
/// No interpolation: the result is always one of the observed values. For
/// `n < 40` this lands below the conventional nearest-rank p95 (e.g. `n = 2`
/// selects the smaller value); callers depend on exactly this rank.
pub fn nearest_rank_p95(latencies: &[f64]) -> Option<f64> {
    if latencies.is_empty() {
        return None;
    }
    let mut sorted = latencies.to_vec();
    sorted.sort_by(f64::total_cmp);
    let idx = ((P95_RANK * sorted.len() as f64).floor() as usize).saturating_sub(1);
    Some(sorted[idx])
}

/// Round to `places` decimal places.
///
/// Rounds the exact binary value of `value`, ties to even, so `2.675` (stored as
/// 2.67499..) becomes 2.67.
pub fn round_to(value: f64, places: u32) -> f64 {
    format!("{:.*}", places as usize, value).parse().unwrap_or(value)
}
