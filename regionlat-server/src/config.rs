/// Address the server binds to when none is given on the command line.
pub const DEFAULT_ADDRESS: &str = "0.0.0.0:8000";

/// Telemetry dataset read at startup when none is given on the command line.
pub const DEFAULT_DATASET_PATH: &str = "q-vercel-latency.json";

/// Rank used for the nearest-rank p95: index `floor(P95_RANK * n) - 1`, clamped at 0.
pub const P95_RANK: f64 = 0.95;

/// Decimal places kept for `avg_latency` and `p95_latency`.
pub const LATENCY_DECIMALS: u32 = 2;

/// Decimal places kept for `avg_uptime`.
pub const UPTIME_DECIMALS: u32 = 3;
