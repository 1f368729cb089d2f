//! Utility functions and helpers
//!
//! Logging setup and the formatting used in progress reports.

use crate::config::LogFormat;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `level` is an `EnvFilter` directive such as `info` or
/// `chainhead_miner=debug`; an unparsable directive falls back to `info`.
pub fn init_logging(level: &str, format: LogFormat) {
    let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Plain => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
    }
}

/// Hashes per second over `elapsed`, zero for an empty interval
pub fn hash_rate(hashes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        hashes as f64 / secs
    } else {
        0.0
    }
}

/// Format hash rate as a human-readable string
pub fn format_hash_rate(hashes_per_sec: f64) -> String {
    const UNITS: &[&str] = &["H/s", "KH/s", "MH/s", "GH/s", "TH/s", "PH/s"];
    let mut rate = hashes_per_sec;
    let mut unit_index = 0;

    while rate >= 1000.0 && unit_index < UNITS.len() - 1 {
        rate /= 1000.0;
        unit_index += 1;
    }

    format!("{:.2} {}", rate, UNITS[unit_index])
}
