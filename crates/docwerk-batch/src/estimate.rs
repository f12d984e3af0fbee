// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch duration estimates and throughput accounting.

use std::path::PathBuf;
use std::time::Duration;

/// Files whose sizes are sampled for an estimate.
const SAMPLE_SIZE: usize = 3;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Rough wall time for processing `paths` at `mb_per_sec`.
///
/// Samples the sizes of the first few readable files, extrapolates the
/// average to the whole batch and divides by the throughput target.
/// Unreadable files are skipped; with nothing readable the estimate is zero.
pub fn estimate_processing_time(paths: &[PathBuf], mb_per_sec: f64) -> Duration {
    if paths.is_empty() || mb_per_sec <= 0.0 {
        return Duration::ZERO;
    }

    let sampled: Vec<u64> = paths
        .iter()
        .take(SAMPLE_SIZE)
        .filter_map(|path| std::fs::metadata(path).ok())
        .map(|meta| meta.len())
        .collect();
    if sampled.is_empty() {
        return Duration::ZERO;
    }

    let average = sampled.iter().sum::<u64>() as f64 / sampled.len() as f64;
    let total_mb = average * paths.len() as f64 / BYTES_PER_MB;
    Duration::try_from_secs_f64(total_mb / mb_per_sec).unwrap_or(Duration::MAX)
}

/// Observed throughput in MB/s. Zero when nothing measurable elapsed.
pub fn throughput_mb_per_sec(bytes: u64, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds <= 0.0 {
        0.0
    } else {
        bytes as f64 / BYTES_PER_MB / seconds
    }
}
