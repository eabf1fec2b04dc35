//! Speedup and Parallel Efficiency
//!
//! `speedup = baseline / elapsed`, `efficiency = speedup / workers`.

/// Speedup of a run relative to the baseline time.
///
/// `None` when `elapsed` is zero (undefined), or when either input is
/// negative or not finite.
pub fn speedup(baseline_seconds: f64, elapsed_seconds: f64) -> Option<f64> {
    if !baseline_seconds.is_finite() || !elapsed_seconds.is_finite() {
        return None;
    }
    if baseline_seconds < 0.0 || elapsed_seconds <= 0.0 {
        return None;
    }
    Some(baseline_seconds / elapsed_seconds)
}

/// Parallel efficiency: speedup per worker, `None` for zero workers
pub fn efficiency(speedup: f64, workers: u32) -> Option<f64> {
    if workers == 0 {
        None
    } else {
        Some(speedup / workers as f64)
    }
}
