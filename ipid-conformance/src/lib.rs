#![forbid(unsafe_code)]

//! Shared helpers for the IPID survey conformance tests.

/// Log-spaced base-2 rate sweep between two exponents, endpoints included;
/// a single-point sweep yields just the lower endpoint. Mirrors
/// `SweepConfig::rates` for tests that want a sweep without building a full
/// configuration.
pub fn log2_rates(exp_low: f64, exp_high: f64, points: usize) -> Vec<f64> {
    if points <= 1 {
        return vec![2f64.powf(exp_low)];
    }
    let step = (exp_high - exp_low) / (points - 1) as f64;
    (0..points).map(|i| 2f64.powf(exp_low + step * i as f64)).collect()
}
