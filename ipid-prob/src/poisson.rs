#![forbid(unsafe_code)]

//! Poisson pmf evaluation and support-interval search.
//!
//! Every estimator in this crate deals with infinite sums of the form
//! `Σ_{n≥0} f(n) · pmf(n, λ)`. The pmf decays to representable zero away from
//! the mean, so the sums are truncated to the closed interval of `n` where the
//! pmf is numerically positive in double precision. [`find_support`] locates
//! that interval by binary search on each side of the mode.

use std::f64::consts::PI;

// Lanczos coefficients, g = 7, n = 9.
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the gamma function, Lanczos approximation.
///
/// Accurate to ~15 significant digits for the positive arguments used here
/// (`ln_gamma(n + 1) = ln n!`).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection formula for completeness; pmf evaluation never takes
        // this branch.
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut a = LANCZOS[0];
    let t = x + 7.5;
    for (i, &c) in LANCZOS.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

/// Poisson probability mass `Pr[X = n]` for intensity `rate`.
///
/// Evaluated in log space so that values far from the mode underflow cleanly
/// to `0.0` instead of producing NaN from overflowing factorials.
pub fn pmf(n: u64, rate: f64) -> f64 {
    if rate <= 0.0 {
        return if n == 0 { 1.0 } else { 0.0 };
    }
    let n = n as f64;
    (n * rate.ln() - rate - ln_gamma(n + 1.0)).exp()
}

/// The closed interval of `n` with numerically positive pmf, plus the pmf
/// values over that interval.
#[derive(Debug, Clone)]
pub struct Support {
    pub n_low: u64,
    pub n_high: u64,
    pub pmf: Vec<f64>,
}

impl Support {
    pub fn len(&self) -> usize {
        self.pmf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pmf.is_empty()
    }

    /// Drop the interval below `min_n`. Collision estimators need `n ≥ 1`
    /// because zero packets in transit cannot collide; that truncation is the
    /// caller's job, not the support search's.
    pub fn truncate_below(&mut self, min_n: u64) {
        if self.n_low >= min_n {
            return;
        }
        let drop = ((min_n - self.n_low) as usize).min(self.pmf.len());
        self.pmf.drain(..drop);
        self.n_low = min_n;
    }

    /// Tail mass `Σ_{k > n} pmf(k)` within the support.
    pub fn tail_mass(&self, n: u64) -> f64 {
        if n >= self.n_high {
            return 0.0;
        }
        let lo = (n + 1).max(self.n_low);
        self.pmf[(lo - self.n_low) as usize..].iter().sum()
    }
}

/// Bounds of the positive-pmf interval, without materializing pmf values.
///
/// Below the mode the pmf is monotonically increasing, above it monotonically
/// decreasing, so each boundary is found by binary search for the transition
/// between numerically-zero and positive. The upper search first doubles a
/// bound until the pmf underflows, which terminates for any finite rate.
pub fn support_bounds(rate: f64) -> (u64, u64) {
    let mode = rate.floor() as u64;

    let n_low = if pmf(0, rate) > 0.0 {
        0
    } else {
        // Invariant: pmf(left) == 0 and pmf(right) > 0.
        let (mut left, mut right) = (0u64, mode);
        while left + 1 < right {
            let mid = (left + right) / 2;
            if pmf(mid, rate) > 0.0 {
                right = mid;
            } else {
                left = mid;
            }
        }
        right
    };

    let mut bound = (2 * mode).max(1);
    while pmf(bound, rate) > 0.0 {
        bound *= 2;
    }
    // Invariant: pmf(left) > 0 and pmf(right) == 0.
    let (mut left, mut right) = (mode, bound);
    while left + 1 < right {
        let mid = (left + right) / 2;
        if pmf(mid, rate) > 0.0 {
            left = mid;
        } else {
            right = mid;
        }
    }

    (n_low, left)
}

/// Find the closed interval `[n_low, n_high]` containing all the numerically
/// representable probability mass for `rate`, with the pmf evaluated at every
/// integer in the interval.
pub fn find_support(rate: f64) -> Support {
    let (n_low, n_high) = support_bounds(rate);
    let pmf_values = (n_low..=n_high).map(|n| pmf(n, rate)).collect();
    Support { n_low, n_high, pmf: pmf_values }
}

/// Survival function `Pr[X > n]` for intensity `rate`.
///
/// Summed directly over the tail of the support rather than computed as
/// `1 − cdf`, which would lose everything below ~1e-16; collision
/// probabilities of interest go down to the underflow threshold.
pub fn survival(n: u64, rate: f64) -> f64 {
    find_support(rate).tail_mass(n)
}
