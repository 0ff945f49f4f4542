#![forbid(unsafe_code)]

//! Sweep configuration. Parses a TOML file into a strongly-typed structure;
//! every field has a default matching the survey's published parameters, so an
//! empty file (or no file at all) yields a runnable configuration.

use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

use crate::IpidError;

/// Parameters for one probability sweep over a log-spaced range of Poisson
/// rates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Lower base-2 exponent of the rate sweep.
    pub rate_exp_low: f64,

    /// Upper base-2 exponent of the rate sweep.
    pub rate_exp_high: f64,

    /// Number of log-spaced rate values between the two exponents.
    pub rate_points: usize,

    /// Monte-Carlo trials per rate for collision estimation.
    pub trials: u64,

    /// Monte-Carlo samples per rate for next-identifier estimation.
    pub samples: u64,

    /// System ticks per unit time for the bucketed-counter model.
    pub ticks_per_time: u32,

    /// Seed shared by every per-rate worker.
    pub seed: u64,

    /// Worker pool size for the parallel rate sweep.
    pub workers: usize,

    /// Root directory of the on-disk result cache.
    pub cache_dir: PathBuf,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            rate_exp_low: -18.0,
            rate_exp_high: 18.0,
            rate_points: 1000,
            trials: 100_000,
            samples: 20 * (1 << 16),
            ticks_per_time: 3,
            seed: 1_234_567,
            workers: 1,
            cache_dir: PathBuf::from("results"),
        }
    }
}

impl SweepConfig {
    /// Load a configuration file from the given path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::IpidResult<Self> {
        let data = fs::read_to_string(&path).map_err(IpidError::from)?;
        let cfg = toml::from_str::<SweepConfig>(&data).map_err(IpidError::ConfigParse)?;
        Ok(cfg)
    }

    /// The ordered rate sweep: `rate_points` values log-spaced base 2 between
    /// the configured exponents, both endpoints included. A single-point
    /// sweep yields just the lower endpoint.
    pub fn rates(&self) -> Vec<f64> {
        let n = self.rate_points;
        if n <= 1 {
            return vec![2f64.powf(self.rate_exp_low)];
        }
        let step = (self.rate_exp_high - self.rate_exp_low) / (n - 1) as f64;
        (0..n)
            .map(|i| 2f64.powf(self.rate_exp_low + step * i as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_survey_parameters() {
        let cfg = SweepConfig::default();
        assert_eq!(cfg.trials, 100_000);
        assert_eq!(cfg.ticks_per_time, 3);
        assert_eq!(cfg.seed, 1_234_567);
        assert_eq!(cfg.workers, 1);
    }

    #[test]
    fn rates_are_ordered_and_log_spaced() {
        let cfg = SweepConfig {
            rate_exp_low: 0.0,
            rate_exp_high: 3.0,
            rate_points: 4,
            ..SweepConfig::default()
        };
        let rates = cfg.rates();
        assert_eq!(rates, vec![1.0, 2.0, 4.0, 8.0]);
    }

    #[test]
    fn degenerate_point_counts() {
        let cfg = SweepConfig {
            rate_exp_low: 2.0,
            rate_exp_high: 8.0,
            rate_points: 1,
            ..SweepConfig::default()
        };
        assert_eq!(cfg.rates(), vec![4.0]);
        let cfg = SweepConfig { rate_points: 0, ..cfg };
        assert_eq!(cfg.rates(), vec![4.0]);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "trials = 500\nseed = 42").unwrap();
        let cfg = SweepConfig::from_file(f.path()).unwrap();
        assert_eq!(cfg.trials, 500);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.ticks_per_time, 3);
    }
}
