#![forbid(unsafe_code)]

//! Monte-Carlo simulation of bucketed-counter IPID selection.
//!
//! A bucketed counter advances by a uniform increment in `[1, Δ]`, where `Δ`
//! is the number of system ticks since the bucket last issued an identifier,
//! itself `max(1, Poisson(ticks_per_time / rate))`. No closed form is known,
//! so collision and next-identifier probabilities are estimated from
//! simulated counter paths. One path serves every packet count `n` in the
//! Poisson support simultaneously: for collisions, a first repeat at step `i`
//! persists for all longer prefixes; for guesses, each step's identifier is
//! recorded at its position.

use ipid_core::{IdSpace, IpidError, IpidResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Poisson};
use tracing::trace;

use crate::poisson::{find_support, support_bounds};

/// Per-rate simulation parameters. The same `seed` is reused for every rate
/// so that cross-rate comparisons are not confounded by sampling noise.
#[derive(Debug, Clone, Copy)]
pub struct SimParams {
    /// Trials (collision mode) or samples (guess mode) per rate.
    pub trials: u64,
    /// System ticks per unit time.
    pub ticks_per_time: u32,
    /// Seed for the per-worker generator.
    pub seed: u64,
}

fn gap_sampler(rate: f64, ticks_per_time: u32) -> IpidResult<Poisson<f64>> {
    Poisson::new(ticks_per_time as f64 / rate)
        .map_err(|e| IpidError::Distribution(format!("Poisson gap sampler at rate {rate}: {e}")))
}

/// Estimate the collision probability of one bucketed counter at `rate`.
///
/// Per trial the counter starts at 0 and takes `n_high − 1` stochastic
/// increments; the step index of the first revisited identifier is recorded.
/// A first collision at step `i` (0-indexed) means `i + 2` packets in transit
/// collide, and every larger packet count in the support inherits the
/// collision, so the per-`n` collision counts are a running prefix sum over
/// the first-collision histogram. The result is the pmf-weighted sum of the
/// per-`n` trial averages.
pub fn collision_trials(space: IdSpace, rate: f64, params: &SimParams) -> IpidResult<f64> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut support = find_support(rate);
    // Zero packets cannot collide; the support finder leaves this bump to us.
    support.truncate_below(1);
    if support.is_empty() || support.n_high < 2 {
        return Ok(0.0);
    }
    let gaps = gap_sampler(rate, params.ticks_per_time)?;
    let width = (support.n_high - support.n_low + 1) as usize;
    let mut first_collision = vec![0u64; width];

    // Trial-stamped membership array instead of a hash set; avoids clearing
    // the whole space between trials.
    let mut seen = vec![0u64; space.size() as usize];
    let mut stamp = 0u64;

    for _ in 0..params.trials {
        stamp += 1;
        let mut id: u32 = 0;
        seen[0] = stamp;
        for i in 0..support.n_high - 1 {
            let gap = (gaps.sample(&mut rng) as u64).max(1);
            let inc = rng.gen_range(1..=gap);
            id = space.wrap_add(id, inc);
            if seen[id as usize] == stamp {
                // First repeat after i + 1 increments, i.e. i + 2 packets in
                // transit; credit every n ≥ i + 2 in the interval.
                let idx = (i + 2).saturating_sub(support.n_low) as usize;
                first_collision[idx] += 1;
                break;
            }
            seen[id as usize] = stamp;
        }
    }

    let mut collided = 0u64;
    let mut prob = 0.0;
    for (j, &count) in first_collision.iter().enumerate() {
        collided += count;
        prob += collided as f64 / params.trials as f64 * support.pmf[j];
    }
    trace!(rate, prob, "bucketed collision estimate");
    Ok(prob)
}

/// Estimate the per-identifier next-ID probability table of one bucketed
/// counter at `rate`.
///
/// Per sample the counter takes `n_high + 1` stochastic increments; for every
/// step whose 0-indexed position lands in `[n_low, n_high]` the resulting
/// identifier is tallied at that position. Tallies are averaged over samples
/// and pmf-weighted across positions into a table indexed by identifier.
pub fn guess_trials(space: IdSpace, rate: f64, params: &SimParams) -> IpidResult<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let support = find_support(rate);
    let gaps = gap_sampler(rate, params.ticks_per_time)?;
    let size = space.size() as usize;
    let width = (support.n_high - support.n_low + 1) as usize;
    // Flattened (position, identifier) histogram, position-major.
    let mut hits = vec![0u32; width * size];

    for _ in 0..params.trials {
        let mut id: u32 = 0;
        for n in 0..=support.n_high {
            let gap = (gaps.sample(&mut rng) as u64).max(1);
            let inc = rng.gen_range(1..=gap);
            id = space.wrap_add(id, inc);
            if n >= support.n_low {
                hits[(n - support.n_low) as usize * size + id as usize] += 1;
            }
        }
    }

    let mut table = vec![0.0f64; size];
    for (pos, &weight) in support.pmf.iter().enumerate() {
        let row = &hits[pos * size..(pos + 1) * size];
        for (id, &count) in row.iter().enumerate() {
            if count > 0 {
                table[id] += count as f64 / params.trials as f64 * weight;
            }
        }
    }
    Ok(table)
}

/// Probability that a bucketed counter at `rate` behaves identically to a
/// globally incrementing counter over `n_high` increments: every
/// inter-arrival gap must be a single tick, making every increment exactly 1.
pub fn global_equiv_prob(rate: f64, ticks_per_time: u32, n_high: u64) -> f64 {
    let ticks = ticks_per_time as f64;
    (1.0 - (-rate / (ticks * ticks)).exp()).powf(n_high as f64)
}

/// Index of the first rate in the (ascending) sweep from which the bucketed
/// process is numerically indistinguishable from the global counter for the
/// whole rest of the sweep. Returns `rates.len()` when no suffix qualifies.
///
/// The equivalence curve is expected to be monotone in rate but that is not
/// proven, so this scans exhaustively from the top instead of binary
/// searching; substituting the closed form for the suffix then cannot change
/// any reported probability beyond floating-point precision.
pub fn global_equiv_cutoff(rates: &[f64], ticks_per_time: u32) -> usize {
    let mut cutoff = rates.len();
    for (i, &rate) in rates.iter().enumerate().rev() {
        let (_, n_high) = support_bounds(rate);
        if global_equiv_prob(rate, ticks_per_time, n_high) < 1.0 {
            break;
        }
        cutoff = i;
    }
    cutoff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closed_form::global_collision;

    fn params(trials: u64, seed: u64) -> SimParams {
        SimParams { trials, ticks_per_time: 3, seed }
    }

    #[test]
    fn same_seed_reproduces_bit_for_bit() {
        let space = IdSpace::new(32);
        let a = collision_trials(space, 8.0, &params(500, 42)).unwrap();
        let b = collision_trials(space, 8.0, &params(500, 42)).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn small_space_collides_often() {
        // Rate 8 against 8 identifiers: any path reaching ~9 packets wraps.
        let space = IdSpace::new(8);
        let p = collision_trials(space, 8.0, &params(2000, 7)).unwrap();
        assert!(p > 0.1 && p < 1.0, "p = {p}");
    }

    #[test]
    fn full_space_low_rate_never_collides() {
        // At rate 1 the support tops out near n = 170; increments cannot sum
        // past 2^16, so wraparound is impossible.
        let p = collision_trials(IdSpace::IPID, 1.0, &params(1000, 42)).unwrap();
        assert_eq!(p, 0.0);
        assert!(p <= global_collision(IdSpace::IPID, 1.0));
    }

    #[test]
    fn guess_table_is_a_distribution() {
        let space = IdSpace::new(64);
        let table = guess_trials(space, 4.0, &params(400, 11)).unwrap();
        assert_eq!(table.len(), 64);
        let total: f64 = table.iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "total {total}");
        assert!(table.iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn equiv_prob_rises_with_rate() {
        let slow = global_equiv_prob(1.0, 3, 170);
        let fast = global_equiv_prob(1e6, 3, 2_000_000);
        assert!(slow < 1e-6);
        assert!(fast > 0.99);
    }

    #[test]
    fn equiv_cutoff_splits_sweep() {
        let rates: Vec<f64> = (-10..=40).map(|e| 2f64.powi(e)).collect();
        let cutoff = global_equiv_cutoff(&rates, 3);
        // Slow rates simulate, fast rates substitute the closed form.
        assert!(cutoff > 0 && cutoff < rates.len(), "cutoff {cutoff}");
        for (i, &rate) in rates.iter().enumerate() {
            let (_, n_high) = support_bounds(rate);
            let p = global_equiv_prob(rate, 3, n_high);
            if i >= cutoff {
                assert_eq!(p, 1.0, "rate index {i}");
            }
        }
    }
}
