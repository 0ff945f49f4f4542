#![forbid(unsafe_code)]

//! Closed-form estimators for counter-based IPID selection.
//!
//! A globally incrementing counter collides exactly when more packets are in
//! transit than the identifier space holds, so its collision probability is a
//! Poisson survival function. Per-connection and per-destination selection
//! are architecturally one isolated counter per entity and behave identically
//! at a given per-counter rate; resource-count scaling is applied by callers.

use ipid_core::IdSpace;

use crate::poisson::{find_support, survival};

/// Collision probability of a globally incrementing counter at `rate`:
/// the probability that more than `space.size()` packets are simultaneously
/// in transit.
pub fn global_collision(space: IdSpace, rate: f64) -> f64 {
    survival(space.size() as u64, rate)
}

/// Per-connection selection is an isolated counter per connection.
pub fn per_connection_collision(space: IdSpace, rate: f64) -> f64 {
    global_collision(space, rate)
}

/// Per-destination selection is an isolated counter per destination.
pub fn per_destination_collision(space: IdSpace, rate: f64) -> f64 {
    global_collision(space, rate)
}

/// Probability table over identifiers that the *next* identifier issued by a
/// globally incrementing counter is `x`: after `n` packets the counter sits
/// at `n`, so the next identifier is `(n + 1) mod size`, weighted by
/// `pmf(n, rate)` over the truncated support.
pub fn global_next_id_table(space: IdSpace, rate: f64) -> Vec<f64> {
    let support = find_support(rate);
    let size = space.size() as u64;
    let mut table = vec![0.0f64; space.size() as usize];
    for (idx, n) in (support.n_low..=support.n_high).enumerate() {
        let id = ((n + 1) % size) as usize;
        table[id] += support.pmf[idx];
    }
    table
}

/// Success probability of an adversary allowed `guesses` guesses against a
/// per-identifier probability table: the sum of the `guesses` largest
/// entries. Cheap relative to table construction, so done fresh per call.
pub fn top_guess_prob(table: &[f64], guesses: usize) -> f64 {
    if guesses == 0 || table.is_empty() {
        return 0.0;
    }
    if guesses >= table.len() {
        return table.iter().sum();
    }
    let mut scratch = table.to_vec();
    let pivot = scratch.len() - guesses;
    scratch.select_nth_unstable_by(pivot, |a, b| a.total_cmp(b));
    scratch[pivot..].iter().sum()
}

/// Guess probability when identifiers are uniform over a pool of `pool_size`
/// values, independent of rate.
pub fn uniform_guess(pool_size: u64, guesses: u64) -> f64 {
    (guesses as f64 / pool_size as f64).min(1.0)
}

/// Per-connection counters start at uniformly random offsets, so the next
/// identifier is uniform over the whole space regardless of rate.
pub fn per_connection_guess(space: IdSpace, guesses: u64) -> f64 {
    uniform_guess(space.size() as u64, guesses)
}
