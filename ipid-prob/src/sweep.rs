#![forbid(unsafe_code)]

//! Parallel rate-sweep driver.
//!
//! A sweep maps an ordered sequence of Poisson rates to an aligned
//! probability array (or per-identifier table). Per-rate work units are
//! independent, so they fan out over a bounded rayon pool; every worker
//! reseeds its own generator from the shared seed, making results
//! reproducible and independent of the parallelism degree. Whole sweeps are
//! memoized through the injected [`ResultCache`] under keys embedding every
//! parameter that affects the result.

use ipid_core::cache::{get_or_compute, ResultCache};
use ipid_core::{IdSpace, IpidError, IpidResult};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::bucket::{self, SimParams};
use crate::closed_form;
use crate::reserved;

/// Operator-facing parameters of the simulation-backed sweeps.
#[derive(Debug, Clone, Copy)]
pub struct SweepParams {
    /// Monte-Carlo trials (collision) or samples (guess) per rate.
    pub trials: u64,
    /// System ticks per unit time for the bucketed-counter model.
    pub ticks_per_time: u32,
    /// Seed shared by every per-rate worker.
    pub seed: u64,
    /// Worker pool size.
    pub workers: usize,
}

impl SweepParams {
    fn sim(&self) -> SimParams {
        SimParams {
            trials: self.trials,
            ticks_per_time: self.ticks_per_time,
            seed: self.seed,
        }
    }
}

/// Map `f` over `rates` on a pool of `workers` threads, collecting results in
/// submission order. The first worker error aborts the whole sweep.
pub fn map_rates<T, F>(rates: &[f64], workers: usize, f: F) -> IpidResult<Vec<T>>
where
    T: Send,
    F: Fn(f64) -> IpidResult<T> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| IpidError::Pool(e.to_string()))?;
    let mut indexed: Vec<(usize, T)> = pool.install(|| {
        rates
            .par_iter()
            .enumerate()
            .map(|(i, &rate)| f(rate).map(|v| (i, v)))
            .collect::<IpidResult<Vec<_>>>()
    })?;
    // Completion order is unspecified; restore rate order before assembly.
    indexed.sort_by_key(|&(i, _)| i);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

/// Collision probabilities of a globally incrementing counter, aligned with
/// `rates`. Closed form, cheap enough to skip the cache.
pub fn global_collision_sweep(space: IdSpace, rates: &[f64]) -> Vec<f64> {
    rates
        .iter()
        .map(|&r| closed_form::global_collision(space, r))
        .collect()
}

/// Per-connection collision probabilities; identical to the global counter.
pub fn per_connection_collision_sweep(space: IdSpace, rates: &[f64]) -> Vec<f64> {
    global_collision_sweep(space, rates)
}

/// Per-destination collision probabilities; identical to the global counter.
pub fn per_destination_collision_sweep(space: IdSpace, rates: &[f64]) -> Vec<f64> {
    global_collision_sweep(space, rates)
}

/// Bucketed-counter collision probabilities, simulated per rate on the worker
/// pool and cached.
pub fn bucket_collision_sweep(
    cache: &dyn ResultCache,
    space: IdSpace,
    rates: &[f64],
    params: &SweepParams,
) -> IpidResult<Vec<f64>> {
    let key = format!(
        "collisions/bucket_N{}_T{}_K{}_R{}.cbor",
        space.size(),
        params.trials,
        params.ticks_per_time,
        params.seed
    );
    get_or_compute(cache, &key, || {
        info!(
            rates = rates.len(),
            trials = params.trials,
            workers = params.workers,
            "simulating bucketed-counter collision sweep"
        );
        let sim = params.sim();
        map_rates(rates, params.workers, |rate| {
            bucket::collision_trials(space, rate, &sim)
        })
    })
}

/// Collision probabilities for randomized selection with `reserved` reserved
/// identifiers, cached per reservation count.
pub fn reserved_collision_sweep(
    cache: &dyn ResultCache,
    space: IdSpace,
    rates: &[f64],
    reserved: u32,
) -> IpidResult<Vec<f64>> {
    let key = format!("collisions/reserved_N{}_K{reserved}.cbor", space.size());
    get_or_compute(cache, &key, || {
        info!(rates = rates.len(), reserved, "computing reserved-pool collision sweep");
        let prods = reserved::collision_products(space, reserved);
        Ok(rates
            .iter()
            .map(|&r| reserved::reserved_collision(space, reserved, r, &prods))
            .collect())
    })
}

/// Cached per-rate next-identifier probability tables for the global counter.
///
/// The table is the expensive artifact; top-`g` selection over it is cheap
/// and done fresh by the guess sweeps.
pub fn global_guess_table(
    cache: &dyn ResultCache,
    space: IdSpace,
    rates: &[f64],
) -> IpidResult<Vec<Vec<f64>>> {
    let key = format!("security/global_N{}.cbor", space.size());
    get_or_compute(cache, &key, || {
        info!(rates = rates.len(), "computing global-counter next-ID tables");
        Ok(rates
            .iter()
            .map(|&r| closed_form::global_next_id_table(space, r))
            .collect())
    })
}

/// Guess probabilities of the global counter for `guesses` guesses.
pub fn global_guess_sweep(
    cache: &dyn ResultCache,
    space: IdSpace,
    rates: &[f64],
    guesses: usize,
) -> IpidResult<Vec<f64>> {
    let tables = global_guess_table(cache, space, rates)?;
    Ok(tables
        .iter()
        .map(|t| closed_form::top_guess_prob(t, guesses))
        .collect())
}

/// Per-destination guess probabilities; same process as the global counter,
/// resource granularity is applied by the caller via rate scaling.
pub fn per_destination_guess_sweep(
    cache: &dyn ResultCache,
    space: IdSpace,
    rates: &[f64],
    guesses: usize,
) -> IpidResult<Vec<f64>> {
    global_guess_sweep(cache, space, rates, guesses)
}

/// Per-connection guess probabilities: rate-independent constant.
pub fn per_connection_guess_sweep(space: IdSpace, rates: &[f64], guesses: u64) -> Vec<f64> {
    vec![closed_form::per_connection_guess(space, guesses); rates.len()]
}

/// Reserved-pool guess probabilities: rate-independent constant.
pub fn reserved_guess_sweep(
    space: IdSpace,
    rates: &[f64],
    reserved: u32,
    guesses: u64,
) -> Vec<f64> {
    vec![reserved::reserved_guess(space, reserved, guesses); rates.len()]
}

/// Cached per-rate next-identifier tables for the bucketed counter.
///
/// Rates past the global-equivalence cutoff reuse the global counter's
/// tables: there the bucketed increments are all 1 with probability
/// numerically equal to 1, so the substitution cannot change any reported
/// probability beyond floating-point precision. The global tables get their
/// own cache-or-compute before splicing.
pub fn bucket_guess_table(
    cache: &dyn ResultCache,
    space: IdSpace,
    rates: &[f64],
    params: &SweepParams,
) -> IpidResult<Vec<Vec<f64>>> {
    let key = format!(
        "security/bucket_N{}_S{}_K{}_R{}.cbor",
        space.size(),
        params.trials,
        params.ticks_per_time,
        params.seed
    );
    get_or_compute(cache, &key, || {
        let cutoff = bucket::global_equiv_cutoff(rates, params.ticks_per_time);
        debug!(cutoff, total = rates.len(), "global-counter substitution cutoff");
        info!(
            simulated = cutoff,
            substituted = rates.len() - cutoff,
            samples = params.trials,
            workers = params.workers,
            "simulating bucketed-counter guess sweep"
        );
        let sim = params.sim();
        let mut tables = map_rates(&rates[..cutoff], params.workers, |rate| {
            bucket::guess_trials(space, rate, &sim)
        })?;
        if cutoff < rates.len() {
            let global = global_guess_table(cache, space, rates)?;
            tables.extend_from_slice(&global[cutoff..]);
        }
        Ok(tables)
    })
}

/// Guess probabilities of the bucketed counter for `guesses` guesses.
pub fn bucket_guess_sweep(
    cache: &dyn ResultCache,
    space: IdSpace,
    rates: &[f64],
    params: &SweepParams,
    guesses: usize,
) -> IpidResult<Vec<f64>> {
    let tables = bucket_guess_table(cache, space, rates, params)?;
    Ok(tables
        .iter()
        .map(|t| closed_form::top_guess_prob(t, guesses))
        .collect())
}

/// Running prefix maximum of a probability curve: the worst case over all
/// per-resource rates at or below each sweep position.
pub fn worst_case_envelope(probs: &[f64]) -> Vec<f64> {
    let mut best = 0.0f64;
    probs
        .iter()
        .map(|&p| {
            best = best.max(p);
            best
        })
        .collect()
}
