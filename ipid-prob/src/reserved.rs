#![forbid(unsafe_code)]

//! Estimators for randomized IPID selection with reservation.
//!
//! These methods (searchable queue, iterated Knuth shuffle) draw each
//! identifier uniformly from the space minus `reserved` recently issued
//! values, so a collision among `n` packets in transit is a birthday problem
//! over a pool of `size − reserved` identifiers.

use ipid_core::IdSpace;

use crate::poisson::find_support;

/// Cumulative birthday products for a pool of `size − reserved` identifiers:
/// `prods[i] = Π_{j=0..=i} (1 − j / pool)`, the probability that `i + 1`
/// uniform draws from the pool are all distinct.
///
/// Rate-independent; compute once per sweep and reuse across all rates.
pub fn collision_products(space: IdSpace, reserved: u32) -> Vec<f64> {
    let pool = (space.size() - reserved) as usize;
    let mut prods = Vec::with_capacity(pool);
    let mut prod = 1.0f64;
    for i in 0..pool {
        prod *= 1.0 - i as f64 / pool as f64;
        prods.push(prod);
    }
    prods
}

/// Collision probability with `reserved` reserved identifiers at `rate`.
///
/// Sums `(1 − prods[n − reserved − 1]) · pmf(n, rate)` for packet counts
/// `n ∈ (reserved, size]`; more packets than the whole space is a certain
/// collision and contributes the survival tail. With `reserved` or fewer
/// packets in transit no collision is possible.
pub fn reserved_collision(space: IdSpace, reserved: u32, rate: f64, prods: &[f64]) -> f64 {
    let size = space.size() as u64;
    let reserved = reserved as u64;
    let support = find_support(rate);

    // Restrict the defining sum over (reserved, size] to the positive-pmf
    // support; terms outside it are numerically zero.
    let lo = support.n_low.max(reserved + 1);
    let hi = support.n_high.min(size);
    let mut total = 0.0;
    for n in lo..=hi {
        let p = support.pmf[(n - support.n_low) as usize];
        total += (1.0 - prods[(n - reserved - 1) as usize]) * p;
    }
    total + support.tail_mass(size)
}

/// Guess probability with `reserved` reserved identifiers: uniform over the
/// reduced pool, independent of rate.
pub fn reserved_guess(space: IdSpace, reserved: u32, guesses: u64) -> f64 {
    crate::closed_form::uniform_guess((space.size() - reserved) as u64, guesses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poisson::pmf;

    #[test]
    fn products_match_naive_birthday_terms() {
        let space = IdSpace::new(64);
        let prods = collision_products(space, 0);
        assert_eq!(prods.len(), 64);
        let mut expected = 1.0;
        for (i, &p) in prods.iter().enumerate().take(8) {
            expected *= 1.0 - i as f64 / 64.0;
            assert!((p - expected).abs() < 1e-15);
        }
        assert_eq!(prods[0], 1.0);
        // The pool exhausts: size draws without repeat have probability 0.
        assert_eq!(prods[63], 0.0);
    }

    #[test]
    fn reservation_shrinks_the_pool() {
        let space = IdSpace::new(64);
        let full = collision_products(space, 0);
        let half = collision_products(space, 32);
        assert_eq!(half.len(), 32);
        // Drawing from a smaller pool repeats sooner.
        assert!(half[4] < full[4]);
    }

    #[test]
    fn zero_reserved_reduces_to_plain_birthday() {
        let space = IdSpace::new(64);
        let prods = collision_products(space, 0);
        let rate = 6.0;
        let got = reserved_collision(space, 0, rate, &prods);
        // Direct evaluation of Σ_{n=1}^{64} (1 − Π_{i<n}(1 − i/64))·pmf(n)
        // plus the certain-collision tail.
        let mut expected = 0.0;
        for n in 1u64..=64 {
            let mut prod = 1.0;
            for i in 0..n {
                prod *= 1.0 - i as f64 / 64.0;
            }
            expected += (1.0 - prod) * pmf(n, rate);
        }
        let tail: f64 = (65u64..400).map(|n| pmf(n, rate)).sum();
        expected += tail;
        assert!((got - expected).abs() < 1e-12, "got {got}, want {expected}");
    }

    #[test]
    fn reserved_collision_limits() {
        let space = IdSpace::new(256);
        let prods = collision_products(space, 16);
        // Rate far above the space: collision is essentially certain.
        assert!(reserved_collision(space, 16, 1e5, &prods) > 0.999_999);
        // Tiny rate: almost surely at most one packet in transit.
        assert!(reserved_collision(space, 16, 1e-6, &prods) < 1e-6);
    }

    #[test]
    fn reserved_guess_constants() {
        let space = IdSpace::IPID;
        assert_eq!(reserved_guess(space, 4096, 0), 0.0);
        let one = reserved_guess(space, 4096, 1);
        assert!((one - 1.0 / (65_536.0 - 4_096.0)).abs() < 1e-18);
        assert_eq!(reserved_guess(space, 4096, 65_536 - 4_096), 1.0);
        assert_eq!(reserved_guess(space, 4096, 1 << 20), 1.0);
    }
}
