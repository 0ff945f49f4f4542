//! Properties of the Poisson support-interval search.

use ipid_prob::poisson::{find_support, pmf};
use proptest::prelude::*;

#[test]
fn no_positive_mass_outside_interval() {
    for rate in [1e-9, 0.01, 1.0, 33.3, 4096.0, 1e7] {
        let s = find_support(rate);
        if s.n_low > 0 {
            assert_eq!(pmf(s.n_low - 1, rate), 0.0, "rate {rate}");
        }
        assert_eq!(pmf(s.n_high + 1, rate), 0.0, "rate {rate}");
    }
}

#[test]
fn tiny_rate_has_trivial_lower_bound() {
    // pmf(0) = e^-rate is positive for any modest rate, so n_low is 0
    // without any binary search.
    let s = find_support(1e-12);
    assert_eq!(s.n_low, 0);
    assert!(s.n_high >= 1);
    assert!((s.pmf[0] - 1.0).abs() < 1e-9);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn support_invariants(exp in -20f64..23f64) {
        let rate = 2f64.powf(exp);
        let s = find_support(rate);
        let mode = rate.floor() as u64;

        // The interval brackets the mode and carries only positive mass.
        prop_assert!(s.n_low <= mode && mode <= s.n_high);
        prop_assert!(s.pmf.iter().all(|&p| p > 0.0));
        prop_assert_eq!(s.pmf.len() as u64, s.n_high - s.n_low + 1);

        // The boundaries sit exactly at the underflow transition.
        if s.n_low > 0 {
            prop_assert_eq!(pmf(s.n_low - 1, rate), 0.0);
        }
        prop_assert_eq!(pmf(s.n_high + 1, rate), 0.0);

        // Nearly all probability mass is inside the interval.
        let total: f64 = s.pmf.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pmf_decreases_outward_from_boundaries(exp in 2f64..20f64) {
        let rate = 2f64.powf(exp);
        let s = find_support(rate);
        // Moving inward from each boundary the pmf does not shrink; the
        // function is unimodal about the mode.
        if s.len() >= 2 {
            prop_assert!(s.pmf[0] <= s.pmf[1]);
            prop_assert!(s.pmf[s.len() - 1] <= s.pmf[s.len() - 2]);
        }
    }
}
