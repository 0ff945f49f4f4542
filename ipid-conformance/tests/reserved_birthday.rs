//! Birthday-problem behavior of randomized selection with reservation.

use ipid_core::IdSpace;
use ipid_prob::poisson::{pmf, survival};
use ipid_prob::reserved::{collision_products, reserved_collision, reserved_guess};

#[test]
fn zero_reserved_is_classic_birthday_over_full_space() {
    let space = IdSpace::IPID;
    let prods = collision_products(space, 0);
    let rate = 300.0;
    let got = reserved_collision(space, 0, rate, &prods);

    // Independent evaluation: Pr[repeat among n uniform draws from 2^16]
    // weighted by the Poisson pmf, plus the certain-collision tail.
    let mut expected = survival(65_536, rate);
    let mut distinct = 1.0f64;
    for n in 1u64..=1000 {
        // distinct = Π_{i<n} (1 - i/2^16) after this update.
        distinct *= 1.0 - (n - 1) as f64 / 65_536.0;
        expected += (1.0 - distinct) * pmf(n, rate);
    }
    assert!(
        (got - expected).abs() < 1e-12,
        "got {got}, expected {expected}"
    );
}

#[test]
fn reservation_reduces_collisions() {
    // No collision is possible until more than `reserved` packets are in
    // transit, so growing the reservation can only lower the probability.
    let space = IdSpace::IPID;
    let rate = 256.0;
    let mut prev = f64::INFINITY;
    let mut probs = Vec::new();
    for reserved in [0u32, 4096, 8192, 32_768] {
        let prods = collision_products(space, reserved);
        let p = reserved_collision(space, reserved, rate, &prods);
        assert!(p <= prev, "reserved {reserved}: {p} > {prev}");
        prev = p;
        probs.push(p);
    }
    // At rate 256 the unreserved birthday probability is substantial...
    assert!(probs[0] > 0.1 && probs[0] < 1.0, "probs[0] = {}", probs[0]);
    // ...while 2^12 reserved slots push the collision threshold far past any
    // plausible packet count.
    assert_eq!(probs[1], 0.0);
}

#[test]
fn reserved_guess_edges() {
    let space = IdSpace::IPID;
    for reserved in [0u32, 8192, 32_768] {
        let pool = 65_536 - reserved as u64;
        assert_eq!(reserved_guess(space, reserved, 0), 0.0);
        assert_eq!(reserved_guess(space, reserved, pool), 1.0);
        assert_eq!(reserved_guess(space, reserved, pool + 500), 1.0);
        let one = reserved_guess(space, reserved, 1);
        assert!((one - 1.0 / pool as f64).abs() < 1e-18);
    }
}
