#![forbid(unsafe_code)]

//! Probability estimation engine for IP identifier (IPID) selection methods.
//!
//! For each selection method the engine estimates, as a function of the
//! Poisson rate of packet transmission, (a) the probability that two packets
//! in transit collide on the same identifier and (b) the probability that an
//! adversary allowed `g` guesses predicts the next identifier.
//!
//! Methods with closed forms (globally incrementing, per-connection,
//! per-destination, randomized selection with reservation) are evaluated
//! analytically over the truncated Poisson support; the bucketed-counter
//! method is estimated by Monte-Carlo simulation. The [`sweep`] module fans
//! the per-rate work out over a bounded worker pool and memoizes whole sweeps
//! through an injected result cache.

pub mod bucket;
pub mod closed_form;
pub mod poisson;
pub mod reserved;
pub mod sweep;

pub use bucket::SimParams;
pub use poisson::{find_support, pmf, survival, Support};
pub use sweep::SweepParams;
