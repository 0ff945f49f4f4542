#![forbid(unsafe_code)]

//! Shared types for the IPID survey crates: the cyclic identifier space,
//! sweep configuration, the common error type, and the result cache.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{DiskCache, MemoryCache, ResultCache};
pub use config::SweepConfig;
pub use error::{IpidError, IpidResult};

/// A fixed-size cyclic identifier space with modular wraparound arithmetic.
///
/// The IPv4 IPID field gives the canonical 2^16 space, but the size is an
/// explicit value so estimators and simulations can run against small spaces
/// in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdSpace {
    size: u32,
}

impl IdSpace {
    /// The 16-bit IPv4 identification field.
    pub const IPID: IdSpace = IdSpace { size: 1 << 16 };

    /// A space with `size` distinct identifiers. Callers must pass `size >= 2`.
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Advance `id` by `inc` with wraparound.
    pub fn wrap_add(&self, id: u32, inc: u64) -> u32 {
        ((id as u64 + inc) % self.size as u64) as u32
    }
}

impl Default for IdSpace {
    fn default() -> Self {
        Self::IPID
    }
}
