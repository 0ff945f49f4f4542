#![forbid(unsafe_code)]

//! Common error type for the IPID survey crates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IpidError {
    /// I/O related failures (cache reads/writes).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parsing failures.
    #[error("Config parse error: {0}")]
    ConfigParse(toml::de::Error),

    /// CBOR codec errors while loading or persisting cached arrays.
    #[error("CBOR codec error: {0}")]
    Cbor(#[from] serde_cbor::Error),

    /// A sampling distribution could not be constructed for a rate.
    #[error("Invalid distribution parameter: {0}")]
    Distribution(String),

    /// The worker pool for a rate sweep could not be built.
    #[error("Worker pool error: {0}")]
    Pool(String),
}

/// Convenient alias for results throughout the IPID survey crates.
pub type IpidResult<T> = Result<T, IpidError>;
