//! Error types for giftswap-core

use thiserror::Error;

use crate::strategy::StrategyKind;

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for giftswap-core
#[derive(Error, Debug)]
pub enum Error {
    /// The roster is too small for any valid pairing to exist.
    ///
    /// A derangement requires at least two participants. This is a caller
    /// error and is never retried.
    #[error("roster of {count} cannot be paired: at least 2 participating families are required")]
    UnsatisfiableRoster {
        /// Number of participants after exclusion filtering.
        count: usize,
    },

    /// The bounded retry loop gave up before finding a valid pairing.
    ///
    /// Unreachable for any realistic roster size. Hitting this means the
    /// strategy or its draw stream is broken, so it is reported rather
    /// than retried further.
    #[error("no valid assignment found within {attempts} attempts")]
    AttemptsExhausted {
        /// Number of full generation attempts consumed.
        attempts: u32,
    },

    /// A strategy under audit produced an output that failed validation.
    ///
    /// Promoted to a hard failure: the strategy under test is defective.
    #[error("strategy `{strategy}` produced an invalid assignment at seed {seed}")]
    InvalidAssignment {
        /// Strategy that produced the bad output.
        strategy: StrategyKind,
        /// Seed of the failing trial.
        seed: u64,
    },

    /// I/O errors (roster config loading)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse errors (roster config loading)
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
