//! Error types for the particle filter core.
//!
//! Configuration problems are reported at construction time and model contract
//! violations are reported from the phase that observed them. Degenerate weight
//! distributions are not errors; see [`crate::filter::Normalization`].

use std::io;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors that can occur while building or driving a [`crate::ParticleFilter`].
#[derive(Debug, Error)]
pub enum FilterError {
    /// The filter parameters cannot describe a valid state space.
    #[error("invalid filter configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the offending parameter
        reason: String,
    },

    /// A motion or likelihood model returned a particle of the wrong dimension.
    #[error("model returned particle {index} with {actual} state entries, expected {expected}")]
    DimensionMismatch {
        /// Index of the particle being updated
        index: usize,
        /// Configured state dimension
        expected: usize,
        /// Length of the returned state vector
        actual: usize,
    },

    /// A likelihood model returned a weight that is negative or not finite.
    #[error("model returned particle {index} with invalid weight {weight}")]
    InvalidWeight {
        /// Index of the particle being weighted
        index: usize,
        /// The rejected weight
        weight: f64,
    },

    /// Reading or writing a configuration file failed.
    #[error("configuration file I/O failed: {0}")]
    Io(#[from] io::Error),

    /// A configuration file could not be parsed or serialized.
    #[error("configuration format error: {0}")]
    Format(String),
}

impl FilterError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        FilterError::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}
