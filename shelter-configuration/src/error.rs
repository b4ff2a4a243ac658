//! Configuration errors.

use shelter::BuildError;
use shelter_core::BoxError;
use thiserror::Error;

/// Error turning a configuration document into a running engine.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid YAML or does not match the schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[source] BoxError),

    /// A policy rule sets both or neither of `prefix` and `suffix`.
    #[error("policy rule #{index} must set exactly one of `prefix` or `suffix`")]
    InvalidRule {
        /// Position of the rule in the list.
        index: usize,
    },

    /// Moka needs exactly one capacity bound.
    #[error("moka backend must set exactly one of `max_entries` or `max_bytes`")]
    MokaCapacity,

    /// The configured store was compiled out.
    #[error("backend {0} is not available, enable the `{1}` feature")]
    BackendNotAvailable(&'static str, &'static str),

    /// The configured store could not be opened.
    #[error("failed to open {backend} backend")]
    Backend {
        /// Store type.
        backend: &'static str,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },

    /// The engine rejected the configuration.
    #[error(transparent)]
    Build(#[from] BuildError),
}
