//! Error types of the engine.
//!
//! Request serving has no error type of its own: the only failure a caller
//! can observe is a [`NetworkError`](shelter_core::NetworkError) passed
//! through by the network-only strategy or by a filtered request.

use shelter_backend::BackendError;
use shelter_core::{GenerationName, RequestError};
use thiserror::Error;

/// Failure while activating a new version.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The store could not list its generations.
    #[error("failed to enumerate cache generations")]
    Enumerate(#[source] BackendError),

    /// A superseded generation could not be deleted.
    ///
    /// Generations deleted before the failure stay deleted.
    #[error("failed to delete cache generation {generation}")]
    Prune {
        /// Generation that could not be deleted.
        generation: GenerationName,
        /// Store failure.
        #[source]
        source: BackendError,
    },
}

/// Failure building a [`Shelter`](crate::Shelter).
#[derive(Debug, Error)]
pub enum BuildError {
    /// The configured origin is not an absolute URL.
    #[error("invalid origin {origin:?}")]
    InvalidOrigin {
        /// Configured value.
        origin: String,
        /// Parse failure.
        #[source]
        source: RequestError,
    },

    /// The configured offline page path cannot be joined to the origin.
    #[error("invalid offline page path {path:?}")]
    InvalidOfflinePath {
        /// Configured value.
        path: String,
        /// Parse failure.
        #[source]
        source: RequestError,
    },
}
