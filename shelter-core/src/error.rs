//! Network error taxonomy.
//!
//! A [`NetworkError`] is what a [`Transport`](crate::Transport) returns when
//! no response could be obtained at all. A response with a non-success
//! status is *not* an error at this layer: it is a valid response that the
//! engine simply refuses to persist.

use thiserror::Error;

/// Boxed error type used as the source of network failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to obtain a response from the network.
///
/// The engine treats every variant identically: a failed fetch and a timed
/// out fetch both trigger the fallback path.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection could not be established or was reset.
    #[error("connection failed: {0}")]
    Connect(BoxError),

    /// The transport gave up waiting for a response.
    #[error("request timed out")]
    Timeout,

    /// Headers arrived but the body could not be read to completion.
    #[error("failed to read response body: {0}")]
    Body(BoxError),

    /// Any other transport failure.
    #[error(transparent)]
    Other(BoxError),
}

impl NetworkError {
    /// Wraps a connection-level failure.
    pub fn connect(error: impl Into<BoxError>) -> Self {
        Self::Connect(error.into())
    }

    /// Wraps a body read failure.
    pub fn body(error: impl Into<BoxError>) -> Self {
        Self::Body(error.into())
    }

    /// Wraps an unclassified transport failure.
    pub fn other(error: impl Into<BoxError>) -> Self {
        Self::Other(error.into())
    }

    /// Returns `true` if the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}
