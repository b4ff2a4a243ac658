//! Store failures.

use crate::format::FormatError;
use thiserror::Error;

/// Failure of a store operation.
///
/// Strategies never pass these on to callers. A failed read is served as
/// a miss and a failed write leaves the previous entry in place.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The store is in an inconsistent state or a bookkeeping step failed.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// The underlying storage is unreachable, full or failed an I/O call.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),

    /// A stored response could not be encoded or decoded.
    #[error(transparent)]
    FormatError(#[from] FormatError),
}
