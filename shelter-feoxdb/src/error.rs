use bincode::error::{DecodeError, EncodeError};
use feoxdb::FeoxError;
use thiserror::Error;

/// Failure inside [`FeOxDbBackend`](crate::FeOxDbBackend).
///
/// Converted into a [`BackendError`](shelter_backend::BackendError) at the
/// trait boundary: store failures become `ConnectionError`, index failures
/// `InternalError`.
#[derive(Debug, Error)]
pub enum FeOxDbError {
    /// The database file could not be opened, read or written.
    #[error("feoxdb store: {0}")]
    Store(#[from] FeoxError),

    /// A generation index record could not be encoded.
    #[error("encoding generation index: {0}")]
    IndexEncode(#[from] EncodeError),

    /// A generation index record on disk is corrupt.
    #[error("decoding generation index: {0}")]
    IndexDecode(#[from] DecodeError),

    /// A thread panicked while holding the generation index.
    #[error("generation index lock poisoned")]
    IndexPoisoned,
}
