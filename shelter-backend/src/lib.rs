//! Traits and structs for shelter backend interaction.
//!
//! A backend is a key-value store partitioned into named generations. The
//! raw [`Backend`] trait moves bytes; the typed [`CacheStore`] trait layered
//! on top of it enforces the persistence rules of the cache (success-only
//! writes, whole-entry replacement, cross-generation lookup).
//!
//! If you want implement your own backend, you in the right place.
mod backend;
mod error;
pub mod format;

pub use backend::{Backend, BackendResult, CacheStore, WriteStatus};
pub use error::BackendError;
pub use format::{BincodeFormat, Format, FormatError, FormatTypeId, JsonFormat};

/// Status of deleting result.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Records successfully deleted.
    Deleted(u32),
    /// Record already missing.
    Missing,
}
