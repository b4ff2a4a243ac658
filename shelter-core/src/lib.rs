#![warn(missing_docs)]
//! # shelter-core
//!
//! Core traits and types for the shelter offline HTTP cache.
//!
//! This crate defines the vocabulary shared by the engine (`shelter`),
//! the storage backends (`shelter-moka`, `shelter-feoxdb`) and the
//! transports (`shelter-reqwest`):
//!
//! - **Describe** requests and responses ([`RequestDescriptor`], [`ResponseDescriptor`])
//! - **Identify** cached entries ([`CacheKey`])
//! - **Partition** the store into versioned generations ([`GenerationName`], [`Generations`])
//! - **Persist** responses in a serializable shape ([`StoredResponse`])
//! - **Fetch** from the network ([`Transport`])
//! - **Detach** background work from the request that started it ([`Offload`])

pub mod error;
pub mod generation;
pub mod key;
pub mod offload;
pub mod request;
pub mod response;
pub mod transport;

pub use error::{BoxError, NetworkError};
pub use generation::{GenerationKind, GenerationName, Generations};
pub use key::CacheKey;
pub use offload::Offload;
pub use request::{Origin, RequestDescriptor, RequestError};
pub use response::{ResponseDescriptor, StoredHeader, StoredResponse, StoredResponseError};
#[doc(hidden)]
pub use smol_str::SmolStr;
pub use transport::Transport;

/// Raw byte data type used for serialized cache values.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
