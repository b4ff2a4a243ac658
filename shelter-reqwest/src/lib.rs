#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod middleware;
mod transport;

pub use middleware::{DEFAULT_CACHE_STATUS_HEADER, ShelterMiddleware};
pub use transport::{ReqwestTransport, descriptor_from_reqwest};

pub use shelter::{CacheContext, CacheStatus, Shelter, ShelterConfig};
