#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Engine configuration.
///
/// Defines [`ShelterConfig`](config::ShelterConfig) with the build version,
/// origin, shell resources, offline page path and filter settings.
pub mod config;

/// Cache context and status types.
///
/// This module provides:
/// - [`CacheContext`](context::CacheContext) - metadata returned with every response
/// - [`CacheStatus`](context::CacheStatus) - hit, miss, stale or bypass
/// - [`ResponseSource`](context::ResponseSource) - network, cache generation or fallback
pub mod context;

mod engine;

/// Error types for building the engine and running its lifecycle.
pub mod error;

/// Offline substitute responses.
pub mod fallback;

/// Request classification in front of the policy table.
pub mod filter;

/// Install and activation of cache generations.
pub mod lifecycle;

/// Metrics collection for cache observability.
///
/// When the `metrics` feature is enabled, this module records counters
/// and histograms for:
/// - served responses by strategy, status and source
/// - store failures absorbed by the strategies
/// - background revalidations and pruned generations
pub mod metrics;

/// Detached background tasks for stale-while-revalidate.
pub mod offload;

/// Path-based strategy selection.
///
/// Defines [`PolicyTable`](policy::PolicyTable), an ordered list of
/// prefix and suffix rules mapping paths to a [`Strategy`](policy::Strategy).
pub mod policy;

/// Strategy executors.
pub mod strategy;

pub use config::ShelterConfig;
pub use context::{CacheContext, CacheStatus, ResponseSource};
pub use engine::{NotSet, Shelter, ShelterBuilder};
pub use error::{BuildError, LifecycleError};
pub use lifecycle::{ActivateReport, InstallReport, Lifecycle};
pub use policy::{PathMatcher, PolicyTable, Strategy};
pub use strategy::{Executor, Served};

pub use shelter_backend::{Backend, CacheStore, WriteStatus};
pub use shelter_core::{
    CacheKey, GenerationKind, GenerationName, Generations, NetworkError, Offload, Origin,
    RequestDescriptor, ResponseDescriptor, Transport,
};

/// The `shelter` prelude.
///
/// ```rust
/// use shelter::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CacheContext, CacheStatus, RequestDescriptor, ResponseDescriptor, Shelter, Strategy,
        Transport,
    };
}
