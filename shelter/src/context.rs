//! Cache context types describing how a response was produced.

use shelter_core::GenerationName;

use crate::policy::Strategy;

/// Whether the response came from the store and how fresh it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStatus {
    /// Served from the store without contacting the network.
    Hit,
    /// Not found in the store (or never looked up).
    #[default]
    Miss,
    /// Served from the store while the network was failing or a refresh
    /// was in flight.
    Stale,
    /// The engine was not involved: the request was filtered out or the
    /// strategy never touches the store.
    Bypass,
}

impl CacheStatus {
    /// Returns the status as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Stale => "stale",
            CacheStatus::Bypass => "bypass",
        }
    }
}

/// Where the response body came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResponseSource {
    /// Fetched from the network.
    #[default]
    Network,
    /// Read from the store, in the given generation.
    Cache(GenerationName),
    /// Produced by the fallback resolver.
    Fallback,
}

impl ResponseSource {
    /// Returns the source as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache(_) => "cache",
            ResponseSource::Fallback => "fallback",
        }
    }
}

/// Metadata returned with every served response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheContext {
    /// Strategy that produced the response, `None` for filtered requests.
    pub strategy: Option<Strategy>,
    /// Cache status.
    pub status: CacheStatus,
    /// Response source.
    pub source: ResponseSource,
}

impl CacheContext {
    /// Context of a request that bypassed the engine.
    pub fn bypass() -> Self {
        Self {
            strategy: None,
            status: CacheStatus::Bypass,
            source: ResponseSource::Network,
        }
    }

    pub(crate) fn new(strategy: Strategy, status: CacheStatus, source: ResponseSource) -> Self {
        Self {
            strategy: Some(strategy),
            status,
            source,
        }
    }

    pub(crate) fn hit(strategy: Strategy, generation: GenerationName) -> Self {
        Self::new(strategy, CacheStatus::Hit, ResponseSource::Cache(generation))
    }

    pub(crate) fn stale(strategy: Strategy, generation: GenerationName) -> Self {
        Self::new(strategy, CacheStatus::Stale, ResponseSource::Cache(generation))
    }

    pub(crate) fn network(strategy: Strategy) -> Self {
        Self::new(strategy, CacheStatus::Miss, ResponseSource::Network)
    }

    pub(crate) fn fallback(strategy: Strategy) -> Self {
        Self::new(strategy, CacheStatus::Miss, ResponseSource::Fallback)
    }

    /// Returns `true` if the response was read from the store.
    pub fn from_cache(&self) -> bool {
        matches!(self.source, ResponseSource::Cache(_))
    }
}
