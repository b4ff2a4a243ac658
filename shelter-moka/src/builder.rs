//! Builder for configuring [`MokaBackend`].

use std::sync::Arc;

use dashmap::DashMap;
use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;
use shelter_backend::format::{Format, JsonFormat};
use shelter_core::{CacheKey, Raw};

use crate::backend::MokaBackend;

/// Fixed per-entry overhead added by the byte weigher.
const ENTRY_OVERHEAD: usize = 64;

/// Marker type: capacity has not been configured yet.
///
/// You must call either [`max_entries()`](MokaBackendBuilder::max_entries) or
/// [`max_bytes()`](MokaBackendBuilder::max_bytes) before calling `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
///
/// Each generation holds at most `n` entries.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: byte-based capacity has been configured.
///
/// Each generation uses at most `n` bytes (approximate).
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// How per-generation caches are created.
#[derive(Clone)]
pub(crate) enum Capacity {
    Entries(u64),
    Bytes(u64),
}

#[derive(Clone)]
pub(crate) struct CacheSettings {
    capacity: Capacity,
    eviction_policy: EvictionPolicy,
}

impl CacheSettings {
    pub(crate) fn new_cache(&self) -> Cache<CacheKey, Raw> {
        match self.capacity {
            Capacity::Entries(max) => CacheBuilder::new(max)
                .eviction_policy(self.eviction_policy.clone())
                .build(),
            Capacity::Bytes(max) => CacheBuilder::new(max)
                .weigher(byte_weigher)
                .eviction_policy(self.eviction_policy.clone())
                .build(),
        }
    }
}

fn byte_weigher(key: &CacheKey, value: &Raw) -> u32 {
    let size = key.method().len() + key.url().len() + value.len() + ENTRY_OVERHEAD;
    size.min(u32::MAX as usize) as u32
}

/// Builder for creating and configuring a [`MokaBackend`].
///
/// Capacity is required and applies to every generation separately, so the
/// whole store holds at most twice the limit while an old and a new
/// version coexist between install and activate.
///
/// ```
/// use shelter_moka::MokaBackend;
/// use shelter_backend::format::BincodeFormat;
///
/// let backend = MokaBackend::builder()
///     .label("field-tablet")
///     .max_bytes(64 * 1024 * 1024)
///     .value_format(BincodeFormat)
///     .build();
/// ```
pub struct MokaBackendBuilder<Cap, S = JsonFormat>
where
    S: Format,
{
    capacity: Cap,
    serializer: S,
    label: String,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaBackendBuilder<NoCapacity, JsonFormat> {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            serializer: JsonFormat,
            label: "moka".to_owned(),
            eviction_policy: None,
        }
    }
}

impl Default for MokaBackendBuilder<NoCapacity, JsonFormat> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> MokaBackendBuilder<NoCapacity, S>
where
    S: Format,
{
    /// Sets the maximum number of entries per generation.
    pub fn max_entries(self, capacity: u64) -> MokaBackendBuilder<EntryCapacity, S> {
        MokaBackendBuilder {
            capacity: EntryCapacity(capacity),
            serializer: self.serializer,
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }

    /// Sets the approximate memory budget per generation in bytes.
    ///
    /// The weight of an entry is its URL, method and encoded response plus
    /// a small fixed overhead.
    pub fn max_bytes(self, bytes: u64) -> MokaBackendBuilder<ByteCapacity, S> {
        MokaBackendBuilder {
            capacity: ByteCapacity(bytes),
            serializer: self.serializer,
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl<Cap, S> MokaBackendBuilder<Cap, S>
where
    S: Format,
{
    /// Sets the label used in logs and metrics.
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the eviction policy of every generation cache.
    ///
    /// # Default
    ///
    /// - entry-based capacity: [`EvictionPolicy::tiny_lfu()`]
    /// - byte-based capacity: [`EvictionPolicy::lru()`], because TinyLFU
    ///   admission may reject a large page even when eviction could make room
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    /// Sets the format stored responses are encoded with.
    ///
    /// # Default
    ///
    /// [`JsonFormat`]
    pub fn value_format<NewS>(self, serializer: NewS) -> MokaBackendBuilder<Cap, NewS>
    where
        NewS: Format,
    {
        MokaBackendBuilder {
            capacity: self.capacity,
            serializer,
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl<S> MokaBackendBuilder<EntryCapacity, S>
where
    S: Format,
{
    /// Builds the [`MokaBackend`] with entry-count based capacity.
    pub fn build(self) -> MokaBackend<S> {
        let settings = CacheSettings {
            capacity: Capacity::Entries(self.capacity.0),
            eviction_policy: self
                .eviction_policy
                .unwrap_or_else(EvictionPolicy::tiny_lfu),
        };
        MokaBackend {
            generations: Arc::new(DashMap::new()),
            settings,
            serializer: self.serializer,
            label: self.label,
        }
    }
}

impl<S> MokaBackendBuilder<ByteCapacity, S>
where
    S: Format,
{
    /// Builds the [`MokaBackend`] with byte-based capacity.
    pub fn build(self) -> MokaBackend<S> {
        let settings = CacheSettings {
            capacity: Capacity::Bytes(self.capacity.0),
            eviction_policy: self.eviction_policy.unwrap_or_else(EvictionPolicy::lru),
        };
        MokaBackend {
            generations: Arc::new(DashMap::new()),
            settings,
            serializer: self.serializer,
            label: self.label,
        }
    }
}
