//! Moka backend implementation.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use shelter_backend::format::{Format, JsonFormat};
use shelter_backend::{Backend, BackendResult, CacheStore, DeleteStatus};
use shelter_core::{CacheKey, GenerationName, Raw};
use tracing::debug;

use crate::builder::{CacheSettings, MokaBackendBuilder, NoCapacity};
use crate::metrics;

/// In-memory store powered by Moka.
///
/// Every generation is an independent bounded Moka cache kept in a
/// [`DashMap`]. Reads on different generations never contend, and dropping
/// a generation removes its whole cache at once.
///
/// Cloning is cheap and clones share the same generations.
///
/// ```
/// use shelter_moka::MokaBackend;
///
/// let backend = MokaBackend::builder().max_entries(10_000).build();
/// ```
#[derive(Clone)]
pub struct MokaBackend<S = JsonFormat>
where
    S: Format,
{
    pub(crate) generations: Arc<DashMap<GenerationName, Cache<CacheKey, Raw>>>,
    pub(crate) settings: CacheSettings,
    pub(crate) serializer: S,
    pub(crate) label: String,
}

impl<S> std::fmt::Debug for MokaBackend<S>
where
    S: Format,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("label", &self.label)
            .field("generations", &self.generations.len())
            .field("serializer", &self.serializer)
            .finish()
    }
}

impl MokaBackend<JsonFormat> {
    /// Creates a new builder for `MokaBackend`.
    pub fn builder() -> MokaBackendBuilder<NoCapacity, JsonFormat> {
        MokaBackendBuilder::new()
    }
}

impl<S> MokaBackend<S>
where
    S: Format,
{
    /// Returns the Moka cache behind `generation`, if it is open.
    pub fn generation_cache(&self, generation: &GenerationName) -> Option<Cache<CacheKey, Raw>> {
        self.generations
            .get(generation)
            .map(|cache| cache.value().clone())
    }

    fn open_cache(&self, generation: &GenerationName) -> Cache<CacheKey, Raw> {
        let cache = self
            .generations
            .entry(generation.clone())
            .or_insert_with(|| {
                debug!(backend = %self.label, %generation, "generation opened");
                self.settings.new_cache()
            })
            .value()
            .clone();
        metrics::record_generations(&self.label, self.generations.len());
        cache
    }
}

#[async_trait]
impl<S> Backend for MokaBackend<S>
where
    S: Format + Send + Sync,
{
    async fn read(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> BackendResult<Option<Raw>> {
        match self.generation_cache(generation) {
            Some(cache) => Ok(cache.get(key).await),
            None => Ok(None),
        }
    }

    async fn write(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
        value: Raw,
    ) -> BackendResult<()> {
        let cache = self.open_cache(generation);
        cache.insert(key.clone(), value).await;
        metrics::record_entries(&self.label, generation.as_str(), cache.entry_count());
        Ok(())
    }

    async fn remove(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> BackendResult<DeleteStatus> {
        let Some(cache) = self.generation_cache(generation) else {
            return Ok(DeleteStatus::Missing);
        };
        match cache.remove(key).await {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn open(&self, generation: &GenerationName) -> BackendResult<()> {
        self.open_cache(generation);
        Ok(())
    }

    async fn generations(&self) -> BackendResult<Vec<GenerationName>> {
        let mut names: Vec<GenerationName> = self
            .generations
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn drop_generation(&self, generation: &GenerationName) -> BackendResult<DeleteStatus> {
        let removed = self.generations.remove(generation);
        metrics::record_generations(&self.label, self.generations.len());
        match removed {
            Some((_, cache)) => {
                let count = cache.entry_count();
                cache.invalidate_all();
                Ok(DeleteStatus::Deleted(count.min(u32::MAX as u64) as u32))
            }
            None => Ok(DeleteStatus::Missing),
        }
    }

    fn name(&self) -> &str {
        &self.label
    }

    fn value_format(&self) -> &dyn Format {
        &self.serializer
    }
}

impl<S> CacheStore for MokaBackend<S> where S: Format + Send + Sync {}
