//! Strategy executors.
//!
//! Each strategy is a method on [`Executor`], which owns everything a
//! strategy may touch: the store, the transport, the offload manager for
//! detached work, the fallback resolver and the current generations.
//!
//! Store failures never leave this module. A failed read is a miss and a
//! failed write is a skipped write; both are logged at `warn`.

mod cache_first;
mod network_only;
mod network_with_fallback;
mod stale_while_revalidate;

use std::sync::Arc;

use shelter_backend::{CacheStore, WriteStatus};
use shelter_core::{
    CacheKey, GenerationName, Generations, NetworkError, Offload, RequestDescriptor,
    ResponseDescriptor, Transport,
};
use tracing::{debug, warn};

use crate::context::CacheContext;
use crate::fallback::FallbackResolver;
use crate::metrics;
use crate::policy::Strategy;

/// Response produced by a strategy together with how it was produced.
pub type Served = (ResponseDescriptor, CacheContext);

/// Runs strategies against a shared store and transport.
///
/// Cloning is cheap: the store and transport are shared.
pub struct Executor<B, T, O> {
    store: Arc<B>,
    transport: Arc<T>,
    offload: O,
    fallback: FallbackResolver,
    generations: Generations,
}

impl<B, T, O: Clone> Clone for Executor<B, T, O> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            transport: Arc::clone(&self.transport),
            offload: self.offload.clone(),
            fallback: self.fallback.clone(),
            generations: self.generations.clone(),
        }
    }
}

impl<B, T, O> std::fmt::Debug for Executor<B, T, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("fallback", &self.fallback)
            .field("generations", &self.generations)
            .finish_non_exhaustive()
    }
}

impl<B, T, O> Executor<B, T, O>
where
    B: CacheStore + 'static,
    T: Transport + 'static,
    O: Offload + 'static,
{
    /// Creates an executor.
    pub fn new(
        store: Arc<B>,
        transport: Arc<T>,
        offload: O,
        fallback: FallbackResolver,
        generations: Generations,
    ) -> Self {
        Self {
            store,
            transport,
            offload,
            fallback,
            generations,
        }
    }

    /// Returns the store.
    pub fn store(&self) -> &Arc<B> {
        &self.store
    }

    /// Returns the transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Returns the offload used for detached work.
    pub fn offload(&self) -> &O {
        &self.offload
    }

    /// Returns the current generations.
    pub fn generations(&self) -> &Generations {
        &self.generations
    }

    /// Runs `strategy` for `request`.
    ///
    /// Only [`Strategy::NetworkOnly`] can return an error; every other
    /// strategy ends in the fallback resolver.
    pub async fn execute(
        &self,
        strategy: Strategy,
        request: &RequestDescriptor,
    ) -> Result<Served, NetworkError> {
        let generation = strategy
            .generation_kind()
            .map(|kind| self.generations.for_kind(kind));
        match (strategy, generation) {
            (Strategy::CacheFirst, Some(generation)) => {
                Ok(self.cache_first(request, generation).await)
            }
            (Strategy::StaleWhileRevalidate, Some(generation)) => {
                Ok(self.stale_while_revalidate(request, generation).await)
            }
            (Strategy::NetworkWithFallback, Some(generation)) => {
                Ok(self.network_with_fallback(request, generation).await)
            }
            (Strategy::NetworkOnly, _) | (_, None) => self.network_only(request).await,
        }
    }

    /// Reads `key` from `generation`, treating store failures as a miss.
    pub(crate) async fn lookup(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> Option<ResponseDescriptor> {
        lookup(self.store.as_ref(), generation, key).await
    }

    /// Writes `response` under `key`, treating store failures as a skip.
    pub(crate) async fn persist(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
        response: &ResponseDescriptor,
    ) -> WriteStatus {
        persist(self.store.as_ref(), generation, key, response).await
    }

    pub(crate) async fn fallback(&self, request: &RequestDescriptor) -> ResponseDescriptor {
        self.fallback.resolve(request, self.store.as_ref()).await
    }
}

pub(crate) async fn lookup<B>(
    store: &B,
    generation: &GenerationName,
    key: &CacheKey,
) -> Option<ResponseDescriptor>
where
    B: CacheStore + ?Sized,
{
    match store.get(generation, key).await {
        Ok(Some(response)) => {
            debug!(%key, %generation, "cache hit");
            Some(response)
        }
        Ok(None) => {
            debug!(%key, %generation, "cache miss");
            None
        }
        Err(error) => {
            warn!(%error, %key, %generation, backend = store.name(), "cache read failed, treating as miss");
            metrics::record_store_error(store.name(), "read");
            None
        }
    }
}

pub(crate) async fn persist<B>(
    store: &B,
    generation: &GenerationName,
    key: &CacheKey,
    response: &ResponseDescriptor,
) -> WriteStatus
where
    B: CacheStore + ?Sized,
{
    match store.put(generation, key, response).await {
        Ok(status) => {
            debug!(%key, %generation, ?status, "cache write");
            status
        }
        Err(error) => {
            warn!(%error, %key, %generation, backend = store.name(), "cache write failed, skipping");
            metrics::record_store_error(store.name(), "write");
            WriteStatus::Skipped
        }
    }
}
