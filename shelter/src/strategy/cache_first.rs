use shelter_backend::CacheStore;
use shelter_core::{GenerationName, Offload, RequestDescriptor, Transport};
use tracing::debug;

use super::{Executor, Served};
use crate::context::CacheContext;
use crate::policy::Strategy;

impl<B, T, O> Executor<B, T, O>
where
    B: CacheStore + 'static,
    T: Transport + 'static,
    O: Offload + 'static,
{
    /// Cache-first.
    ///
    /// A hit is returned without touching the network. On a miss the
    /// request is fetched once; a `2xx` response is written into
    /// `generation` before it is returned, anything else is returned
    /// uncached. A network failure ends in the fallback resolver.
    pub async fn cache_first(
        &self,
        request: &RequestDescriptor,
        generation: &GenerationName,
    ) -> Served {
        let key = request.cache_key();
        if let Some(response) = self.lookup(generation, &key).await {
            return (
                response,
                CacheContext::hit(Strategy::CacheFirst, generation.clone()),
            );
        }

        match self.transport().fetch(request.clone()).await {
            Ok(response) => {
                self.persist(generation, &key, &response).await;
                (response, CacheContext::network(Strategy::CacheFirst))
            }
            Err(error) => {
                debug!(%error, %key, "fetch failed on cache miss, resolving fallback");
                (
                    self.fallback(request).await,
                    CacheContext::fallback(Strategy::CacheFirst),
                )
            }
        }
    }
}
