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
    /// Network-with-fallback.
    ///
    /// The network is always tried first. A `2xx` response is written into
    /// `generation`, the shared general-purpose generation, and returned;
    /// other statuses are returned uncached. On a network failure every
    /// current generation is searched for the request, `generation` first;
    /// a hit is returned as stale and a miss ends in the fallback resolver.
    ///
    /// Only current generations are searched, so a superseded generation
    /// that has not been pruned yet is never served.
    pub async fn network_with_fallback(
        &self,
        request: &RequestDescriptor,
        generation: &GenerationName,
    ) -> Served {
        let key = request.cache_key();
        let error = match self.transport().fetch(request.clone()).await {
            Ok(response) => {
                self.persist(generation, &key, &response).await;
                return (response, CacheContext::network(Strategy::NetworkWithFallback));
            }
            Err(error) => error,
        };
        debug!(%error, %key, "fetch failed, searching current generations");

        let mut candidates = vec![generation];
        candidates.extend(
            self.generations()
                .current()
                .into_iter()
                .filter(|name| *name != generation),
        );
        // A generation that fails to read is a miss for that generation
        // only; the remaining ones are still searched.
        for candidate in candidates {
            if let Some(response) = self.lookup(candidate, &key).await {
                return (
                    response,
                    CacheContext::stale(Strategy::NetworkWithFallback, candidate.clone()),
                );
            }
        }
        (
            self.fallback(request).await,
            CacheContext::fallback(Strategy::NetworkWithFallback),
        )
    }
}
