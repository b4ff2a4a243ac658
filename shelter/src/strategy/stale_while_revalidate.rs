use std::sync::Arc;

use shelter_backend::{CacheStore, WriteStatus};
use shelter_core::{
    GenerationName, NetworkError, Offload, RequestDescriptor, ResponseDescriptor, Transport,
};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::{Executor, Served, persist};
use crate::context::CacheContext;
use crate::metrics;
use crate::policy::Strategy;

impl<B, T, O> Executor<B, T, O>
where
    B: CacheStore + 'static,
    T: Transport + 'static,
    O: Offload + 'static,
{
    /// Stale-while-revalidate.
    ///
    /// The network refresh is started as a detached task before the store
    /// is read, so both run concurrently. On a hit the cached response is
    /// returned at once and the refresh keeps running; its result is only
    /// visible to later requests. On a miss the caller waits for the
    /// refresh; a network failure then ends in the fallback resolver.
    ///
    /// The refresh writes a `2xx` response into `generation` before handing
    /// it to a waiting caller. Dropping the caller never cancels it.
    pub async fn stale_while_revalidate(
        &self,
        request: &RequestDescriptor,
        generation: &GenerationName,
    ) -> Served {
        let key = request.cache_key();
        let refreshed = self.revalidate(request, generation);

        if let Some(response) = self.lookup(generation, &key).await {
            return (
                response,
                CacheContext::stale(Strategy::StaleWhileRevalidate, generation.clone()),
            );
        }

        match refreshed.await {
            Ok(Ok(response)) => (response, CacheContext::network(Strategy::StaleWhileRevalidate)),
            Ok(Err(error)) => {
                debug!(%error, %key, "fetch failed on cache miss, resolving fallback");
                (
                    self.fallback(request).await,
                    CacheContext::fallback(Strategy::StaleWhileRevalidate),
                )
            }
            Err(_) => {
                warn!(%key, "revalidation task ended without a result, resolving fallback");
                (
                    self.fallback(request).await,
                    CacheContext::fallback(Strategy::StaleWhileRevalidate),
                )
            }
        }
    }

    /// Spawns the detached refresh of `request` and returns a receiver for
    /// its outcome.
    fn revalidate(
        &self,
        request: &RequestDescriptor,
        generation: &GenerationName,
    ) -> oneshot::Receiver<Result<ResponseDescriptor, NetworkError>> {
        let (tx, rx) = oneshot::channel();
        let store = Arc::clone(self.store());
        let transport = Arc::clone(self.transport());
        let request = request.clone();
        let generation = generation.clone();

        self.offload().spawn("revalidate", async move {
            let key = request.cache_key();
            let result = transport.fetch(request).await;
            match &result {
                Ok(response) => {
                    let status = persist(store.as_ref(), &generation, &key, response).await;
                    let outcome = match status {
                        WriteStatus::Written => "updated",
                        WriteStatus::Skipped => "skipped",
                    };
                    debug!(%key, %generation, outcome, "revalidation finished");
                    metrics::record_revalidation(outcome);
                }
                Err(error) => {
                    debug!(%key, %error, "revalidation fetch failed");
                    metrics::record_revalidation("failed");
                }
            }
            // The caller is gone after a cache hit.
            let _ = tx.send(result);
        });
        rx
    }
}
