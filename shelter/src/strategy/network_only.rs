use shelter_backend::CacheStore;
use shelter_core::{NetworkError, Offload, RequestDescriptor, Transport};

use super::{Executor, Served};
use crate::context::{CacheContext, CacheStatus, ResponseSource};
use crate::policy::Strategy;

impl<B, T, O> Executor<B, T, O>
where
    B: CacheStore + 'static,
    T: Transport + 'static,
    O: Offload + 'static,
{
    /// Network-only.
    ///
    /// The response is returned verbatim and the store is neither read nor
    /// written. A network failure is returned to the caller unmodified.
    pub async fn network_only(&self, request: &RequestDescriptor) -> Result<Served, NetworkError> {
        let response = self.transport().fetch(request.clone()).await?;
        Ok((
            response,
            CacheContext::new(
                Strategy::NetworkOnly,
                CacheStatus::Bypass,
                ResponseSource::Network,
            ),
        ))
    }
}
