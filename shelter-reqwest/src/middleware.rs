//! Shelter middleware for reqwest-middleware.

use async_trait::async_trait;
use http::Extensions;
use http::header::{HeaderName, HeaderValue};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use shelter::filter::Classification;
use shelter::{CacheContext, CacheStatus, Offload, Shelter, Transport};
use shelter_backend::CacheStore;
use tracing::{debug, trace};

use crate::transport::descriptor_from_reqwest;

/// Header carrying the cache status of engine-served responses.
pub const DEFAULT_CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache-status");

/// Routes reqwest requests through a [`Shelter`] engine.
///
/// Requests the engine's filter skips (other origins, non-`GET`, API and
/// excluded paths) continue down the middleware chain. Routed requests
/// are served entirely by the engine using its own transport, so the
/// rest of the chain never sees them.
///
/// # Type Parameters
///
/// * `B` - Cache store (e.g. `MokaBackend`, `FeOxDbBackend`)
/// * `T` - Transport used by the engine for routed requests
/// * `O` - Offload running background refreshes
pub struct ShelterMiddleware<B, T, O> {
    shelter: Shelter<B, T, O>,
    status_header: HeaderName,
}

impl<B, T, O> ShelterMiddleware<B, T, O> {
    /// Creates a middleware serving routed requests with `shelter`.
    pub fn new(shelter: Shelter<B, T, O>) -> Self {
        Self {
            shelter,
            status_header: DEFAULT_CACHE_STATUS_HEADER,
        }
    }

    /// Sets the name of the cache status header.
    pub fn status_header(mut self, name: HeaderName) -> Self {
        self.status_header = name;
        self
    }

    /// Returns the engine.
    pub fn shelter(&self) -> &Shelter<B, T, O> {
        &self.shelter
    }
}

impl<B, T, O: Clone> Clone for ShelterMiddleware<B, T, O> {
    fn clone(&self) -> Self {
        Self {
            shelter: self.shelter.clone(),
            status_header: self.status_header.clone(),
        }
    }
}

fn status_value(context: &CacheContext) -> HeaderValue {
    match context.status {
        CacheStatus::Hit => HeaderValue::from_static("HIT"),
        CacheStatus::Miss => HeaderValue::from_static("MISS"),
        CacheStatus::Stale => HeaderValue::from_static("STALE"),
        CacheStatus::Bypass => HeaderValue::from_static("BYPASS"),
    }
}

#[async_trait]
impl<B, T, O> Middleware for ShelterMiddleware<B, T, O>
where
    B: CacheStore + 'static,
    T: Transport + 'static,
    O: Offload + 'static,
{
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let descriptor = match descriptor_from_reqwest(&req) {
            Ok(descriptor) => descriptor,
            Err(error) => {
                trace!(%error, "request not describable, passing through");
                return next.run(req, extensions).await;
            }
        };
        if let Classification::Skip(reason) = self.shelter.classify(&descriptor) {
            trace!(url = %req.url(), %reason, "request skipped by shelter");
            return next.run(req, extensions).await;
        }

        let (response, context) = self
            .shelter
            .serve(descriptor)
            .await
            .map_err(reqwest_middleware::Error::middleware)?;
        debug!(
            url = %req.url(),
            status = context.status.as_str(),
            source = context.source.as_str(),
            "served by shelter"
        );

        let mut http_response = response.into_http();
        http_response
            .headers_mut()
            .insert(self.status_header.clone(), status_value(&context));
        Ok(Response::from(http_response))
    }
}
