//! Offline substitute responses.
//!
//! The resolver is the terminal step of every cacheable strategy: when
//! neither the store nor the network produced a response, it always
//! returns one. It never contacts the network and never writes to the
//! store.

use http::StatusCode;
use http::header::{CACHE_CONTROL, HeaderValue};
use shelter_backend::CacheStore;
use shelter_core::{CacheKey, GenerationName, RequestDescriptor, ResponseDescriptor};
use tracing::{debug, warn};

use crate::metrics;

/// Minimal page served to HTML navigations when the offline page itself
/// was never cached.
pub const OFFLINE_HTML: &str = "<!DOCTYPE html>\
<html lang=\"en\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>Offline</title></head>\
<body><h1>You are offline</h1>\
<p>This page is not available without a connection. \
It will load again once the network is back.</p></body></html>";

/// Body of the response served to non-HTML requests.
pub const OFFLINE_DIAGNOSTIC: &str = "offline: resource unavailable and not cached";

/// Status of the response served to non-HTML requests.
pub const OFFLINE_STATUS: StatusCode = StatusCode::SERVICE_UNAVAILABLE;

/// Deterministic offline response builder.
#[derive(Debug, Clone)]
pub struct FallbackResolver {
    offline_page: CacheKey,
    generation: GenerationName,
}

impl FallbackResolver {
    /// Creates a resolver serving the entry at `offline_page` from
    /// `generation` to HTML navigations.
    pub fn new(offline_page: CacheKey, generation: GenerationName) -> Self {
        Self {
            offline_page,
            generation,
        }
    }

    /// Key of the offline page in the store.
    pub fn offline_page(&self) -> &CacheKey {
        &self.offline_page
    }

    /// Produces the offline substitute for `request`.
    ///
    /// - request accepts HTML: cached offline page if present, else
    ///   [`OFFLINE_HTML`] with status `200`
    /// - anything else: [`OFFLINE_STATUS`] with [`OFFLINE_DIAGNOSTIC`]
    pub async fn resolve<B>(&self, request: &RequestDescriptor, store: &B) -> ResponseDescriptor
    where
        B: CacheStore + ?Sized,
    {
        if !request.accepts_html() {
            debug!(path = request.path(), "serving offline diagnostic");
            return Self::diagnostic();
        }
        match store.get(&self.generation, &self.offline_page).await {
            Ok(Some(page)) => {
                debug!(path = request.path(), "serving cached offline page");
                page
            }
            Ok(None) => {
                debug!(path = request.path(), "offline page not cached, serving inline page");
                Self::inline_page()
            }
            Err(error) => {
                warn!(%error, backend = store.name(), "offline page lookup failed");
                metrics::record_store_error(store.name(), "read");
                Self::inline_page()
            }
        }
    }

    /// The synthesized HTML page.
    pub fn inline_page() -> ResponseDescriptor {
        ResponseDescriptor::new(StatusCode::OK)
            .with_content_type("text/html; charset=utf-8")
            .with_header(CACHE_CONTROL, HeaderValue::from_static("no-store"))
            .with_body(OFFLINE_HTML)
    }

    /// The non-HTML diagnostic response.
    pub fn diagnostic() -> ResponseDescriptor {
        ResponseDescriptor::new(OFFLINE_STATUS)
            .with_content_type("text/plain; charset=utf-8")
            .with_header(CACHE_CONTROL, HeaderValue::from_static("no-store"))
            .with_body(OFFLINE_DIAGNOSTIC)
    }
}
