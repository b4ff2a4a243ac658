//! Cache key construction.
//!
//! A [`CacheKey`] is the normalized identity of a request: its method and
//! its absolute URL, query string included. Headers never take part in the
//! key, so two requests that differ only in `Accept` share one entry.
//!
//! ## Normalization
//!
//! - method is kept as its canonical uppercase token
//! - scheme and authority are lowercased
//! - an empty path becomes `/`
//! - the query string is kept verbatim (parameter order is significant)
//!
//! ```
//! use shelter_core::{CacheKey, RequestDescriptor};
//!
//! let request = RequestDescriptor::get("HTTPS://Site.Example/recalls?page=2").unwrap();
//! let key = CacheKey::from_request(&request);
//! assert_eq!(key.to_string(), "GET https://site.example/recalls?page=2");
//! ```
//!
//! Keys clone in O(1): both components are [`SmolStr`], which stores short
//! strings inline and shares longer ones through a reference count.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

use crate::RequestDescriptor;

/// Normalized request identity in the cache store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    method: SmolStr,
    url: SmolStr,
}

impl CacheKey {
    /// Creates a key from an already normalized method and URL.
    pub fn new(method: impl Into<SmolStr>, url: impl Into<SmolStr>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
        }
    }

    /// Builds the normalized key of `request`.
    pub fn from_request(request: &RequestDescriptor) -> Self {
        let origin = request.origin();
        let uri = request.uri();
        let url = match uri.query() {
            Some(query) => format_smolstr!("{origin}{}?{query}", request.path()),
            None => format_smolstr!("{origin}{}", request.path()),
        };
        Self {
            method: SmolStr::new(request.method().as_str()),
            url,
        }
    }

    /// Returns the request method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the normalized absolute URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
