//! Origin and method filter in front of the policy table.
//!
//! Only same-origin `GET` requests outside the development and API
//! namespaces are routed through the engine. Everything else is
//! [`Classification::Skip`]ped and goes straight to the network with no
//! cache involvement.

use std::fmt;

use http::Method;
use shelter_core::{Origin, RequestDescriptor};
use smol_str::SmolStr;

use crate::config::FilterConfig;

/// Why a request bypasses the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Method other than `GET`.
    Method(Method),
    /// Request addressed to another origin.
    CrossOrigin,
    /// Path under a development or internal prefix.
    Excluded(SmolStr),
    /// Path under the API namespace.
    Api,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Method(method) => write!(f, "method {method}"),
            SkipReason::CrossOrigin => f.write_str("cross-origin"),
            SkipReason::Excluded(prefix) => write!(f, "excluded prefix {prefix}"),
            SkipReason::Api => f.write_str("api namespace"),
        }
    }
}

/// Outcome of [`RequestFilter::classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Bypass the engine.
    Skip(SkipReason),
    /// Hand the request to the policy table.
    Route,
}

impl Classification {
    /// Returns `true` for [`Classification::Route`].
    pub fn is_route(&self) -> bool {
        matches!(self, Classification::Route)
    }
}

/// Pure request classifier bound to the process origin.
#[derive(Debug, Clone)]
pub struct RequestFilter {
    origin: Origin,
    api_prefix: SmolStr,
    excluded_prefixes: Vec<SmolStr>,
}

impl RequestFilter {
    /// Creates a filter for `origin`.
    pub fn new(origin: Origin, config: &FilterConfig) -> Self {
        Self {
            origin,
            api_prefix: config.api_prefix.clone(),
            excluded_prefixes: config.excluded_prefixes.clone(),
        }
    }

    /// Returns the origin requests must be addressed to.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Decides whether `request` is routed through the engine.
    pub fn classify(&self, request: &RequestDescriptor) -> Classification {
        if request.method() != Method::GET {
            return Classification::Skip(SkipReason::Method(request.method().clone()));
        }
        if request.origin() != &self.origin {
            return Classification::Skip(SkipReason::CrossOrigin);
        }
        let path = request.path();
        if let Some(prefix) = self
            .excluded_prefixes
            .iter()
            .find(|prefix| path.starts_with(prefix.as_str()))
        {
            return Classification::Skip(SkipReason::Excluded(prefix.clone()));
        }
        if path.starts_with(self.api_prefix.as_str()) {
            return Classification::Skip(SkipReason::Api);
        }
        Classification::Route
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> RequestFilter {
        RequestFilter::new(
            Origin::parse("https://site.example").unwrap(),
            &FilterConfig::default(),
        )
    }

    fn get(url: &str) -> RequestDescriptor {
        RequestDescriptor::get(url).unwrap()
    }

    #[test]
    fn same_origin_get_is_routed() {
        assert_eq!(
            filter().classify(&get("https://site.example/assets/app.js")),
            Classification::Route
        );
        assert!(filter().classify(&get("https://SITE.example/")).is_route());
        assert!(filter().classify(&get("https://site.example:443/recalls")).is_route());
        assert_eq!(
            filter().classify(&get("https://site.example:8443/recalls")),
            Classification::Skip(SkipReason::CrossOrigin)
        );
    }

    #[test]
    fn api_namespace_is_skipped() {
        assert_eq!(
            filter().classify(&get("https://site.example/api/v1/recalls/")),
            Classification::Skip(SkipReason::Api)
        );
    }

    #[test]
    fn non_get_is_skipped() {
        let uri = "https://site.example/recalls".parse().unwrap();
        let request = RequestDescriptor::new(Method::POST, uri).unwrap();
        assert_eq!(
            filter().classify(&request),
            Classification::Skip(SkipReason::Method(Method::POST))
        );
    }

    #[test]
    fn cross_origin_is_skipped() {
        assert_eq!(
            filter().classify(&get("https://cdn.example/assets/app.js")),
            Classification::Skip(SkipReason::CrossOrigin)
        );
        assert_eq!(
            filter().classify(&get("http://site.example/assets/app.js")),
            Classification::Skip(SkipReason::CrossOrigin)
        );
    }

    #[test]
    fn development_prefixes_are_skipped() {
        assert!(matches!(
            filter().classify(&get("https://site.example/_next/webpack-hmr?page=/")),
            Classification::Skip(SkipReason::Excluded(_))
        ));
        assert!(matches!(
            filter().classify(&get("https://site.example/__dev/reload")),
            Classification::Skip(SkipReason::Excluded(_))
        ));
    }
}
