//! Inbound request descriptors.
//!
//! The engine never sees a full HTTP request with a body. It sees a
//! [`RequestDescriptor`]: the method, the absolute URL and the `Accept`
//! header, which is everything routing, keying and fallback need.

use std::fmt;

use http::{HeaderValue, Method, Uri, header::ACCEPT};
use smol_str::{SmolStr, format_smolstr};
use thiserror::Error;

use crate::CacheKey;

/// Error building a [`RequestDescriptor`].
#[derive(Debug, Error)]
pub enum RequestError {
    /// The URL could not be parsed.
    #[error("invalid request uri: {0}")]
    InvalidUri(#[from] http::uri::InvalidUri),

    /// The URL has no scheme or no authority.
    #[error("request uri must be absolute: {0}")]
    NotAbsolute(String),
}

/// Scheme and authority of a URL, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: SmolStr,
    authority: SmolStr,
}

impl Origin {
    /// Extracts the origin of an absolute URI.
    ///
    /// The default port of the scheme (`80` for http, `443` for https) is
    /// dropped, so `https://site.example:443` and `https://site.example`
    /// are the same origin.
    pub fn from_uri(uri: &Uri) -> Option<Self> {
        let scheme = uri.scheme_str()?.to_ascii_lowercase();
        let authority = uri.authority()?;
        let host = authority.host().to_ascii_lowercase();
        let authority = match (scheme.as_str(), authority.port_u16()) {
            ("http", Some(80)) | ("https", Some(443)) | (_, None) => SmolStr::new(host),
            (_, Some(port)) => format_smolstr!("{host}:{port}"),
        };
        Some(Self {
            scheme: SmolStr::new(scheme),
            authority,
        })
    }

    /// Parses an origin such as `https://site.example`.
    ///
    /// Any path component is ignored.
    pub fn parse(value: &str) -> Result<Self, RequestError> {
        let uri: Uri = value.parse()?;
        Self::from_uri(&uri).ok_or_else(|| RequestError::NotAbsolute(value.to_owned()))
    }

    /// Returns the lowercase scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the lowercase authority (`host[:port]`).
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Resolves an absolute path against this origin.
    pub fn join(&self, path: &str) -> Result<Uri, RequestError> {
        let path = if path.starts_with('/') {
            SmolStr::new(path)
        } else {
            format_smolstr!("/{path}")
        };
        Ok(format!("{}://{}{}", self.scheme, self.authority, path).parse()?)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

/// Method, absolute URL and accepted content types of a request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    uri: Uri,
    origin: Origin,
    accept: Option<HeaderValue>,
}

impl RequestDescriptor {
    /// Creates a descriptor, rejecting relative URIs.
    pub fn new(method: Method, uri: Uri) -> Result<Self, RequestError> {
        let origin =
            Origin::from_uri(&uri).ok_or_else(|| RequestError::NotAbsolute(uri.to_string()))?;
        Ok(Self {
            method,
            uri,
            origin,
            accept: None,
        })
    }

    /// Shorthand for a `GET` request to `url`.
    ///
    /// ```
    /// use shelter_core::RequestDescriptor;
    ///
    /// let request = RequestDescriptor::get("https://site.example/recalls?page=2")
    ///     .unwrap()
    ///     .with_accept("text/html,application/xhtml+xml");
    /// assert_eq!(request.path(), "/recalls");
    /// assert!(request.accepts_html());
    /// ```
    pub fn get(url: &str) -> Result<Self, RequestError> {
        Self::new(Method::GET, url.parse()?)
    }

    /// Builds a descriptor from an [`http::Request`], keeping its `Accept` header.
    pub fn from_http<B>(request: &http::Request<B>) -> Result<Self, RequestError> {
        let mut descriptor = Self::new(request.method().clone(), request.uri().clone())?;
        descriptor.accept = request.headers().get(ACCEPT).cloned();
        Ok(descriptor)
    }

    /// Sets the `Accept` header value.
    ///
    /// Values that are not valid header text are ignored.
    pub fn with_accept(mut self, accept: &str) -> Self {
        self.accept = HeaderValue::from_str(accept).ok();
        self
    }

    /// Sets the `Accept` header from an existing header value.
    pub fn with_accept_header(mut self, accept: Option<HeaderValue>) -> Self {
        self.accept = accept;
        self
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the absolute request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the origin the request is addressed to.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Returns the URL path, `/` when the URL has none.
    pub fn path(&self) -> &str {
        match self.uri.path() {
            "" => "/",
            path => path,
        }
    }

    /// Returns the raw `Accept` header, if any.
    pub fn accept(&self) -> Option<&HeaderValue> {
        self.accept.as_ref()
    }

    /// Returns `true` if the caller declared it accepts HTML.
    pub fn accepts_html(&self) -> bool {
        self.accept
            .as_ref()
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.to_ascii_lowercase().contains("text/html"))
    }

    /// Normalized identity of this request in the cache store.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::from_request(self)
    }

    /// Converts the descriptor into a body-less [`http::Request`].
    pub fn to_http(&self) -> http::Request<()> {
        let mut request = http::Request::new(());
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.uri.clone();
        if let Some(accept) = &self.accept {
            request.headers_mut().insert(ACCEPT, accept.clone());
        }
        request
    }
}
