//! Response descriptors and their persisted form.
//!
//! - [`ResponseDescriptor`] - what transports return and callers receive
//! - [`StoredResponse`] - the serializable snapshot kept in the cache store
//!
//! ## Success-only persistence
//!
//! Only responses whose status is in the `2xx` range may be captured.
//! [`StoredResponse::capture`] returns `None` for redirects and error
//! statuses, so an error page can never be replayed as a valid cached
//! resource.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status, headers and fully buffered body of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDescriptor {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ResponseDescriptor {
    /// Creates a response with no headers and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a response from its parts.
    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Adds a header, replacing any previous value.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the `Content-Type` header.
    pub fn with_content_type(self, content_type: &'static str) -> Self {
        self.with_header(CONTENT_TYPE, HeaderValue::from_static(content_type))
    }

    /// Replaces the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the `Content-Type` header as text.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// Returns `true` if the status is in the `2xx` range.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Converts into an [`http::Response`].
    pub fn into_http(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    /// Builds a descriptor from a buffered [`http::Response`].
    pub fn from_http(response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }
}

/// Error converting a [`StoredResponse`] back into a [`ResponseDescriptor`].
#[derive(Debug, Error)]
pub enum StoredResponseError {
    /// The persisted status is not a valid HTTP status code.
    #[error("invalid stored status code: {0}")]
    InvalidStatus(u16),

    /// A persisted header name or value is not valid.
    #[error("invalid stored header: {0}")]
    InvalidHeader(String),
}

/// A single persisted header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredHeader {
    /// Header name, lowercase.
    pub name: String,
    /// Raw header value.
    pub value: Bytes,
}

/// Serializable snapshot of a successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    status: u16,
    headers: Vec<StoredHeader>,
    body: Bytes,
    stored_at: DateTime<Utc>,
}

impl StoredResponse {
    /// Captures `response` for persistence.
    ///
    /// Returns `None` when the status is outside the `2xx` range.
    pub fn capture(response: &ResponseDescriptor) -> Option<Self> {
        if !response.is_success() {
            return None;
        }
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| StoredHeader {
                name: name.as_str().to_owned(),
                value: Bytes::copy_from_slice(value.as_bytes()),
            })
            .collect();
        Some(Self {
            status: response.status().as_u16(),
            headers,
            body: response.body().clone(),
            stored_at: Utc::now(),
        })
    }

    /// Returns the persisted status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the persisted body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the persisted headers.
    pub fn headers(&self) -> &[StoredHeader] {
        &self.headers
    }

    /// Returns when the response was written to the store.
    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }
}

impl TryFrom<StoredResponse> for ResponseDescriptor {
    type Error = StoredResponseError;

    fn try_from(stored: StoredResponse) -> Result<Self, Self::Error> {
        let status = StatusCode::from_u16(stored.status)
            .map_err(|_| StoredResponseError::InvalidStatus(stored.status))?;
        let mut headers = HeaderMap::with_capacity(stored.headers.len());
        for header in stored.headers {
            let name = HeaderName::from_bytes(header.name.as_bytes())
                .map_err(|_| StoredResponseError::InvalidHeader(header.name.clone()))?;
            let value = HeaderValue::from_maybe_shared(header.value)
                .map_err(|_| StoredResponseError::InvalidHeader(header.name))?;
            headers.append(name, value);
        }
        Ok(ResponseDescriptor::from_parts(status, headers, stored.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::SET_COOKIE;

    fn page(status: StatusCode) -> ResponseDescriptor {
        ResponseDescriptor::new(status)
            .with_content_type("text/html; charset=utf-8")
            .with_body("<h1>recalls</h1>")
    }

    #[test]
    fn only_success_is_captured() {
        assert!(StoredResponse::capture(&page(StatusCode::OK)).is_some());
        assert!(StoredResponse::capture(&page(StatusCode::NO_CONTENT)).is_some());
        assert!(StoredResponse::capture(&page(StatusCode::MOVED_PERMANENTLY)).is_none());
        assert!(StoredResponse::capture(&page(StatusCode::NOT_FOUND)).is_none());
        assert!(StoredResponse::capture(&page(StatusCode::BAD_GATEWAY)).is_none());
    }

    #[test]
    fn restore_keeps_repeated_headers() {
        let response = page(StatusCode::OK);
        let mut headers = response.headers().clone();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        let response = ResponseDescriptor::from_parts(StatusCode::OK, headers, Bytes::new());

        let stored = StoredResponse::capture(&response).unwrap();
        let restored = ResponseDescriptor::try_from(stored).unwrap();
        assert_eq!(restored.headers().get_all(SET_COOKIE).iter().count(), 2);
        assert_eq!(restored, response);
    }

    #[test]
    fn corrupt_status_is_rejected() {
        let mut stored = StoredResponse::capture(&page(StatusCode::OK)).unwrap();
        stored.status = 42;
        assert!(matches!(
            ResponseDescriptor::try_from(stored),
            Err(StoredResponseError::InvalidStatus(42))
        ));
    }
}
