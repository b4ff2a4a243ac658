//! `Transport` implementation over a `reqwest::Client`.

use std::time::Duration;

use async_trait::async_trait;
use http::header::ACCEPT;
use shelter_core::{NetworkError, RequestDescriptor, RequestError, ResponseDescriptor, Transport};
use tracing::trace;

/// Fetches requests with a [`reqwest::Client`].
///
/// Response bodies are buffered in full. A per-request timeout, when set,
/// applies on top of whatever the client itself is configured with.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a transport using `client`.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Sets a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    fn build_request(&self, request: &RequestDescriptor) -> Result<reqwest::Request, NetworkError> {
        let url = reqwest::Url::parse(&request.uri().to_string()).map_err(NetworkError::other)?;
        let mut outgoing = reqwest::Request::new(request.method().clone(), url);
        if let Some(accept) = request.accept() {
            outgoing.headers_mut().insert(ACCEPT, accept.clone());
        }
        *outgoing.timeout_mut() = self.timeout;
        Ok(outgoing)
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

/// Maps a client error onto the shelter network error kinds.
pub(crate) fn network_error(error: reqwest::Error) -> NetworkError {
    if error.is_timeout() {
        NetworkError::Timeout
    } else if error.is_connect() {
        NetworkError::connect(error)
    } else if error.is_body() || error.is_decode() {
        NetworkError::body(error)
    } else {
        NetworkError::other(error)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, request: RequestDescriptor) -> Result<ResponseDescriptor, NetworkError> {
        let outgoing = self.build_request(&request)?;
        trace!(method = %request.method(), uri = %request.uri(), "fetching");
        let response = self.client.execute(outgoing).await.map_err(network_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(network_error)?;
        Ok(ResponseDescriptor::from_parts(status, headers, body))
    }
}

/// Describes a reqwest request for the engine.
///
/// Only the method, the URL and the `Accept` header are kept.
pub fn descriptor_from_reqwest(
    request: &reqwest::Request,
) -> Result<RequestDescriptor, RequestError> {
    let uri: http::Uri = request.url().as_str().parse()?;
    Ok(RequestDescriptor::new(request.method().clone(), uri)?
        .with_accept_header(request.headers().get(ACCEPT).cloned()))
}
