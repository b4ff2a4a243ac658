//! Scripted upstream.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use http::StatusCode;
use shelter_core::{NetworkError, RequestDescriptor, ResponseDescriptor, Transport};
use tokio::sync::watch;

/// Upstream answering from a path table.
///
/// Unknown paths answer `404`. While offline every fetch fails with
/// [`NetworkError::Timeout`]. While held every fetch waits until
/// [`release`](MockTransport::release) is called.
#[derive(Clone, Debug)]
pub struct MockTransport {
    routes: Arc<DashMap<String, ResponseDescriptor>>,
    calls: Arc<DashMap<String, usize>>,
    total_calls: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
    gate: Arc<watch::Sender<bool>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            routes: Arc::new(DashMap::new()),
            calls: Arc::new(DashMap::new()),
            total_calls: Arc::new(AtomicUsize::new(0)),
            offline: Arc::new(AtomicBool::new(false)),
            gate: Arc::new(gate),
        }
    }

    /// Answers `path` with `response` from now on.
    pub fn route(&self, path: &str, response: ResponseDescriptor) -> &Self {
        self.routes.insert(path.to_owned(), response);
        self
    }

    /// Answers `path` with a `200` HTML page whose body is `body`.
    pub fn page(&self, path: &str, body: &str) -> &Self {
        self.route(
            path,
            ResponseDescriptor::new(StatusCode::OK)
                .with_content_type("text/html; charset=utf-8")
                .with_body(body.to_owned()),
        )
    }

    /// Answers `path` with an empty response of `status`.
    pub fn status(&self, path: &str, status: StatusCode) -> &Self {
        self.route(path, ResponseDescriptor::new(status))
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes every fetch wait until [`release`](Self::release).
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Fetches of `path` so far, counting failed ones.
    pub fn calls(&self, path: &str) -> usize {
        self.calls.get(path).map(|count| *count).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, request: RequestDescriptor) -> Result<ResponseDescriptor, NetworkError> {
        let path = request.path().to_owned();
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self.calls.entry(path.clone()).or_insert(0) += 1;

        let mut gate = self.gate.subscribe();
        gate.wait_for(|open| *open)
            .await
            .map_err(NetworkError::other)?;

        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Timeout);
        }
        Ok(self
            .routes
            .get(&path)
            .map(|response| response.value().clone())
            .unwrap_or_else(|| ResponseDescriptor::new(StatusCode::NOT_FOUND)))
    }
}
