#![doc = include_str!("../README.md")]

pub mod mock_backend;
pub mod mock_transport;
pub mod tracing;

pub use mock_backend::{BackendCounters, MockBackend};
pub use mock_transport::MockTransport;

use shelter::{Shelter, ShelterConfig};
use shelter_core::RequestDescriptor;

/// Origin every helper in this crate uses.
pub const ORIGIN: &str = "https://site.example";

/// Engine over a [`MockBackend`] and a [`MockTransport`] at `version`.
pub fn shelter(
    backend: &MockBackend,
    transport: &MockTransport,
    version: &str,
) -> Shelter<MockBackend, MockTransport> {
    Shelter::builder()
        .store(backend.clone())
        .transport(transport.clone())
        .config(ShelterConfig::new(ORIGIN, version))
        .build()
        .expect("test origin is valid")
}

/// `GET` for `path` on [`ORIGIN`] accepting HTML.
pub fn navigate(path: &str) -> RequestDescriptor {
    request(path).with_accept("text/html,application/xhtml+xml")
}

/// `GET` for `path` on [`ORIGIN`] without an `Accept` header.
pub fn request(path: &str) -> RequestDescriptor {
    RequestDescriptor::get(&format!("{ORIGIN}{path}")).expect("test url is valid")
}
