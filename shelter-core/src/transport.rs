//! Network transport abstraction.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{NetworkError, RequestDescriptor, ResponseDescriptor};

/// Network capability the engine fetches through.
///
/// A transport resolves a request to either a complete response (any status)
/// or a [`NetworkError`]. Timeouts are the transport's business: the engine
/// defines none and treats a timeout like any other failure.
///
/// Transports are shared between the request that triggered a fetch and the
/// background revalidation it may spawn, so implementations should be cheap
/// to share behind an [`Arc`].
///
/// # Examples
///
/// ```rust,ignore
/// use shelter_core::{NetworkError, RequestDescriptor, ResponseDescriptor, Transport};
///
/// struct Offline;
///
/// #[async_trait::async_trait]
/// impl Transport for Offline {
///     async fn fetch(&self, _req: RequestDescriptor) -> Result<ResponseDescriptor, NetworkError> {
///         Err(NetworkError::Timeout)
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the request.
    async fn fetch(&self, request: RequestDescriptor) -> Result<ResponseDescriptor, NetworkError>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn fetch(&self, request: RequestDescriptor) -> Result<ResponseDescriptor, NetworkError> {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl<T> Transport for &T
where
    T: Transport + ?Sized,
{
    async fn fetch(&self, request: RequestDescriptor) -> Result<ResponseDescriptor, NetworkError> {
        (**self).fetch(request).await
    }
}
