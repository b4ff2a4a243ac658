//! Detached background work.

use std::future::Future;

use smol_str::SmolStr;

/// Runs futures outside the request that created them.
///
/// Stale-while-revalidate hands its refresh (fetch plus store write) to an
/// `Offload`, so the refresh still lands when the caller has already
/// received a cached response or has gone away. The engine's
/// implementation is `OffloadManager` in the `shelter` crate.
///
/// Clones must share state: waiting on one clone covers tasks spawned
/// through any other.
///
/// ```
/// use shelter_core::Offload;
///
/// fn refresh_later<O: Offload>(offload: &O, path: String) {
///     offload.spawn("revalidate", async move {
///         let _ = path;
///     });
/// }
/// ```
pub trait Offload: Send + Sync + Clone {
    /// Starts `future` in the background.
    ///
    /// `kind` labels the task in logs and metrics, e.g. `"revalidate"`.
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
