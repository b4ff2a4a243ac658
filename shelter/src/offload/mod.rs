//! Offload manager for detached background tasks.
//!
//! Stale-while-revalidate hands its network refresh to the offload manager
//! so that the refresh outlives the request that triggered it. Tasks are
//! never cancelled by the manager; [`OffloadManager::wait_all`] lets
//! shutdown code and tests wait until every in-flight refresh has landed.
//!
//! # Example
//!
//! ```
//! use shelter::offload::OffloadManager;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = OffloadManager::with_defaults();
//! manager.spawn("revalidate", async {
//!     // refresh a cached page
//! });
//! manager.wait_all().await;
//! assert_eq!(manager.active_task_count(), 0);
//! # }
//! ```

mod manager;
mod policy;

pub use manager::{OffloadKey, OffloadManager};
pub use policy::{OffloadConfig, TimeoutPolicy};
