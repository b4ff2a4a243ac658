//! Tracked runner for detached tasks.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use smol_str::SmolStr;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

use super::policy::{OffloadConfig, TimeoutPolicy};
use crate::metrics;

/// Identity of a spawned task: its kind plus a per-manager sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OffloadKey {
    /// Task kind, e.g. `"revalidate"`.
    pub kind: SmolStr,
    /// Sequence number, unique within one manager.
    pub id: u64,
}

#[derive(Debug)]
struct Shared {
    config: OffloadConfig,
    running: DashMap<OffloadKey, JoinHandle<()>>,
    sequence: AtomicU64,
}

impl Shared {
    fn prune_finished(&self) {
        self.running.retain(|_, handle| !handle.is_finished());
    }
}

/// Runs detached tasks and keeps track of them until they finish.
///
/// Tasks are never merged or cancelled: two refreshes of the same page
/// both run to completion. [`wait_all`](Self::wait_all) is the shutdown
/// hook, and tests use it to observe the effect of a refresh.
#[derive(Clone, Debug)]
pub struct OffloadManager {
    shared: Arc<Shared>,
}

impl OffloadManager {
    /// Creates a manager with `config`.
    pub fn new(config: OffloadConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                running: DashMap::new(),
                sequence: AtomicU64::new(0),
            }),
        }
    }

    /// Creates a manager that never warns about slow tasks.
    pub fn with_defaults() -> Self {
        Self::new(OffloadConfig::default())
    }

    /// Spawns `task` on the current Tokio runtime and returns its key.
    pub fn spawn<F>(&self, kind: impl Into<SmolStr>, task: F) -> OffloadKey
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = OffloadKey {
            kind: kind.into(),
            id: self.shared.sequence.fetch_add(1, Ordering::Relaxed),
        };
        debug!(kind = %key.kind, id = key.id, "offload task spawned");
        metrics::record_offload_spawned(&key.kind);

        // The entry guard keeps a fast task from removing its key before
        // the handle is stored.
        let slot = self.shared.running.entry(key.clone());
        slot.insert(self.run(task, key.clone()));
        key
    }

    /// Number of tasks still running.
    pub fn active_task_count(&self) -> usize {
        self.shared
            .running
            .iter()
            .filter(|task| !task.is_finished())
            .count()
    }

    /// Returns `true` while the task spawned as `key` is running.
    pub fn is_in_flight(&self, key: &OffloadKey) -> bool {
        self.shared
            .running
            .get(key)
            .is_some_and(|task| !task.is_finished())
    }

    /// Resolves once every task spawned so far has finished.
    pub async fn wait_all(&self) {
        loop {
            self.shared.prune_finished();
            if self.shared.running.is_empty() {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Like [`wait_all`](Self::wait_all) but gives up after `timeout`.
    ///
    /// Returns `false` on timeout. Unfinished tasks keep running.
    pub async fn wait_all_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_all()).await.is_ok()
    }

    fn run<F>(&self, task: F, key: OffloadKey) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let span = info_span!("offload_task", kind = %key.kind, id = key.id);

        tokio::spawn(
            async move {
                let started = Instant::now();
                task.await;
                let elapsed = started.elapsed();
                if let TimeoutPolicy::Warn(threshold) = shared.config.timeout_policy
                    && elapsed > threshold
                {
                    warn!(
                        elapsed_ms = elapsed.as_millis(),
                        threshold_ms = threshold.as_millis(),
                        "offload task ran past its warning threshold"
                    );
                }
                shared.running.remove(&key);
                metrics::record_offload_completed(&key.kind, elapsed);
            }
            .instrument(span),
        )
    }
}

impl Default for OffloadManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl shelter_core::Offload for OffloadManager {
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        OffloadManager::spawn(self, kind, future);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn wait_all_waits_for_every_task() {
        let manager = OffloadManager::with_defaults();
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let done = done.clone();
            manager.spawn("revalidate", async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        manager.wait_all().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(manager.active_task_count(), 0);
    }

    #[tokio::test]
    async fn identical_kinds_are_not_deduplicated() {
        let manager = OffloadManager::with_defaults();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let first = manager.spawn("revalidate", async move {
            let _ = rx.await;
        });
        let second = manager.spawn("revalidate", async {});
        assert_ne!(first, second);
        assert!(manager.is_in_flight(&first));
        tx.send(()).unwrap();
        manager.wait_all().await;
        assert!(!manager.is_in_flight(&first));
    }

    #[tokio::test]
    async fn warn_policy_never_cancels() {
        let manager = OffloadManager::new(OffloadConfig::warn_after(Duration::from_millis(1)));
        let done = Arc::new(AtomicUsize::new(0));
        let flag = done.clone();
        manager.spawn("revalidate", async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.fetch_add(1, Ordering::SeqCst);
        });
        assert!(manager.wait_all_timeout(Duration::from_secs(5)).await);
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }
}
