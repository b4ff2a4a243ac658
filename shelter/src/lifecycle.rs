//! Generation lifecycle: install then activate.
//!
//! A [`Lifecycle`] moves through three states, each transition consuming
//! the previous state:
//!
//! ```text
//! Lifecycle<Pending> --install()--> Lifecycle<Installed> --activate()--> Lifecycle<Activated>
//! ```
//!
//! The types make "install precedes activate, each at most once, never
//! overlapping" a compile-time property of one lifecycle. A process
//! restart builds a new lifecycle; running it again with the same version
//! finds nothing to prune and warms the shell again.
//!
//! - **install** opens the current generations and pre-warms the shell
//!   resources concurrently. A resource that fails to warm is reported and
//!   skipped; it never aborts the others, and install itself cannot fail.
//! - **activate** deletes every generation that is not current. There is
//!   no rollback: generations deleted before a failure stay deleted.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use http::StatusCode;
use shelter_backend::{Backend, CacheStore, WriteStatus};
use shelter_core::{GenerationName, Generations, Origin, RequestDescriptor, Transport};
use tracing::{debug, info, warn};

use crate::error::LifecycleError;
use crate::metrics;

/// Initial state: nothing done yet.
#[derive(Debug)]
pub struct Pending;

/// State after install.
#[derive(Debug)]
pub struct Installed {
    install: InstallReport,
}

/// State after activate.
#[derive(Debug)]
pub struct Activated {
    install: InstallReport,
    activate: ActivateReport,
}

/// Why a shell resource was not warmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellSkip {
    /// The path cannot be joined to the origin.
    InvalidPath(String),
    /// The fetch failed.
    Network(String),
    /// The response was not `2xx`.
    Status(StatusCode),
    /// The store rejected the write.
    Store(String),
}

impl fmt::Display for ShellSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellSkip::InvalidPath(error) => write!(f, "invalid path: {error}"),
            ShellSkip::Network(error) => write!(f, "network: {error}"),
            ShellSkip::Status(status) => write!(f, "status {status}"),
            ShellSkip::Store(error) => write!(f, "store: {error}"),
        }
    }
}

/// A shell resource that could not be warmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedResource {
    /// Configured path.
    pub path: String,
    /// Failure.
    pub reason: ShellSkip,
}

/// Outcome of [`Lifecycle::install`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Shell paths fetched and stored, in configuration order.
    pub warmed: Vec<String>,
    /// Shell paths that failed, in configuration order.
    pub skipped: Vec<SkippedResource>,
}

impl InstallReport {
    /// Returns `true` if every shell resource was warmed.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Outcome of [`Lifecycle::activate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivateReport {
    /// Superseded generations deleted.
    pub pruned: Vec<GenerationName>,
    /// Current generations found in the store.
    pub retained: Vec<GenerationName>,
}

/// Install/activate state machine for one process instance.
pub struct Lifecycle<S, B, T> {
    store: Arc<B>,
    transport: Arc<T>,
    generations: Generations,
    origin: Origin,
    shell: Vec<String>,
    state: S,
}

impl<S: fmt::Debug, B, T> fmt::Debug for Lifecycle<S, B, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("generations", &self.generations)
            .field("origin", &self.origin)
            .field("shell", &self.shell)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S, B, T> Lifecycle<S, B, T> {
    /// Returns the generations this lifecycle installs.
    pub fn generations(&self) -> &Generations {
        &self.generations
    }

    fn transition<N>(self, state: N) -> Lifecycle<N, B, T> {
        Lifecycle {
            store: self.store,
            transport: self.transport,
            generations: self.generations,
            origin: self.origin,
            shell: self.shell,
            state,
        }
    }
}

impl<B, T> Lifecycle<Pending, B, T>
where
    B: CacheStore,
    T: Transport,
{
    /// Creates a pending lifecycle.
    pub fn new(
        store: Arc<B>,
        transport: Arc<T>,
        generations: Generations,
        origin: Origin,
        shell: Vec<String>,
    ) -> Self {
        Self {
            store,
            transport,
            generations,
            origin,
            shell,
            state: Pending,
        }
    }

    /// Opens the current generations and pre-warms the shell.
    pub async fn install(self) -> Lifecycle<Installed, B, T> {
        info!(version = self.generations.version(), "installing cache generations");
        for generation in self.generations.current() {
            if let Err(error) = self.store.open(generation).await {
                warn!(%error, %generation, "failed to open generation");
                metrics::record_store_error(self.store.name(), "write");
            }
        }

        let results = join_all(self.shell.iter().map(|path| self.warm(path))).await;
        let mut report = InstallReport::default();
        for (path, result) in self.shell.iter().zip(results) {
            match result {
                Ok(()) => {
                    metrics::record_shell_resource("warmed");
                    report.warmed.push(path.clone());
                }
                Err(reason) => {
                    warn!(path, %reason, "shell resource skipped");
                    metrics::record_shell_resource("skipped");
                    report.skipped.push(SkippedResource {
                        path: path.clone(),
                        reason,
                    });
                }
            }
        }
        info!(
            warmed = report.warmed.len(),
            skipped = report.skipped.len(),
            "install finished"
        );
        self.transition(Installed { install: report })
    }

    async fn warm(&self, path: &str) -> Result<(), ShellSkip> {
        let uri = self
            .origin
            .join(path)
            .map_err(|error| ShellSkip::InvalidPath(error.to_string()))?;
        let request = RequestDescriptor::new(http::Method::GET, uri)
            .map_err(|error| ShellSkip::InvalidPath(error.to_string()))?
            .with_accept("text/html");
        let response = self
            .transport
            .fetch(request.clone())
            .await
            .map_err(|error| ShellSkip::Network(error.to_string()))?;
        let status = self
            .store
            .put(self.generations.pages(), &request.cache_key(), &response)
            .await
            .map_err(|error| ShellSkip::Store(error.to_string()))?;
        match status {
            WriteStatus::Written => {
                debug!(path, "shell resource warmed");
                Ok(())
            }
            WriteStatus::Skipped => Err(ShellSkip::Status(response.status())),
        }
    }
}

impl<B, T> Lifecycle<Installed, B, T>
where
    B: Backend,
{
    /// Returns the install outcome.
    pub fn install_report(&self) -> &InstallReport {
        &self.state.install
    }

    /// Deletes every generation that is not current.
    pub async fn activate(self) -> Result<Lifecycle<Activated, B, T>, LifecycleError> {
        let names = self
            .store
            .generations()
            .await
            .map_err(LifecycleError::Enumerate)?;

        let mut report = ActivateReport::default();
        for name in names {
            if self.generations.is_current(&name) {
                report.retained.push(name);
                continue;
            }
            self.store
                .drop_generation(&name)
                .await
                .map_err(|source| LifecycleError::Prune {
                    generation: name.clone(),
                    source,
                })?;
            info!(generation = %name, "superseded generation deleted");
            report.pruned.push(name);
        }
        metrics::record_pruned(report.pruned.len());
        info!(
            version = self.generations.version(),
            pruned = report.pruned.len(),
            "activation finished"
        );

        let install = self.state.install.clone();
        Ok(self.transition(Activated {
            install,
            activate: report,
        }))
    }
}

impl<B, T> Lifecycle<Activated, B, T> {
    /// Returns the install outcome.
    pub fn install_report(&self) -> &InstallReport {
        &self.state.install
    }

    /// Returns the activate outcome.
    pub fn activate_report(&self) -> &ActivateReport {
        &self.state.activate
    }
}
