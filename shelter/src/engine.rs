//! The [`Shelter`] engine and its builder.

use std::sync::Arc;
use std::time::Instant;

use shelter_backend::CacheStore;
use shelter_core::{
    Generations, NetworkError, Offload, Origin, RequestDescriptor, ResponseDescriptor, Transport,
};
use tracing::{debug, trace};

use crate::config::ShelterConfig;
use crate::context::CacheContext;
use crate::error::BuildError;
use crate::fallback::FallbackResolver;
use crate::filter::{Classification, RequestFilter};
use crate::lifecycle::{Lifecycle, Pending};
use crate::metrics;
use crate::offload::{OffloadConfig, OffloadManager};
use crate::policy::{PolicyTable, Strategy};
use crate::strategy::{Executor, Served};

/// Marker for a builder field that has not been set yet.
///
/// When you see `NotSet` in a compiler error, the corresponding builder
/// method has not been called.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotSet;

/// Offline cache engine.
///
/// Every request goes through three steps:
///
/// 1. the [`RequestFilter`] decides whether the engine handles it at all
/// 2. the [`PolicyTable`] picks a [`Strategy`] from the path
/// 3. the [`Executor`] runs the strategy against the store and transport
///
/// Cloning is cheap and clones share the store, transport and offload
/// manager.
pub struct Shelter<B, T, O = OffloadManager> {
    filter: RequestFilter,
    policy: Arc<PolicyTable>,
    executor: Executor<B, T, O>,
    shell: Arc<[String]>,
}

impl<B, T, O: Clone> Clone for Shelter<B, T, O> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            policy: Arc::clone(&self.policy),
            executor: self.executor.clone(),
            shell: Arc::clone(&self.shell),
        }
    }
}

impl<B, T, O> std::fmt::Debug for Shelter<B, T, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shelter")
            .field("filter", &self.filter)
            .field("policy", &self.policy)
            .field("executor", &self.executor)
            .field("shell", &self.shell)
            .finish()
    }
}

impl Shelter<NotSet, NotSet, NotSet> {
    /// Creates a new [`ShelterBuilder`].
    pub fn builder() -> ShelterBuilder<NotSet, NotSet, NotSet> {
        ShelterBuilder::new()
    }
}

impl<B, T, O> Shelter<B, T, O>
where
    B: CacheStore + 'static,
    T: Transport + 'static,
    O: Offload + 'static,
{
    /// Classifies `request` without serving it.
    pub fn classify(&self, request: &RequestDescriptor) -> Classification {
        self.filter.classify(request)
    }

    /// Strategy the policy table selects for `request`, or `None` when the
    /// filter skips it.
    pub fn strategy_for(&self, request: &RequestDescriptor) -> Option<Strategy> {
        self.classify(request)
            .is_route()
            .then(|| self.policy.select(request.path()))
    }

    /// Serves `request`.
    ///
    /// Filtered requests go straight to the transport and their network
    /// error, if any, is returned unchanged. Routed requests run their
    /// strategy; only [`Strategy::NetworkOnly`] can fail.
    pub async fn serve(&self, request: RequestDescriptor) -> Result<Served, NetworkError> {
        let started = Instant::now();
        let served = match self.classify(&request) {
            Classification::Skip(reason) => {
                trace!(path = request.path(), %reason, "request bypasses the engine");
                let response = self.executor.transport().fetch(request).await?;
                (response, CacheContext::bypass())
            }
            Classification::Route => {
                let strategy = self.policy.select(request.path());
                debug!(path = request.path(), %strategy, "routing request");
                self.executor.execute(strategy, &request).await?
            }
        };
        metrics::record_served(&served.1, started.elapsed());
        Ok(served)
    }

    /// Like [`serve`](Self::serve), returning only the response.
    pub async fn fetch(
        &self,
        request: RequestDescriptor,
    ) -> Result<ResponseDescriptor, NetworkError> {
        self.serve(request).await.map(|(response, _)| response)
    }

    /// Starts a new install/activate lifecycle for the configured version.
    pub fn lifecycle(&self) -> Lifecycle<Pending, B, T> {
        Lifecycle::new(
            Arc::clone(self.executor.store()),
            Arc::clone(self.executor.transport()),
            self.executor.generations().clone(),
            self.filter.origin().clone(),
            self.shell.to_vec(),
        )
    }

    /// Returns the offload manager running detached refreshes.
    pub fn offload(&self) -> &O {
        self.executor.offload()
    }

    /// Returns the policy table.
    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    /// Returns the current generations.
    pub fn generations(&self) -> &Generations {
        self.executor.generations()
    }

    /// Returns the strategy executor.
    pub fn executor(&self) -> &Executor<B, T, O> {
        &self.executor
    }

    /// Returns the store.
    pub fn store(&self) -> &Arc<B> {
        self.executor.store()
    }
}

/// Builder for [`Shelter`].
///
/// The store and the transport are required; configuration, policy table
/// and offload fall back to their defaults.
///
/// ```
/// use async_trait::async_trait;
/// use shelter::{Shelter, ShelterConfig};
/// use shelter_core::{NetworkError, RequestDescriptor, ResponseDescriptor, Transport};
/// use shelter_moka::MokaBackend;
///
/// struct Offline;
///
/// #[async_trait]
/// impl Transport for Offline {
///     async fn fetch(&self, _: RequestDescriptor) -> Result<ResponseDescriptor, NetworkError> {
///         Err(NetworkError::Timeout)
///     }
/// }
///
/// let shelter = Shelter::builder()
///     .store(MokaBackend::builder().max_entries(1024).build())
///     .transport(Offline)
///     .config(ShelterConfig::new("https://site.example", "v2"))
///     .build()
///     .unwrap();
/// assert_eq!(shelter.generations().pages().as_str(), "pages-v2");
/// ```
pub struct ShelterBuilder<B, T, O = NotSet> {
    store: B,
    transport: T,
    offload: O,
    config: ShelterConfig,
    policy: Option<PolicyTable>,
}

impl ShelterBuilder<NotSet, NotSet, NotSet> {
    /// Creates a builder with nothing set.
    pub fn new() -> Self {
        Self {
            store: NotSet,
            transport: NotSet,
            offload: NotSet,
            config: ShelterConfig::default(),
            policy: None,
        }
    }
}

impl Default for ShelterBuilder<NotSet, NotSet, NotSet> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, T, O> ShelterBuilder<B, T, O> {
    /// Sets the cache store.
    pub fn store<NB>(self, store: NB) -> ShelterBuilder<Arc<NB>, T, O>
    where
        NB: CacheStore + 'static,
    {
        self.shared_store(Arc::new(store))
    }

    /// Sets a cache store that is shared with other owners.
    pub fn shared_store<NB>(self, store: Arc<NB>) -> ShelterBuilder<Arc<NB>, T, O>
    where
        NB: CacheStore + 'static,
    {
        ShelterBuilder {
            store,
            transport: self.transport,
            offload: self.offload,
            config: self.config,
            policy: self.policy,
        }
    }

    /// Sets the network transport.
    pub fn transport<NT>(self, transport: NT) -> ShelterBuilder<B, Arc<NT>, O>
    where
        NT: Transport + 'static,
    {
        ShelterBuilder {
            store: self.store,
            transport: Arc::new(transport),
            offload: self.offload,
            config: self.config,
            policy: self.policy,
        }
    }

    /// Sets the offload used for detached refreshes.
    ///
    /// Without it, [`build`](ShelterBuilder::build) creates an
    /// [`OffloadManager`] from the configuration's offload settings.
    pub fn offload<NO>(self, offload: NO) -> ShelterBuilder<B, T, NO>
    where
        NO: Offload + 'static,
    {
        ShelterBuilder {
            store: self.store,
            transport: self.transport,
            offload,
            config: self.config,
            policy: self.policy,
        }
    }

    /// Sets the engine configuration.
    pub fn config(mut self, config: ShelterConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the policy table. Defaults to [`PolicyTable::default`].
    pub fn policy(mut self, policy: PolicyTable) -> Self {
        self.policy = Some(policy);
        self
    }
}

impl<B, T> ShelterBuilder<Arc<B>, Arc<T>, NotSet>
where
    B: CacheStore + 'static,
    T: Transport + 'static,
{
    /// Builds the engine with an [`OffloadManager`].
    pub fn build(self) -> Result<Shelter<B, T, OffloadManager>, BuildError> {
        let offload = OffloadManager::new(OffloadConfig::from(&self.config.offload));
        self.offload(offload).build()
    }
}

impl<B, T, O> ShelterBuilder<Arc<B>, Arc<T>, O>
where
    B: CacheStore + 'static,
    T: Transport + 'static,
    O: Offload + 'static,
{
    /// Builds the engine.
    ///
    /// Fails when the configured origin is not an absolute URL or the
    /// offline path cannot be joined to it.
    pub fn build(self) -> Result<Shelter<B, T, O>, BuildError> {
        let ShelterBuilder {
            store,
            transport,
            offload,
            config,
            policy,
        } = self;

        let origin = Origin::parse(&config.origin).map_err(|source| BuildError::InvalidOrigin {
            origin: config.origin.clone(),
            source,
        })?;
        let invalid_offline_path = |source| BuildError::InvalidOfflinePath {
            path: config.offline_path.clone(),
            source,
        };
        let offline_uri = origin
            .join(&config.offline_path)
            .map_err(invalid_offline_path)?;
        let offline_page = RequestDescriptor::new(http::Method::GET, offline_uri)
            .map_err(invalid_offline_path)?
            .cache_key();

        let generations = Generations::new(config.version.clone());
        let fallback = FallbackResolver::new(offline_page, generations.pages().clone());
        let filter = RequestFilter::new(origin, &config.filter);
        debug!(
            origin = %filter.origin(),
            version = %config.version,
            "shelter engine built"
        );

        Ok(Shelter {
            filter,
            policy: Arc::new(policy.unwrap_or_default()),
            executor: Executor::new(store, transport, offload, fallback, generations),
            shell: config.shell.into(),
        })
    }
}
