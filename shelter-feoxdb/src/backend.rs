use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use feoxdb::{FeoxError, FeoxStore};
use shelter_backend::format::{Format, JsonFormat};
use shelter_backend::{Backend, BackendError, BackendResult, CacheStore, DeleteStatus};
use shelter_core::{CacheKey, GenerationName, Raw};
use tracing::debug;

use crate::FeOxDbError;
use crate::index::{GenerationIndex, entry_key};

impl From<FeOxDbError> for BackendError {
    fn from(error: FeOxDbError) -> Self {
        match error {
            FeOxDbError::Store(err) => BackendError::ConnectionError(Box::new(err)),
            other => BackendError::InternalError(Box::new(other)),
        }
    }
}

/// Disk-based store using FeOxDB.
///
/// Use this when cached pages must survive restarts.
///
/// ```no_run
/// use shelter_feoxdb::FeOxDbBackend;
///
/// let backend = FeOxDbBackend::builder()
///     .path("/var/lib/field-app/cache")
///     .max_file_size(1024 * 1024 * 1024)  // 1 GB
///     .max_memory(64 * 1024 * 1024)       // 64 MB
///     .build()?;
/// # Ok::<(), shelter_feoxdb::FeOxDbError>(())
/// ```
///
/// Cloning is cheap: clones share the same database and index.
#[derive(Clone)]
pub struct FeOxDbBackend<S = JsonFormat>
where
    S: Format,
{
    store: Arc<FeoxStore>,
    index: Arc<Mutex<GenerationIndex>>,
    serializer: S,
    label: String,
}

impl<S> std::fmt::Debug for FeOxDbBackend<S>
where
    S: Format,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeOxDbBackend")
            .field("label", &self.label)
            .field("serializer", &self.serializer)
            .finish()
    }
}

impl<S> FeOxDbBackend<S>
where
    S: Format,
{
    /// Forces pending writes to disk.
    ///
    /// FeOxDB buffers writes in memory and flushes them periodically.
    /// No-op in memory-only mode.
    pub fn flush(&self) {
        self.store.flush();
    }

    /// Runs `f` against the store and the locked index on the blocking pool.
    async fn with_index<T, F>(&self, f: F) -> BackendResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&FeoxStore, &mut GenerationIndex) -> Result<T, FeOxDbError> + Send + 'static,
    {
        let store = self.store.clone();
        let index = self.index.clone();
        tokio::task::spawn_blocking(move || {
            let mut index = index.lock().map_err(|_| FeOxDbError::IndexPoisoned)?;
            f(&store, &mut index)
        })
        .await
        .map_err(|e| BackendError::InternalError(Box::new(e)))?
        .map_err(BackendError::from)
    }
}

impl FeOxDbBackend<JsonFormat> {
    /// Starts building a new backend.
    pub fn builder() -> FeOxDbBackendBuilder<JsonFormat> {
        FeOxDbBackendBuilder::default()
    }

    /// In-memory backend for tests.
    ///
    /// Data is lost when dropped. Equivalent to `builder().build()`.
    pub fn in_memory() -> Result<Self, FeOxDbError> {
        Self::builder().build()
    }
}

/// Builder for [`FeOxDbBackend`].
///
/// ```no_run
/// use shelter_feoxdb::FeOxDbBackend;
/// use shelter_backend::format::BincodeFormat;
///
/// let backend = FeOxDbBackend::builder()
///     .path("/var/lib/field-app/cache")
///     .value_format(BincodeFormat)
///     .build()?;
/// # Ok::<(), shelter_feoxdb::FeOxDbError>(())
/// ```
pub struct FeOxDbBackendBuilder<S = JsonFormat>
where
    S: Format,
{
    path: Option<PathBuf>,
    max_file_size: Option<u64>,
    max_memory: Option<usize>,
    serializer: S,
    label: String,
}

impl Default for FeOxDbBackendBuilder<JsonFormat> {
    fn default() -> Self {
        Self {
            path: None,
            max_file_size: None,
            max_memory: None,
            serializer: JsonFormat,
            label: "feoxdb".to_owned(),
        }
    }
}

impl<S> FeOxDbBackendBuilder<S>
where
    S: Format,
{
    /// Enables persistent storage at the given path.
    ///
    /// Without this, data lives only in memory and is lost on restart.
    /// If path is a directory, creates `shelter.db` inside it.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Pre-allocates disk space and caps maximum storage.
    ///
    /// Writes fail once the file is full. Ignored in memory-only mode.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Limits RAM usage.
    ///
    /// FeOxDB has no automatic eviction: writes fail with `OutOfMemory`
    /// when the limit is reached. The engine treats such a failure as a
    /// skipped write.
    pub fn max_memory(mut self, bytes: usize) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Identifies this backend in logs and metrics.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Value serialization format.
    ///
    /// `JsonFormat` (default) keeps entries readable when inspecting the
    /// database; `BincodeFormat` is smaller.
    pub fn value_format<NewS>(self, serializer: NewS) -> FeOxDbBackendBuilder<NewS>
    where
        NewS: Format,
    {
        FeOxDbBackendBuilder {
            path: self.path,
            max_file_size: self.max_file_size,
            max_memory: self.max_memory,
            serializer,
            label: self.label,
        }
    }

    /// Opens the database and loads its generation index.
    ///
    /// Fails if the database file can't be opened or the index is corrupt.
    pub fn build(self) -> Result<FeOxDbBackend<S>, FeOxDbError> {
        let mut builder = FeoxStore::builder();

        if let Some(mut path) = self.path {
            if path.is_dir() {
                path.push("shelter.db");
            }
            let path_str = path.to_string_lossy().to_string();
            builder = builder.device_path(path_str);
        }

        if let Some(file_size) = self.max_file_size {
            builder = builder.file_size(file_size);
        }

        if let Some(memory) = self.max_memory {
            builder = builder.max_memory(memory);
        }

        let store = builder.build()?;
        let index = GenerationIndex::load(&store)?;
        debug!(
            backend = %self.label,
            generations = ?index.names(),
            "generation index loaded"
        );

        Ok(FeOxDbBackend {
            store: Arc::new(store),
            index: Arc::new(Mutex::new(index)),
            serializer: self.serializer,
            label: self.label,
        })
    }
}

#[async_trait]
impl<S> Backend for FeOxDbBackend<S>
where
    S: Format + Send + Sync,
{
    async fn read(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> BackendResult<Option<Raw>> {
        let store = self.store.clone();
        let key_bytes = entry_key(generation, key);

        tokio::task::spawn_blocking(move || match store.get(&key_bytes) {
            Ok(encoded) => Ok(Some(Raw::from(encoded))),
            Err(FeoxError::KeyNotFound) => Ok(None),
            Err(e) => Err(BackendError::ConnectionError(Box::new(e))),
        })
        .await
        .map_err(|e| BackendError::InternalError(Box::new(e)))?
    }

    async fn write(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
        value: Raw,
    ) -> BackendResult<()> {
        let generation = generation.clone();
        let key = key.clone();
        self.with_index(move |store, index| {
            store.insert(&entry_key(&generation, &key), &value)?;
            index.insert(store, &generation, &key)
        })
        .await
    }

    async fn remove(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> BackendResult<DeleteStatus> {
        let generation = generation.clone();
        let key = key.clone();
        self.with_index(move |store, index| {
            let key_bytes = entry_key(&generation, &key);
            let status = if store.contains_key(&key_bytes) {
                store.delete(&key_bytes)?;
                DeleteStatus::Deleted(1)
            } else {
                DeleteStatus::Missing
            };
            index.remove(store, &generation, &key)?;
            Ok(status)
        })
        .await
    }

    async fn open(&self, generation: &GenerationName) -> BackendResult<()> {
        let generation = generation.clone();
        self.with_index(move |store, index| index.open(store, &generation))
            .await
    }

    async fn generations(&self) -> BackendResult<Vec<GenerationName>> {
        let index = self
            .index
            .lock()
            .map_err(|_| BackendError::from(FeOxDbError::IndexPoisoned))?;
        Ok(index.names())
    }

    async fn drop_generation(&self, generation: &GenerationName) -> BackendResult<DeleteStatus> {
        let generation = generation.clone();
        let dropped = self
            .with_index(move |store, index| index.drop_generation(store, &generation))
            .await?;
        Ok(match dropped {
            Some(count) => DeleteStatus::Deleted(count),
            None => DeleteStatus::Missing,
        })
    }

    fn name(&self) -> &str {
        &self.label
    }

    fn value_format(&self) -> &dyn Format {
        &self.serializer
    }
}

impl<S> CacheStore for FeOxDbBackend<S> where S: Format + Send + Sync {}
