use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use shelter_backend::{Backend, BackendError, BackendResult, CacheStore, DeleteStatus};
use shelter_core::{CacheKey, GenerationName, Raw};

#[derive(Debug, Default)]
pub struct BackendCounters {
    pub read_count: AtomicUsize,
    pub read_hit_count: AtomicUsize,
    pub read_miss_count: AtomicUsize,
    pub write_count: AtomicUsize,
    pub remove_count: AtomicUsize,
    pub drop_count: AtomicUsize,
}

impl BackendCounters {
    pub fn read_count(&self) -> usize {
        self.read_count.load(Ordering::SeqCst)
    }

    pub fn read_hit_count(&self) -> usize {
        self.read_hit_count.load(Ordering::SeqCst)
    }

    pub fn read_miss_count(&self) -> usize {
        self.read_miss_count.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    pub fn remove_count(&self) -> usize {
        self.remove_count.load(Ordering::SeqCst)
    }

    pub fn drop_count(&self) -> usize {
        self.drop_count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.read_count.store(0, Ordering::SeqCst);
        self.read_hit_count.store(0, Ordering::SeqCst);
        self.read_miss_count.store(0, Ordering::SeqCst);
        self.write_count.store(0, Ordering::SeqCst);
        self.remove_count.store(0, Ordering::SeqCst);
        self.drop_count.store(0, Ordering::SeqCst);
    }
}

/// Switches that make individual operations fail.
#[derive(Debug, Default)]
pub struct Failures {
    pub reads: AtomicBool,
    pub writes: AtomicBool,
    pub drops: AtomicBool,
}

#[derive(Clone, Debug)]
pub struct MockBackend {
    pub generations: Arc<DashMap<GenerationName, DashMap<CacheKey, Raw>>>,
    pub counters: Arc<BackendCounters>,
    pub failures: Arc<Failures>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            generations: Arc::new(DashMap::new()),
            counters: Arc::new(BackendCounters::default()),
            failures: Arc::new(Failures::default()),
        }
    }

    /// Store pre-populated with empty generations named `names`.
    pub fn with_generations<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let backend = Self::new();
        for name in names {
            backend
                .generations
                .insert(GenerationName::from(name), DashMap::new());
        }
        backend
    }

    pub fn read_count(&self) -> usize {
        self.counters.read_count()
    }

    pub fn write_count(&self) -> usize {
        self.counters.write_count()
    }

    pub fn reset_counters(&self) {
        self.counters.reset();
    }

    pub fn fail_reads(&self, fail: bool) {
        self.failures.reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.failures.writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_drops(&self, fail: bool) {
        self.failures.drops.store(fail, Ordering::SeqCst);
    }

    /// Generation names, sorted.
    pub fn generation_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .generations
            .iter()
            .map(|entry| entry.key().to_string())
            .collect();
        names.sort();
        names
    }

    /// Number of entries in `generation`, zero if it does not exist.
    pub fn entry_count(&self, generation: &str) -> usize {
        self.generations
            .get(&GenerationName::from(generation))
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    fn injected(operation: &str) -> BackendError {
        BackendError::InternalError(format!("injected {operation} failure").into())
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn read(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> BackendResult<Option<Raw>> {
        self.counters.read_count.fetch_add(1, Ordering::SeqCst);
        if self.failures.reads.load(Ordering::SeqCst) {
            return Err(Self::injected("read"));
        }
        let result = self
            .generations
            .get(generation)
            .and_then(|entries| entries.get(key).map(|value| value.value().clone()));
        if result.is_some() {
            self.counters.read_hit_count.fetch_add(1, Ordering::SeqCst);
        } else {
            self.counters.read_miss_count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(result)
    }

    async fn write(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
        value: Raw,
    ) -> BackendResult<()> {
        self.counters.write_count.fetch_add(1, Ordering::SeqCst);
        if self.failures.writes.load(Ordering::SeqCst) {
            return Err(Self::injected("write"));
        }
        self.generations
            .entry(generation.clone())
            .or_default()
            .insert(key.clone(), value);
        Ok(())
    }

    async fn remove(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> BackendResult<DeleteStatus> {
        self.counters.remove_count.fetch_add(1, Ordering::SeqCst);
        let removed = self
            .generations
            .get(generation)
            .and_then(|entries| entries.remove(key));
        match removed {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn open(&self, generation: &GenerationName) -> BackendResult<()> {
        self.generations.entry(generation.clone()).or_default();
        Ok(())
    }

    async fn generations(&self) -> BackendResult<Vec<GenerationName>> {
        let mut names: Vec<GenerationName> = self
            .generations
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn drop_generation(&self, generation: &GenerationName) -> BackendResult<DeleteStatus> {
        self.counters.drop_count.fetch_add(1, Ordering::SeqCst);
        if self.failures.drops.load(Ordering::SeqCst) {
            return Err(Self::injected("drop"));
        }
        match self.generations.remove(generation) {
            Some((_, entries)) => Ok(DeleteStatus::Deleted(entries.len() as u32)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

impl CacheStore for MockBackend {}
