use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use shelter_core::{CacheKey, GenerationName, Raw, ResponseDescriptor, StoredResponse};
use tracing::debug;

use crate::{
    BackendError, DeleteStatus,
    format::{Format, FormatError, JsonFormat},
};

pub type BackendResult<T> = Result<T, BackendError>;

/// Raw, generation-partitioned key-value store.
///
/// Implementations must make a single [`write`](Backend::write) atomic per
/// key: a concurrent reader observes either the previous value or the new
/// one, never a mix. Last write wins.
#[async_trait]
pub trait Backend: Sync + Send {
    async fn read(&self, generation: &GenerationName, key: &CacheKey)
    -> BackendResult<Option<Raw>>;

    /// Stores `value` under `key`, opening `generation` if needed.
    async fn write(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
        value: Raw,
    ) -> BackendResult<()>;

    async fn remove(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> BackendResult<DeleteStatus>;

    /// Makes `generation` exist, even if it holds no entries yet.
    async fn open(&self, generation: &GenerationName) -> BackendResult<()>;

    /// Lists the names of every generation present in the store.
    async fn generations(&self) -> BackendResult<Vec<GenerationName>>;

    /// Deletes `generation` with all of its entries.
    async fn drop_generation(&self, generation: &GenerationName) -> BackendResult<DeleteStatus>;

    /// Returns the name of this backend, used in logs and metrics labels.
    fn name(&self) -> &str {
        "backend"
    }

    fn value_format(&self) -> &dyn Format {
        &JsonFormat
    }
}

#[async_trait]
impl Backend for &dyn Backend {
    async fn read(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> BackendResult<Option<Raw>> {
        (*self).read(generation, key).await
    }

    async fn write(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
        value: Raw,
    ) -> BackendResult<()> {
        (*self).write(generation, key, value).await
    }

    async fn remove(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> BackendResult<DeleteStatus> {
        (*self).remove(generation, key).await
    }

    async fn open(&self, generation: &GenerationName) -> BackendResult<()> {
        (*self).open(generation).await
    }

    async fn generations(&self) -> BackendResult<Vec<GenerationName>> {
        (*self).generations().await
    }

    async fn drop_generation(&self, generation: &GenerationName) -> BackendResult<DeleteStatus> {
        (*self).drop_generation(generation).await
    }

    fn name(&self) -> &str {
        (*self).name()
    }

    fn value_format(&self) -> &dyn Format {
        (*self).value_format()
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> BackendResult<Option<Raw>> {
        (**self).read(generation, key).await
    }

    async fn write(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
        value: Raw,
    ) -> BackendResult<()> {
        (**self).write(generation, key, value).await
    }

    async fn remove(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> BackendResult<DeleteStatus> {
        (**self).remove(generation, key).await
    }

    async fn open(&self, generation: &GenerationName) -> BackendResult<()> {
        (**self).open(generation).await
    }

    async fn generations(&self) -> BackendResult<Vec<GenerationName>> {
        (**self).generations().await
    }

    async fn drop_generation(&self, generation: &GenerationName) -> BackendResult<DeleteStatus> {
        (**self).drop_generation(generation).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend + Send + Sync + 'static> {
    async fn read(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> BackendResult<Option<Raw>> {
        (**self).read(generation, key).await
    }

    async fn write(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
        value: Raw,
    ) -> BackendResult<()> {
        (**self).write(generation, key, value).await
    }

    async fn remove(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> BackendResult<DeleteStatus> {
        (**self).remove(generation, key).await
    }

    async fn open(&self, generation: &GenerationName) -> BackendResult<()> {
        (**self).open(generation).await
    }

    async fn generations(&self) -> BackendResult<Vec<GenerationName>> {
        (**self).generations().await
    }

    async fn drop_generation(&self, generation: &GenerationName) -> BackendResult<DeleteStatus> {
        (**self).drop_generation(generation).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }
}

/// Outcome of [`CacheStore::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The entry was fully replaced.
    Written,
    /// The response is not cacheable and the store was left untouched.
    Skipped,
}

/// High-level cache store with typed operations.
///
/// This trait layers response semantics on top of [`Backend`]: values are
/// encoded with the backend's [`Format`], only `2xx` responses are ever
/// written, and entries that fail to decode surface as
/// [`BackendError::FormatError`] instead of being served.
pub trait CacheStore: Backend {
    fn get(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> impl Future<Output = BackendResult<Option<ResponseDescriptor>>> + Send {
        async move {
            let Some(raw) = self.read(generation, key).await? else {
                return Ok(None);
            };
            let stored = self.value_format().deserialize(&raw)?;
            let response = ResponseDescriptor::try_from(stored)
                .map_err(|err| FormatError::Deserialize(Box::new(err)))?;
            Ok(Some(response))
        }
    }

    fn put(
        &self,
        generation: &GenerationName,
        key: &CacheKey,
        response: &ResponseDescriptor,
    ) -> impl Future<Output = BackendResult<WriteStatus>> + Send {
        async move {
            let Some(stored) = StoredResponse::capture(response) else {
                debug!(
                    backend = self.name(),
                    %key,
                    status = response.status().as_u16(),
                    "response not cacheable, write skipped"
                );
                return Ok(WriteStatus::Skipped);
            };
            let raw = self.value_format().serialize(&stored)?;
            self.write(generation, key, raw).await?;
            Ok(WriteStatus::Written)
        }
    }

    /// Looks `key` up in each of `generations` in order and returns the
    /// first hit together with the generation that held it.
    ///
    /// A generation whose read fails is skipped and the search goes on.
    /// The last such error is returned only when no generation had a hit.
    fn match_any(
        &self,
        generations: &[&GenerationName],
        key: &CacheKey,
    ) -> impl Future<Output = BackendResult<Option<(GenerationName, ResponseDescriptor)>>> + Send
    {
        async move {
            let mut failure = None;
            for generation in generations {
                match self.get(generation, key).await {
                    Ok(Some(response)) => return Ok(Some(((*generation).clone(), response))),
                    Ok(None) => {}
                    Err(error) => {
                        debug!(
                            backend = self.name(),
                            %generation,
                            %key,
                            %error,
                            "generation read failed, trying the next one"
                        );
                        failure = Some(error);
                    }
                }
            }
            match failure {
                Some(error) => Err(error),
                None => Ok(None),
            }
        }
    }
}

impl CacheStore for &dyn Backend {}

impl CacheStore for Box<dyn Backend> {}

impl CacheStore for Arc<dyn Backend + Send + Sync + 'static> {}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;
    use http::StatusCode;

    #[derive(Default)]
    struct MapBackend {
        entries: DashMap<(GenerationName, CacheKey), Raw>,
    }

    #[async_trait]
    impl Backend for MapBackend {
        async fn read(
            &self,
            generation: &GenerationName,
            key: &CacheKey,
        ) -> BackendResult<Option<Raw>> {
            Ok(self
                .entries
                .get(&(generation.clone(), key.clone()))
                .map(|value| value.clone()))
        }

        async fn write(
            &self,
            generation: &GenerationName,
            key: &CacheKey,
            value: Raw,
        ) -> BackendResult<()> {
            self.entries.insert((generation.clone(), key.clone()), value);
            Ok(())
        }

        async fn remove(
            &self,
            generation: &GenerationName,
            key: &CacheKey,
        ) -> BackendResult<DeleteStatus> {
            Ok(match self.entries.remove(&(generation.clone(), key.clone())) {
                Some(_) => DeleteStatus::Deleted(1),
                None => DeleteStatus::Missing,
            })
        }

        async fn open(&self, _generation: &GenerationName) -> BackendResult<()> {
            Ok(())
        }

        async fn generations(&self) -> BackendResult<Vec<GenerationName>> {
            let mut names: Vec<_> = self.entries.iter().map(|e| e.key().0.clone()).collect();
            names.sort();
            names.dedup();
            Ok(names)
        }

        async fn drop_generation(
            &self,
            generation: &GenerationName,
        ) -> BackendResult<DeleteStatus> {
            let before = self.entries.len();
            self.entries.retain(|(name, _), _| name != generation);
            Ok(DeleteStatus::Deleted((before - self.entries.len()) as u32))
        }
    }

    impl CacheStore for MapBackend {}

    fn key() -> CacheKey {
        CacheKey::new("GET", "https://site.example/recalls")
    }

    fn page(status: StatusCode, body: &'static str) -> ResponseDescriptor {
        ResponseDescriptor::new(status)
            .with_content_type("text/html")
            .with_body(body)
    }

    #[tokio::test]
    async fn success_write_reads_back_identical() {
        let store = MapBackend::default();
        let generation = GenerationName::from("pages-v1");
        let response = page(StatusCode::OK, "<h1>recalls</h1>");

        let status = store.put(&generation, &key(), &response).await.unwrap();
        assert_eq!(status, WriteStatus::Written);

        let cached = store.get(&generation, &key()).await.unwrap().unwrap();
        assert_eq!(cached.body(), response.body());
        assert_eq!(cached, response);
    }

    #[tokio::test]
    async fn error_write_keeps_previous_entry() {
        let store = MapBackend::default();
        let generation = GenerationName::from("pages-v1");
        store
            .put(&generation, &key(), &page(StatusCode::OK, "good"))
            .await
            .unwrap();

        let status = store
            .put(&generation, &key(), &page(StatusCode::INTERNAL_SERVER_ERROR, "bad"))
            .await
            .unwrap();
        assert_eq!(status, WriteStatus::Skipped);

        let cached = store.get(&generation, &key()).await.unwrap().unwrap();
        assert_eq!(cached.body().as_ref(), b"good");
    }

    #[tokio::test]
    async fn redirect_on_empty_store_writes_nothing() {
        let store = MapBackend::default();
        let generation = GenerationName::from("pages-v1");
        store
            .put(&generation, &key(), &page(StatusCode::FOUND, ""))
            .await
            .unwrap();
        assert!(store.get(&generation, &key()).await.unwrap().is_none());
        assert!(store.generations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_format_error() {
        let store = MapBackend::default();
        let generation = GenerationName::from("pages-v1");
        store
            .write(&generation, &key(), Raw::from_static(b"{not json"))
            .await
            .unwrap();
        assert!(matches!(
            store.get(&generation, &key()).await,
            Err(BackendError::FormatError(_))
        ));
    }

    #[tokio::test]
    async fn match_any_respects_generation_order() {
        let store = MapBackend::default();
        let stat = GenerationName::from("static-v1");
        let pages = GenerationName::from("pages-v1");
        store
            .put(&pages, &key(), &page(StatusCode::OK, "pages"))
            .await
            .unwrap();

        let (generation, response) = store
            .match_any(&[&stat, &pages], &key())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(generation, pages);
        assert_eq!(response.body().as_ref(), b"pages");

        store
            .put(&stat, &key(), &page(StatusCode::OK, "static"))
            .await
            .unwrap();
        let (generation, _) = store
            .match_any(&[&stat, &pages], &key())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(generation, stat);

        let other = GenerationName::from("pages-v0");
        assert!(store.match_any(&[&other], &key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn match_any_skips_unreadable_generation() {
        let store = MapBackend::default();
        let pages = GenerationName::from("pages-v1");
        let stat = GenerationName::from("static-v1");
        store
            .write(&pages, &key(), Raw::from_static(b"{garbage"))
            .await
            .unwrap();
        store
            .put(&stat, &key(), &page(StatusCode::OK, "static"))
            .await
            .unwrap();

        let (generation, response) = store
            .match_any(&[&pages, &stat], &key())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(generation, stat);
        assert_eq!(response.body().as_ref(), b"static");

        let empty = GenerationName::from("static-v0");
        assert!(matches!(
            store.match_any(&[&pages, &empty], &key()).await,
            Err(BackendError::FormatError(_))
        ));
    }

    #[tokio::test]
    async fn boxed_backend_is_a_store() {
        let store: Box<dyn Backend> = Box::new(MapBackend::default());
        let generation = GenerationName::from("static-v1");
        store
            .put(&generation, &key(), &page(StatusCode::OK, "boxed"))
            .await
            .unwrap();
        assert!(store.get(&generation, &key()).await.unwrap().is_some());
    }
}
