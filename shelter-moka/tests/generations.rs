//! Generation partitioning of the Moka store.

use bytes::Bytes;
use http::StatusCode;
use shelter_backend::{Backend, CacheStore, DeleteStatus, WriteStatus, format::BincodeFormat};
use shelter_core::{CacheKey, GenerationName, ResponseDescriptor};
use shelter_moka::MokaBackend;

fn key(path: &str) -> CacheKey {
    CacheKey::new("GET", format!("https://site.example{path}"))
}

#[tokio::test]
async fn generations_are_isolated() {
    let backend = MokaBackend::builder().max_entries(100).build();
    let v1 = GenerationName::from("pages-v1");
    let v2 = GenerationName::from("pages-v2");

    backend
        .write(&v1, &key("/recalls"), Bytes::from_static(b"old"))
        .await
        .unwrap();

    assert!(backend.read(&v2, &key("/recalls")).await.unwrap().is_none());
    assert_eq!(
        backend.read(&v1, &key("/recalls")).await.unwrap(),
        Some(Bytes::from_static(b"old"))
    );
}

#[tokio::test]
async fn open_creates_empty_generation() {
    let backend = MokaBackend::builder().max_entries(100).build();
    backend.open(&GenerationName::from("static-v3")).await.unwrap();
    backend.open(&GenerationName::from("pages-v3")).await.unwrap();
    backend.open(&GenerationName::from("pages-v3")).await.unwrap();

    assert_eq!(
        backend.generations().await.unwrap(),
        vec![
            GenerationName::from("pages-v3"),
            GenerationName::from("static-v3")
        ]
    );
}

#[tokio::test]
async fn drop_generation_removes_its_entries() {
    let backend = MokaBackend::builder().max_entries(100).build();
    let old = GenerationName::from("static-v1");
    let current = GenerationName::from("static-v2");
    for generation in [&old, &current] {
        backend
            .write(generation, &key("/assets/app.js"), Bytes::from_static(b"js"))
            .await
            .unwrap();
    }
    backend.generation_cache(&old).unwrap().run_pending_tasks().await;

    assert_eq!(
        backend.drop_generation(&old).await.unwrap(),
        DeleteStatus::Deleted(1)
    );
    assert_eq!(
        backend.drop_generation(&old).await.unwrap(),
        DeleteStatus::Missing
    );
    assert!(backend.read(&old, &key("/assets/app.js")).await.unwrap().is_none());
    assert!(backend.read(&current, &key("/assets/app.js")).await.unwrap().is_some());
    assert_eq!(backend.generations().await.unwrap(), vec![current]);
}

#[tokio::test]
async fn clones_share_generations() {
    let backend = MokaBackend::builder().max_entries(100).build();
    let clone = backend.clone();
    let generation = GenerationName::from("pages-v1");
    clone
        .write(&generation, &key("/"), Bytes::from_static(b"home"))
        .await
        .unwrap();
    assert!(backend.read(&generation, &key("/")).await.unwrap().is_some());
}

#[tokio::test]
async fn typed_store_with_bincode() {
    let backend = MokaBackend::builder()
        .max_bytes(1024 * 1024)
        .value_format(BincodeFormat)
        .build();
    let generation = GenerationName::from("pages-v1");
    let page = ResponseDescriptor::new(StatusCode::OK)
        .with_content_type("text/html; charset=utf-8")
        .with_body("<h1>dashboard</h1>");

    assert_eq!(
        backend.put(&generation, &key("/dashboard"), &page).await.unwrap(),
        WriteStatus::Written
    );
    assert_eq!(
        backend.get(&generation, &key("/dashboard")).await.unwrap(),
        Some(page)
    );
}

#[tokio::test]
async fn remove_missing_generation_is_missing() {
    let backend = MokaBackend::builder().max_entries(10).build();
    assert_eq!(
        backend
            .remove(&GenerationName::from("pages-v9"), &key("/"))
            .await
            .unwrap(),
        DeleteStatus::Missing
    );
}
