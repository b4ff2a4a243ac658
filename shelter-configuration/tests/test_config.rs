use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytesize::ByteSize;
use pretty_assertions::assert_eq;
use shelter::{CacheStatus, RequestDescriptor, Strategy};
use shelter_configuration::backend::{BackendConfig, FeOxDb, Moka};
use shelter_configuration::{Backend, ConfigError, ConfigShelter, ValueFormat, ValueSerialization};
use shelter_core::{NetworkError, ResponseDescriptor, Transport};

const FULL: &str = r#"
shelter:
  version: v3
  origin: https://site.example
  shell: ["/", "/offline"]
  offline_path: /offline
  filter:
    api_prefix: /api/
    excluded_prefixes: ["/_dev/"]
  offload:
    warn_after: 30s
policy:
  default: network_only
  rules:
    - prefix: /assets/
      strategy: cache_first
    - suffix: .woff2
      strategy: cache_first
backend:
  type: Moka
  max_bytes: 16 MiB
  label: pages
  value:
    format: Bincode
"#;

#[test]
fn full_document_deserializes() {
    let config = ConfigShelter::from_yaml(FULL).unwrap();

    assert_eq!(config.shelter.version, "v3");
    assert_eq!(config.shelter.origin, "https://site.example");
    assert_eq!(config.shelter.shell, vec!["/", "/offline"]);
    assert_eq!(config.shelter.filter.excluded_prefixes, vec!["/_dev/"]);
    assert_eq!(
        config.shelter.offload.warn_after,
        Some(Duration::from_secs(30))
    );
    assert_eq!(
        config.backend,
        Backend::Moka(BackendConfig {
            value: ValueFormat {
                format: ValueSerialization::Bincode,
            },
            backend: Moka {
                max_entries: None,
                max_bytes: Some(ByteSize::mib(16)),
                label: Some("pages".to_owned()),
            },
        })
    );

    let table = config.policy.unwrap().into_table().unwrap();
    assert_eq!(table.select("/assets/app.js"), Strategy::CacheFirst);
    assert_eq!(table.select("/fonts/inter.WOFF2"), Strategy::CacheFirst);
    assert_eq!(table.select("/recalls"), Strategy::NetworkOnly);
}

#[test]
fn empty_document_uses_defaults() {
    let config = ConfigShelter::from_yaml("{}").unwrap();
    assert_eq!(config, ConfigShelter::default());
    assert!(config.policy.is_none());
}

#[test]
fn feoxdb_backend_deserializes() {
    let yaml = r#"
type: FeOxDb
path: "/var/cache/shelter"
max_memory: 64 MiB
value:
  format: Json
"#;
    let backend: Backend = serde_saphyr::from_str(yaml).unwrap();
    assert_eq!(
        backend,
        Backend::FeOxDb(BackendConfig {
            value: ValueFormat {
                format: ValueSerialization::Json,
            },
            backend: FeOxDb {
                path: Some("/var/cache/shelter".to_owned()),
                max_file_size: None,
                max_memory: Some(ByteSize::mib(64)),
                label: None,
            },
        })
    );
}

#[test]
fn backend_roundtrips_through_yaml() {
    let backend = Backend::default();
    let yaml = serde_saphyr::to_string(&backend).unwrap();
    let parsed: Backend = serde_saphyr::from_str(&yaml).unwrap();
    assert_eq!(parsed, backend);
}

#[test]
fn malformed_document_is_a_parse_error() {
    let error = ConfigShelter::from_yaml("backend:\n  type: Floppy\n").unwrap_err();
    assert!(matches!(error, ConfigError::Parse(_)));
}

#[test]
fn moka_needs_exactly_one_capacity() {
    let yaml = r#"
type: Moka
max_entries: 10
max_bytes: 1 MiB
"#;
    let backend: Backend = serde_saphyr::from_str(yaml).unwrap();
    assert!(matches!(
        backend.into_backend(),
        Err(ConfigError::MokaCapacity)
    ));
}

#[cfg(not(feature = "feoxdb"))]
#[test]
fn disabled_backend_is_reported() {
    let backend: Backend = serde_saphyr::from_str("type: FeOxDb\n").unwrap();
    assert!(matches!(
        backend.into_backend(),
        Err(ConfigError::BackendNotAvailable("FeOxDb", "feoxdb"))
    ));
}

#[cfg(feature = "feoxdb")]
#[tokio::test]
async fn feoxdb_backend_opens() {
    use shelter_backend::Backend as _;

    let dir = tempfile::tempdir().unwrap();
    let backend = Backend::FeOxDb(BackendConfig {
        value: ValueFormat::default(),
        backend: FeOxDb {
            path: Some(dir.path().to_string_lossy().into_owned()),
            max_file_size: Some(ByteSize::mib(16)),
            max_memory: None,
            label: Some("disk".to_owned()),
        },
    })
    .into_backend()
    .unwrap();
    assert_eq!(backend.name(), "disk");
}

#[test]
fn invalid_origin_fails_to_build() {
    let config = ConfigShelter::from_yaml("shelter:\n  origin: not a url\n").unwrap();
    assert!(matches!(
        config.into_shelter(Counting::default()),
        Err(ConfigError::Build(_))
    ));
}

#[derive(Default, Clone)]
struct Counting {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Transport for Counting {
    async fn fetch(&self, request: RequestDescriptor) -> Result<ResponseDescriptor, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ResponseDescriptor::new(http::StatusCode::OK).with_body(request.path().to_owned()))
    }
}

#[tokio::test]
async fn configured_engine_serves_requests() {
    let transport = Counting::default();
    let calls = Arc::clone(&transport.calls);
    let shelter = ConfigShelter::from_yaml(FULL)
        .unwrap()
        .into_shelter(transport)
        .unwrap();

    let request = || RequestDescriptor::get("https://site.example/assets/app.js").unwrap();
    let (first, context) = shelter.serve(request()).await.unwrap();
    assert_eq!(first.body().as_ref(), b"/assets/app.js");
    assert_eq!(context.status, CacheStatus::Miss);

    let (second, context) = shelter.serve(request()).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(context.status, CacheStatus::Hit);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
