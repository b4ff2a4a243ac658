//! Store configuration.

use std::sync::Arc;

use bytesize::ByteSize;
use serde::{Deserialize, Serialize};
use shelter_backend::Backend as BackendTrait;
use shelter_backend::format::{BincodeFormat, Format, JsonFormat};

use crate::error::ConfigError;

/// Type-erased store produced by [`Backend::into_backend`].
pub type DynBackend = Arc<dyn BackendTrait + Send + Sync + 'static>;

/// Store type and its settings, selected by the `type` key.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Backend {
    /// In-memory Moka store.
    Moka(BackendConfig<Moka>),
    /// Persistent FeOxDB store.
    FeOxDb(BackendConfig<FeOxDb>),
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Moka(BackendConfig {
            value: ValueFormat::default(),
            backend: Moka {
                max_entries: Some(10_000),
                max_bytes: None,
                label: None,
            },
        })
    }
}

impl Backend {
    /// Opens the configured store.
    pub fn into_backend(self) -> Result<DynBackend, ConfigError> {
        match self {
            #[cfg(feature = "moka")]
            Backend::Moka(config) => {
                use shelter_moka::MokaBackend;

                let serializer = config.value.format.to_format();
                let Moka {
                    max_entries,
                    max_bytes,
                    label,
                } = config.backend;
                let builder = MokaBackend::builder();

                match (max_entries, max_bytes) {
                    (Some(entries), None) => {
                        let mut builder = builder.max_entries(entries).value_format(serializer);
                        if let Some(label) = label {
                            builder = builder.label(label);
                        }
                        Ok(Arc::new(builder.build()))
                    }
                    (None, Some(bytes)) => {
                        let mut builder = builder
                            .max_bytes(bytes.as_u64())
                            .value_format(serializer);
                        if let Some(label) = label {
                            builder = builder.label(label);
                        }
                        Ok(Arc::new(builder.build()))
                    }
                    _ => Err(ConfigError::MokaCapacity),
                }
            }
            #[cfg(not(feature = "moka"))]
            Backend::Moka(_) => Err(ConfigError::BackendNotAvailable("Moka", "moka")),
            #[cfg(feature = "feoxdb")]
            Backend::FeOxDb(config) => {
                use shelter_feoxdb::FeOxDbBackend;

                let serializer = config.value.format.to_format();
                let FeOxDb {
                    path,
                    max_file_size,
                    max_memory,
                    label,
                } = config.backend;
                let mut builder = FeOxDbBackend::builder().value_format(serializer);

                if let Some(path) = path {
                    builder = builder.path(path);
                }
                if let Some(size) = max_file_size {
                    builder = builder.max_file_size(size.as_u64());
                }
                if let Some(memory) = max_memory {
                    builder = builder.max_memory(memory.as_u64() as usize);
                }
                if let Some(label) = label {
                    builder = builder.label(label);
                }

                let backend = builder.build().map_err(|source| ConfigError::Backend {
                    backend: "FeOxDb",
                    source: source.into(),
                })?;
                Ok(Arc::new(backend))
            }
            #[cfg(not(feature = "feoxdb"))]
            Backend::FeOxDb(_) => Err(ConfigError::BackendNotAvailable("FeOxDb", "feoxdb")),
        }
    }
}

/// Settings shared by every store type plus the type-specific ones.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct BackendConfig<T> {
    /// Value encoding.
    #[serde(default)]
    pub value: ValueFormat,
    /// Type-specific settings.
    #[serde(flatten)]
    pub backend: T,
}

/// Value encoding settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct ValueFormat {
    /// Serialization format of stored responses.
    pub format: ValueSerialization,
}

/// Serialization format of stored responses.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub enum ValueSerialization {
    /// Human-readable JSON.
    #[default]
    Json,
    /// Compact binary encoding.
    Bincode,
}

impl ValueSerialization {
    /// Returns the matching format implementation.
    pub fn to_format(&self) -> Box<dyn Format> {
        match self {
            ValueSerialization::Json => Box::new(JsonFormat),
            ValueSerialization::Bincode => Box::new(BincodeFormat),
        }
    }
}

/// Moka settings. Exactly one capacity bound must be set.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Moka {
    /// Maximum entries per generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<u64>,
    /// Maximum approximate size per generation, e.g. `64 MiB`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<ByteSize>,
    /// Label used in logs and metrics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// FeOxDB settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FeOxDb {
    /// Database file or directory; memory-only when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Pre-allocated file size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<ByteSize>,
    /// RAM limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_memory: Option<ByteSize>,
    /// Label used in logs and metrics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}
