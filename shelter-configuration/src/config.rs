use serde::{Deserialize, Serialize};
use shelter::{Shelter, ShelterConfig, Transport};

use crate::backend::{Backend, DynBackend};
use crate::error::ConfigError;
use crate::policy::ConfigPolicy;

/// Complete configuration document.
///
/// Every section is optional. A missing `policy` section selects the
/// built-in policy table; a missing `backend` section selects a Moka store
/// holding 10 000 entries per generation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfigShelter {
    /// Engine settings.
    #[serde(default)]
    pub shelter: ShelterConfig,
    /// Policy table; the built-in table when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<ConfigPolicy>,
    /// Store.
    #[serde(default)]
    pub backend: Backend,
}

impl ConfigShelter {
    /// Parses a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml).map_err(|error| ConfigError::Parse(error.into()))
    }

    /// Builds an engine fetching through `transport`.
    pub fn into_shelter<T>(self, transport: T) -> Result<Shelter<DynBackend, T>, ConfigError>
    where
        T: Transport + 'static,
    {
        let mut builder = Shelter::builder()
            .store(self.backend.into_backend()?)
            .transport(transport)
            .config(self.shelter);
        if let Some(policy) = self.policy {
            builder = builder.policy(policy.into_table()?);
        }
        Ok(builder.build()?)
    }
}
