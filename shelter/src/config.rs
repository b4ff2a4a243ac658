//! Engine configuration.
//!
//! [`ShelterConfig`] carries everything the engine needs besides its
//! collaborators (store, transport, offload): the build version that names
//! the current generations, the process origin, the shell resources
//! pre-warmed at install and the request filter settings.
//!
//! All fields have defaults, so a configuration file only needs to name
//! what it changes:
//!
//! ```
//! use shelter::config::ShelterConfig;
//!
//! let config: ShelterConfig = serde_json::from_str(
//!     r#"{ "version": "v42", "origin": "https://site.example" }"#,
//! ).unwrap();
//! assert_eq!(config.offline_path, "/offline");
//! assert_eq!(config.filter.api_prefix, "/api/");
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Shell resources pre-warmed at install when none are configured.
pub const DEFAULT_SHELL: &[&str] = &["/", "/dashboard", "/recalls", "/offline"];

/// Path of the offline page when none is configured.
pub const DEFAULT_OFFLINE_PATH: &str = "/offline";

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelterConfig {
    /// Build version naming the current generations. Bumping it is the
    /// only thing that prunes old generations.
    #[serde(default = "default_version")]
    pub version: SmolStr,
    /// Origin of the application, e.g. `https://site.example`.
    #[serde(default = "default_origin")]
    pub origin: String,
    /// Paths fetched and stored at install.
    #[serde(default = "default_shell")]
    pub shell: Vec<String>,
    /// Path of the offline page served to HTML navigations as last resort.
    #[serde(default = "default_offline_path")]
    pub offline_path: String,
    /// Request filter settings.
    #[serde(default)]
    pub filter: FilterConfig,
    /// Background task settings.
    #[serde(default)]
    pub offload: OffloadSettings,
}

fn default_version() -> SmolStr {
    SmolStr::new_static("v1")
}

fn default_origin() -> String {
    "http://localhost".to_owned()
}

fn default_shell() -> Vec<String> {
    DEFAULT_SHELL.iter().map(|path| (*path).to_owned()).collect()
}

fn default_offline_path() -> String {
    DEFAULT_OFFLINE_PATH.to_owned()
}

impl Default for ShelterConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            origin: default_origin(),
            shell: default_shell(),
            offline_path: default_offline_path(),
            filter: FilterConfig::default(),
            offload: OffloadSettings::default(),
        }
    }
}

impl ShelterConfig {
    /// Creates a configuration for `origin` at `version` with defaults for
    /// everything else.
    pub fn new(origin: impl Into<String>, version: impl Into<SmolStr>) -> Self {
        Self {
            version: version.into(),
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Replaces the shell resource list.
    pub fn with_shell<I, P>(self, shell: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            shell: shell.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    /// Replaces the offline page path.
    pub fn with_offline_path(self, path: impl Into<String>) -> Self {
        Self {
            offline_path: path.into(),
            ..self
        }
    }
}

/// Settings of the [`RequestFilter`](crate::filter::RequestFilter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Prefix of the API namespace, which always bypasses the engine.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: SmolStr,
    /// Development and internal prefixes that bypass the engine.
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<SmolStr>,
}

fn default_api_prefix() -> SmolStr {
    SmolStr::new_static("/api/")
}

fn default_excluded_prefixes() -> Vec<SmolStr> {
    vec![
        SmolStr::new_static("/_next/webpack-hmr"),
        SmolStr::new_static("/__nextjs_original-stack-frame"),
        SmolStr::new_static("/__dev/"),
    ]
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            api_prefix: default_api_prefix(),
            excluded_prefixes: default_excluded_prefixes(),
        }
    }
}

/// Background task settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffloadSettings {
    /// Log a warning when a background revalidation runs longer than this
    /// (e.g. "10s"). The task is never cancelled.
    #[serde(default, with = "humantime_serde")]
    pub warn_after: Option<Duration>,
}
