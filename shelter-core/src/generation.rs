//! Versioned cache generations.
//!
//! The store is partitioned into named generations. A generation name has
//! the form `<kind>-<version>` where `kind` is one of [`GenerationKind`]:
//!
//! ```
//! use shelter_core::{GenerationKind, GenerationName, Generations};
//!
//! let generations = Generations::new("v2");
//! assert_eq!(generations.static_assets().as_str(), "static-v2");
//! assert_eq!(generations.pages().as_str(), "pages-v2");
//!
//! let old = GenerationName::from("pages-v1");
//! assert_eq!(old.kind(), Some(GenerationKind::Pages));
//! assert!(!generations.is_current(&old));
//! ```
//!
//! Exactly one generation per kind is current for a given version; every
//! other name found in the store is superseded and gets pruned on the next
//! activation.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

/// Kind of content a generation holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    /// Static assets (scripts, stylesheets, fonts, images).
    Static,
    /// Pages and general-purpose responses.
    Pages,
}

impl GenerationKind {
    /// All kinds, in the order generations are opened.
    pub const ALL: [GenerationKind; 2] = [GenerationKind::Static, GenerationKind::Pages];

    /// Name prefix used in the persisted layout.
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationKind::Static => "static",
            GenerationKind::Pages => "pages",
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of a cache generation.
///
/// Any string can be a generation name, because the store may contain
/// names written by older or foreign builds. Names produced by
/// [`GenerationName::new`] follow the `<kind>-<version>` layout and can be
/// decomposed with [`kind`](Self::kind) and [`version`](Self::version).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationName(SmolStr);

impl GenerationName {
    /// Builds the canonical name for `kind` at `version`.
    pub fn new(kind: GenerationKind, version: &str) -> Self {
        Self(format_smolstr!("{}-{}", kind.as_str(), version))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the kind encoded in the name, if it follows the layout.
    pub fn kind(&self) -> Option<GenerationKind> {
        let (kind, version) = self.0.split_once('-')?;
        if version.is_empty() {
            return None;
        }
        GenerationKind::ALL.into_iter().find(|k| k.as_str() == kind)
    }

    /// Returns the version encoded in the name, if it follows the layout.
    pub fn version(&self) -> Option<&str> {
        self.kind()?;
        self.0.split_once('-').map(|(_, version)| version)
    }
}

impl From<&str> for GenerationName {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

impl From<String> for GenerationName {
    fn from(value: String) -> Self {
        Self(SmolStr::from(value))
    }
}

impl AsRef<str> for GenerationName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for GenerationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of current generations for one build version.
///
/// The version is a build-time constant bumped whenever cached semantics
/// change; bumping it is the only thing that causes old generations to be
/// pruned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generations {
    version: SmolStr,
    static_assets: GenerationName,
    pages: GenerationName,
}

impl Generations {
    /// Creates the generation set for `version`.
    pub fn new(version: impl Into<SmolStr>) -> Self {
        let version = version.into();
        Self {
            static_assets: GenerationName::new(GenerationKind::Static, &version),
            pages: GenerationName::new(GenerationKind::Pages, &version),
            version,
        }
    }

    /// Returns the build version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Current generation for static assets.
    pub fn static_assets(&self) -> &GenerationName {
        &self.static_assets
    }

    /// Current generation for pages and general-purpose responses.
    pub fn pages(&self) -> &GenerationName {
        &self.pages
    }

    /// Current generation of the given kind.
    pub fn for_kind(&self, kind: GenerationKind) -> &GenerationName {
        match kind {
            GenerationKind::Static => &self.static_assets,
            GenerationKind::Pages => &self.pages,
        }
    }

    /// All current generation names.
    pub fn current(&self) -> [&GenerationName; 2] {
        [&self.static_assets, &self.pages]
    }

    /// Returns `true` if `name` is one of the current generations.
    pub fn is_current(&self, name: &GenerationName) -> bool {
        self.current().contains(&name)
    }
}
