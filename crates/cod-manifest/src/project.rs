//! Project manifest (`cod.toml` at the project root).

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::Result;
use crate::flags::ArchFlags;

/// A `[repo.<name>]` table. The `type` key selects the plugin; everything
/// else is passed through for the plugin to interpret.
#[derive(Clone, Debug, Deserialize)]
pub struct RepoSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub options: toml::Table,
}

impl RepoSpec {
    /// A string-valued plugin option.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(toml::Value::as_str)
    }
}

/// The `[project]` table. Presence is what matters; it marks the root.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProjectSection {}

/// A whole project manifest.
#[derive(Clone, Debug, Deserialize)]
pub struct ProjectManifest {
    pub project: ProjectSection,
    #[serde(default)]
    pub build: ArchFlags,
    #[serde(default)]
    pub repo: BTreeMap<String, RepoSpec>,
}

impl ProjectManifest {
    /// Load the manifest at `path`.
    ///
    /// # Errors
    /// Fails on unreadable files or schema violations.
    pub fn load(path: &Path) -> Result<Self> {
        crate::load(path)
    }
}
