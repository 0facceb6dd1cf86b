//! The `.cod` package-info artifact.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{RepoError, Result};

/// Capability metadata published for one package: what it needs and what
/// it provides.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PkgInfo {
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub provides: Vec<String>,
}

impl PkgInfo {
    /// Read the artifact at `path`.
    ///
    /// # Errors
    /// Fails on unreadable files or malformed JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|source| RepoError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the artifact to `path`.
    ///
    /// # Errors
    /// Fails when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string(self).map_err(|source| RepoError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
