//! `cod.toml` manifest models.
//!
//! A package manifest describes one package (name, version, declared
//! architectures, build/export flags, per-profile overrides); a project
//! manifest sits at the project root and declares repositories. Both share
//! the [`BuildFlags`] record and its arch-indexed wrapper.

mod flags;
mod package;
mod project;

pub use flags::{ArchFlags, BuildFlags, write_compiler_variables};
pub use package::{PackageManifest, PackageSection, ProfileSection};
pub use project::{ProjectManifest, RepoSpec};

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Manifest loading errors.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },
}

pub type Result<T> = std::result::Result<T, ManifestError>;

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}
