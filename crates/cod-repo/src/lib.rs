//! Package repositories.
//!
//! A repository hands out package ids, their capability metadata and their
//! on-disk source trees. The two built-in kinds both work off `.cod`
//! artifact files: [`LocalRepo`] over any directory of packages, and
//! [`ProjectLocalRepo`] over the project itself, materializing missing
//! artifacts on demand by re-running the `package` command.

mod info;
mod local;
mod project_local;
mod registry;

pub use info::PkgInfo;
pub use local::LocalRepo;
pub use project_local::ProjectLocalRepo;
pub use registry::open_repo;

use std::path::PathBuf;

use thiserror::Error;

/// Repository errors.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("unknown repository type {0:?}")]
    UnknownType(String),
    #[error("repository {name}: missing {key:?} option")]
    MissingOption { name: String, key: String },
    #[error("package {0} not found in repository")]
    UnknownPackage(String),
    #[error("package {0} not found in project-local repository")]
    NoCandidate(String),
    #[error("multiple directories provide package {0} in project-local repository")]
    MultipleCandidates(String),
    #[error("packaging {id} exited with {status}")]
    Materialize { id: String, status: String },
    #[error("invalid package info {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Pkg(#[from] cod_pkg::PkgError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RepoError>;

/// The repository plugin contract.
pub trait Repo {
    /// Every package id this repository can provide.
    fn ids(&self) -> Vec<String>;

    /// Make the package's content available locally.
    ///
    /// # Errors
    /// Fails when the package cannot be retrieved.
    fn fetch(&self, id: &str) -> Result<()>;

    /// The package's capability metadata.
    ///
    /// # Errors
    /// Fails when the package is unknown or its metadata is unreadable.
    fn info(&self, id: &str) -> Result<PkgInfo>;

    /// The package's source tree on disk.
    ///
    /// # Errors
    /// Fails when the package is unknown.
    fn path(&self, id: &str) -> Result<PathBuf>;
}
