//! Package data model.
//!
//! A package is a directory of C sources and headers described by a
//! `cod.toml` manifest. A [`Profile`] pins a package to a profile name and
//! an architecture, from which everything buildable derives: object lists,
//! executable units, include dependencies and ninja build fragments.

mod cap;
mod emit;
mod evr;
mod id;
mod package;
mod profile;

pub use cap::{CapOp, Capability};
pub use evr::Evr;
pub use id::PackageId;
pub use package::Package;
pub use profile::{Profile, check_arch};

use std::path::PathBuf;

use thiserror::Error;

/// Package model errors.
#[derive(Error, Debug)]
pub enum PkgError {
    #[error(transparent)]
    Manifest(#[from] cod_manifest::ManifestError),
    #[error(transparent)]
    Dep(#[from] cod_dep::DepError),
    #[error("malformed package id {0:?}")]
    BadPackageId(String),
    #[error("malformed version {0:?}")]
    BadEvr(String),
    #[error("build arch mismatch: top {top} cannot use package arch {pkg}")]
    ArchMismatch { top: String, pkg: String },
    #[error("package {id} header list conflict: expected {expected:?}, got {actual:?}")]
    HeaderMismatch {
        id: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("source file {0} not supported")]
    UnsupportedSource(PathBuf),
    #[error("cross-arch object lift only targets x86_64, not {0}")]
    BadLiftTarget(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PkgError>;
