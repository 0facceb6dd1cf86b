use std::path::PathBuf;

use thiserror::Error;

/// Driver errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Manifest(#[from] cod_manifest::ManifestError),
    #[error(transparent)]
    Pkg(#[from] cod_pkg::PkgError),
    #[error(transparent)]
    Dep(#[from] cod_dep::DepError),
    #[error(transparent)]
    Repo(#[from] cod_repo::RepoError),
    #[error(transparent)]
    Solve(#[from] cod_solve::SolveError),
    #[error(transparent)]
    Ar(#[from] cod_ar::ArError),
    #[error(transparent)]
    Elf(#[from] cod_elf::ElfError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("no project manifest above {0}")]
    NotInProject(PathBuf),
    #[error("arch {arch} not declared by package {package}")]
    UnsupportedArch { arch: String, package: String },
    #[error("build executor exited with {0}")]
    Build(String),
    #[error("unresolved symbols, no package provides: {}", .0.join(", "))]
    UnresolvedSymbols(Vec<String>),
    #[error("{0} is not a thin archive member")]
    NotAThinMember(String),
}

pub type Result<T> = std::result::Result<T, Error>;
