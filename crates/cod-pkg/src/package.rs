//! On-disk packages.

use std::path::PathBuf;

use cod_manifest::PackageManifest;

use crate::{Evr, Result};

/// A package rooted at a directory with a `cod.toml`.
#[derive(Clone, Debug)]
pub struct Package {
    pub rootdir: PathBuf,
    pub manifest: PackageManifest,
    pub name: String,
    pub evr: Evr,
    /// Declared architectures; `None` means the package is arch-independent.
    pub arch: Option<Vec<String>>,
}

impl Package {
    /// Open the package rooted at `rootdir`.
    ///
    /// # Errors
    /// Fails when `cod.toml` is missing or malformed.
    pub fn open(rootdir: impl Into<PathBuf>) -> Result<Self> {
        let rootdir = rootdir.into();
        let manifest = PackageManifest::load(&rootdir.join("cod.toml"))?;
        let package = &manifest.package;
        let name = package.name.clone();
        let evr = Evr::new(package.epoch, &package.version, &package.release);
        let arch = package.arch.clone();
        Ok(Self {
            rootdir,
            manifest,
            name,
            evr,
            arch,
        })
    }

    /// Whether `arch` is one this package can be built for.
    #[must_use]
    pub fn supports_arch(&self, arch: &str) -> bool {
        self.arch
            .as_ref()
            .is_none_or(|list| list.iter().any(|a| a == arch))
    }
}
