//! Package identifiers.

use std::fmt;

use crate::{Evr, PkgError, Result};

/// A fully qualified package identity: `name-evr.arch`.
///
/// The EVR is kept in string form; parse it with [`Evr::parse`] when
/// ordering matters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId {
    pub name: String,
    pub evr: String,
    pub arch: String,
}

impl PackageId {
    #[must_use]
    pub fn new(name: impl Into<String>, evr: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            evr: evr.into(),
            arch: arch.into(),
        }
    }

    /// Parse `name-version-release.arch`. The name may itself contain `-`.
    ///
    /// # Errors
    /// Fails when the arch or the two EVR fields are missing.
    pub fn parse(s: &str) -> Result<Self> {
        let (rest, arch) = s
            .rsplit_once('.')
            .ok_or_else(|| PkgError::BadPackageId(s.to_owned()))?;
        let (rest, release) = rest
            .rsplit_once('-')
            .ok_or_else(|| PkgError::BadPackageId(s.to_owned()))?;
        let (name, version) = rest
            .rsplit_once('-')
            .ok_or_else(|| PkgError::BadPackageId(s.to_owned()))?;
        if name.is_empty() || version.is_empty() || release.is_empty() || arch.is_empty() {
            return Err(PkgError::BadPackageId(s.to_owned()));
        }
        Ok(Self::new(name, format!("{version}-{release}"), arch))
    }

    /// The parsed EVR.
    ///
    /// # Errors
    /// Fails when the stored EVR string is malformed.
    pub fn parsed_evr(&self) -> Result<Evr> {
        Evr::parse(&self.evr)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}.{}", self.name, self.evr, self.arch)
    }
}
