//! Package manifest (`cod.toml` in a package directory).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::flags::ArchFlags;
use crate::Result;

fn default_release() -> String {
    "0".to_owned()
}

/// Accept `arch = "x86_64"` as well as `arch = ["i686", "x86_64"]`.
fn arch_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Vec<String>>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(|v| match v {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    }))
}

/// The `[package]` table.
#[derive(Clone, Debug, Deserialize)]
pub struct PackageSection {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub epoch: i64,
    #[serde(default = "default_release")]
    pub release: String,
    #[serde(default, deserialize_with = "arch_list")]
    pub arch: Option<Vec<String>>,
}

/// A `[profile.<name>]` table.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProfileSection {
    #[serde(default)]
    pub build: ArchFlags,
}

/// A whole package manifest.
#[derive(Clone, Debug, Deserialize)]
pub struct PackageManifest {
    pub package: PackageSection,
    #[serde(default)]
    pub build: ArchFlags,
    #[serde(default)]
    pub export: ArchFlags,
    #[serde(default)]
    pub profile: BTreeMap<String, ProfileSection>,
}

impl PackageManifest {
    /// Load and validate the manifest at `path`.
    ///
    /// # Errors
    /// Fails on unreadable files or schema violations.
    pub fn load(path: &Path) -> Result<Self> {
        crate::load(path)
    }
}
