//! Build-flag records.

use std::collections::BTreeMap;

use cod_ninja::NinjaWriter;
use serde::{Deserialize, Deserializer};

/// Accept a single string or a list of strings.
fn string_or_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// One flat flag record.
///
/// `combine` appends the flag lists; `linker_script` and `format` are
/// other-wins when both sides set them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildFlags {
    #[serde(default, deserialize_with = "string_or_list")]
    pub cflags: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub sflags: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub ldflags: Vec<String>,
    #[serde(rename = "linker-script", default)]
    pub linker_script: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

impl BuildFlags {
    /// Additive combination: `self ⊕ other`.
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.cflags.extend(other.cflags.iter().cloned());
        out.sflags.extend(other.sflags.iter().cloned());
        out.ldflags.extend(other.ldflags.iter().cloned());
        if other.linker_script.is_some() {
            out.linker_script.clone_from(&other.linker_script);
        }
        if other.format.is_some() {
            out.format.clone_from(&other.format);
        }
        out
    }
}

/// A flag record, either flat or indexed by architecture.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ArchFlags {
    Flat(BuildFlags),
    PerArch(BTreeMap<String, BuildFlags>),
}

impl Default for ArchFlags {
    fn default() -> Self {
        Self::Flat(BuildFlags::default())
    }
}

impl ArchFlags {
    /// Resolve for one architecture: `noarch ⊕ matching-arch`.
    #[must_use]
    pub fn build_flags(&self, arch: &str) -> BuildFlags {
        match self {
            Self::Flat(flags) => flags.clone(),
            Self::PerArch(map) => {
                let noarch = map.get("noarch").cloned().unwrap_or_default();
                match map.get(arch) {
                    Some(flags) => noarch.combine(flags),
                    None => noarch,
                }
            }
        }
    }
}

fn write_flat(ninja: &mut NinjaWriter, flags: &BuildFlags, suffix: &str) {
    if !flags.cflags.is_empty() {
        let mut values = vec![format!("$cflags{suffix}")];
        values.extend(flags.cflags.iter().cloned());
        ninja.variable(&format!("cflags{suffix}"), values);
    }
    if !flags.sflags.is_empty() {
        let mut values = vec![format!("$sflags{suffix}")];
        values.extend(flags.sflags.iter().cloned());
        ninja.variable(&format!("sflags{suffix}"), values);
    }
}

/// Emit `cflags`/`sflags` variables for a flag record.
///
/// Per-arch records emit `cflags-<arch>` variants; the `noarch` entry lands
/// on the unsuffixed variables. Values append to the inherited scope.
pub fn write_compiler_variables(ninja: &mut NinjaWriter, flags: &ArchFlags) {
    match flags {
        ArchFlags::Flat(flags) => write_flat(ninja, flags, ""),
        ArchFlags::PerArch(map) => {
            for (arch, flags) in map {
                if arch == "noarch" {
                    write_flat(ninja, flags, "");
                } else {
                    write_flat(ninja, flags, &format!("-{arch}"));
                }
            }
        }
    }
}
