//! A package pinned to a profile and an architecture.

use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use cod_dep::Toolchain;
use cod_manifest::{BuildFlags, ProfileSection};

use crate::{Capability, Package, PackageId, PkgError, Result};

/// Architecture compatibility policy: identical, or an x86_64 top build
/// consuming a 32-bit x86 package (its objects go through the lift).
///
/// # Errors
/// Fails for every other combination.
pub fn check_arch(top_arch: &str, pkg_arch: &str) -> Result<()> {
    if top_arch == pkg_arch {
        return Ok(());
    }
    if top_arch == "x86_64" && matches!(pkg_arch, "i386" | "i486" | "i586" | "i686") {
        return Ok(());
    }
    Err(PkgError::ArchMismatch {
        top: top_arch.to_owned(),
        pkg: pkg_arch.to_owned(),
    })
}

/// Recursively map logical destination paths to source files.
///
/// The destination is the source's path relative to `root` with its
/// extension swapped, optionally under a prefix (arch-specific assembly
/// lands under `asm/` so it cannot collide with portable sources).
fn find_files(
    root: &Path,
    ext: &str,
    new_ext: &str,
    prefix: Option<&str>,
) -> BTreeMap<PathBuf, PathBuf> {
    let mut found = BTreeMap::new();
    if !root.is_dir() {
        return found;
    }
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let mut key = rel.with_extension(new_ext);
        if let Some(prefix) = prefix {
            key = Path::new(prefix).join(key);
        }
        found.insert(key, path.to_path_buf());
    }
    found
}

/// A package bound to `(profile_name, arch)`.
///
/// Derived source sets and flags are computed on first use and memoized
/// for the lifetime of the profile.
pub struct Profile {
    package: Package,
    pub id: PackageId,
    arch: String,
    top_arch: String,
    build_arch: String,
    profile: ProfileSection,
    pub includedirs: Vec<PathBuf>,
    objs: OnceCell<BTreeMap<PathBuf, PathBuf>>,
    elfs: OnceCell<BTreeMap<PathBuf, PathBuf>>,
    include_files: OnceCell<BTreeMap<PathBuf, PathBuf>>,
    build_flags: OnceCell<BuildFlags>,
    export_flags: OnceCell<BuildFlags>,
}

impl Profile {
    /// Bind `package` to `profile_name` (a `name.arch` pair) under a build
    /// targeting `build_arch`.
    ///
    /// # Errors
    /// Fails when the package's architecture is incompatible with the
    /// build architecture.
    pub fn new(package: Package, build_arch: &str, profile_name: &str) -> Result<Self> {
        let (profile_name, mut arch) = profile_name
            .rsplit_once('.')
            .map_or((profile_name, build_arch), |(name, arch)| (name, arch));
        if package.arch.is_none() {
            arch = "noarch";
        }
        let pkg_build_arch = if arch == "noarch" { build_arch } else { arch };
        check_arch(build_arch, pkg_build_arch)?;

        let profile = package
            .manifest
            .profile
            .get(profile_name)
            .cloned()
            .unwrap_or_default();
        let id = PackageId::new(&package.name, package.evr.to_string(), arch);

        let mut includedirs = vec![package.rootdir.join("include")];
        let archdir = (arch != "noarch").then(|| package.rootdir.join("arch").join(arch));
        if let Some(archdir) = &archdir {
            includedirs.push(archdir.join("include"));
        }

        Ok(Self {
            package,
            id,
            arch: arch.to_owned(),
            top_arch: build_arch.to_owned(),
            build_arch: pkg_build_arch.to_owned(),
            profile,
            includedirs,
            objs: OnceCell::new(),
            elfs: OnceCell::new(),
            include_files: OnceCell::new(),
            build_flags: OnceCell::new(),
            export_flags: OnceCell::new(),
        })
    }

    #[must_use]
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// The package's own architecture tag (`noarch` when undeclared).
    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// The architecture this package's objects are compiled for.
    #[must_use]
    pub fn build_arch(&self) -> &str {
        &self.build_arch
    }

    /// The architecture of the whole build.
    #[must_use]
    pub fn top_arch(&self) -> &str {
        &self.top_arch
    }

    fn archdir(&self) -> Option<PathBuf> {
        (self.arch != "noarch").then(|| self.package.rootdir.join("arch").join(&self.arch))
    }

    /// Library objects: `src/**.c` and `src/**.S`, plus arch variants
    /// under a logical `asm/` prefix.
    pub fn objs(&self) -> &BTreeMap<PathBuf, PathBuf> {
        self.objs.get_or_init(|| {
            let src = self.package.rootdir.join("src");
            let mut d = find_files(&src, "c", "o", None);
            d.extend(find_files(&src, "S", "s.o", None));
            if let Some(archdir) = self.archdir() {
                let src = archdir.join("src");
                d.extend(find_files(&src, "c", "o", Some("asm")));
                d.extend(find_files(&src, "S", "s.o", Some("asm")));
            }
            d
        })
    }

    /// Executable units: `bin/**.c` and `bin/**.S`, mapping to `.elf`
    /// outputs.
    pub fn elfs(&self) -> &BTreeMap<PathBuf, PathBuf> {
        self.elfs.get_or_init(|| {
            let bin = self.package.rootdir.join("bin");
            let mut d = find_files(&bin, "c", "elf", None);
            d.extend(find_files(&bin, "S", "elf", None));
            if let Some(archdir) = self.archdir() {
                let bin = archdir.join("bin");
                d.extend(find_files(&bin, "c", "elf", None));
                d.extend(find_files(&bin, "S", "elf", None));
            }
            d
        })
    }

    /// Public headers under `include/`, plus arch variants.
    pub fn include_files(&self) -> &BTreeMap<PathBuf, PathBuf> {
        self.include_files.get_or_init(|| {
            let include = self.package.rootdir.join("include");
            let mut d = find_files(&include, "h", "h", None);
            if let Some(archdir) = self.archdir() {
                d.extend(find_files(&archdir.join("include"), "h", "h", None));
            }
            d
        })
    }

    /// Merged build flags: package `[build]` then `[profile.<name>.build]`,
    /// both resolved for the package's build architecture.
    pub fn build_flags(&self) -> &BuildFlags {
        self.build_flags.get_or_init(|| {
            self.package
                .manifest
                .build
                .build_flags(&self.build_arch)
                .combine(&self.profile.build.build_flags(&self.build_arch))
        })
    }

    /// Export flags, resolved for the top architecture.
    pub fn export_flags(&self) -> &BuildFlags {
        self.export_flags.get_or_init(|| {
            self.package.manifest.export.build_flags(&self.top_arch)
        })
    }

    /// Headers this package needs but does not contain, as `<h>`
    /// capabilities, sorted.
    ///
    /// # Errors
    /// Fails when an include scan fails.
    pub fn includedeps(&self, toolchain: &Toolchain) -> Result<Vec<String>> {
        tracing::debug!(package = %self.id, "scanning include dependencies");
        let mut missing = BTreeSet::new();
        for file in self
            .include_files()
            .values()
            .chain(self.objs().values())
            .chain(self.elfs().values())
        {
            for header in
                cod_dep::include_deps(toolchain, &self.includedirs, file, &self.build_arch)?
            {
                missing.insert(header);
            }
        }
        Ok(missing
            .into_iter()
            .map(|h| Capability::Header(h).to_string())
            .collect())
    }

    /// Check that the `<h>` capabilities in `provides` are exactly the
    /// headers on disk.
    ///
    /// # Errors
    /// Fails with both sets on any difference.
    pub fn validate_headers(&self, provides: &[String]) -> Result<()> {
        let have: BTreeSet<String> = self
            .include_files()
            .keys()
            .map(|k| k.to_string_lossy().into_owned())
            .collect();
        let need: BTreeSet<String> = provides
            .iter()
            .filter_map(|p| match Capability::parse(p) {
                Capability::Header(h) => Some(h),
                _ => None,
            })
            .collect();
        if have == need {
            Ok(())
        } else {
            Err(PkgError::HeaderMismatch {
                id: self.id.to_string(),
                expected: need.into_iter().collect(),
                actual: have.into_iter().collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn package(dir: &Path, manifest: &str) -> Package {
        write(&dir.join("cod.toml"), manifest);
        Package::open(dir).unwrap()
    }

    #[test]
    fn test_check_arch_policy() {
        assert!(check_arch("x86_64", "x86_64").is_ok());
        assert!(check_arch("x86_64", "i686").is_ok());
        assert!(check_arch("x86_64", "i386").is_ok());
        assert!(check_arch("i686", "x86_64").is_err());
        assert!(check_arch("aarch64", "i686").is_err());
    }

    #[test]
    fn test_source_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("src/a.c"), "");
        write(&root.join("src/nested/b.c"), "");
        write(&root.join("src/boot.S"), "");
        write(&root.join("arch/i686/src/io.c"), "");
        write(&root.join("arch/i686/src/start.S"), "");
        write(&root.join("include/foo.h"), "");
        write(&root.join("arch/i686/include/foo/io.h"), "");
        write(&root.join("bin/main.c"), "");

        let pkg = package(root, "[package]\nname = \"foo\"\nversion = \"1.0\"\narch = \"i686\"\n");
        let profile = Profile::new(pkg, "i686", "dev.i686").unwrap();

        let objs: Vec<String> = profile
            .objs()
            .keys()
            .map(|k| k.to_string_lossy().into_owned())
            .collect();
        assert_eq!(objs, ["a.o", "asm/io.o", "asm/start.s.o", "boot.s.o", "nested/b.o"]);

        let elfs: Vec<String> = profile
            .elfs()
            .keys()
            .map(|k| k.to_string_lossy().into_owned())
            .collect();
        assert_eq!(elfs, ["main.elf"]);

        let headers: Vec<String> = profile
            .include_files()
            .keys()
            .map(|k| k.to_string_lossy().into_owned())
            .collect();
        assert_eq!(headers, ["foo.h", "foo/io.h"]);
    }

    #[test]
    fn test_noarch_package_resolves_to_noarch() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = package(
            dir.path(),
            "[package]\nname = \"hdrs\"\nversion = \"1.0\"\n",
        );
        let profile = Profile::new(pkg, "x86_64", "dev.x86_64").unwrap();
        assert_eq!(profile.arch(), "noarch");
        assert_eq!(profile.build_arch(), "x86_64");
        assert_eq!(profile.id.to_string(), "hdrs-1.0-0.noarch");
    }

    #[test]
    fn test_profile_flags_merge() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = package(
            dir.path(),
            "[package]\nname = \"a\"\nversion = \"1\"\n\
             [build]\ncflags = \"-O1\"\n\
             [profile.release.build]\ncflags = \"-O2\"\n",
        );
        let profile = Profile::new(pkg, "x86_64", "release.x86_64").unwrap();
        assert_eq!(profile.build_flags().cflags, ["-O1", "-O2"]);
    }

    #[test]
    fn test_validate_headers() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("include/lib.h"), "");
        let pkg = package(root, "[package]\nname = \"lib\"\nversion = \"1.0\"\n");
        let profile = Profile::new(pkg, "x86_64", "release.x86_64").unwrap();

        assert!(profile
            .validate_headers(&["<lib.h>".to_owned(), "(sym)".to_owned()])
            .is_ok());
        assert!(profile.validate_headers(&[]).is_err());
        assert!(profile
            .validate_headers(&["<lib.h>".to_owned(), "<other.h>".to_owned()])
            .is_err());
    }

    #[test]
    fn test_incompatible_arch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = package(
            dir.path(),
            "[package]\nname = \"a\"\nversion = \"1\"\narch = \"x86_64\"\n",
        );
        assert!(matches!(
            Profile::new(pkg, "i686", "dev.x86_64"),
            Err(PkgError::ArchMismatch { .. })
        ));
    }
}
