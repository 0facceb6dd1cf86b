//! The workspace driver.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::process::Command;

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use cod_ar::parse_armap;
use cod_dep::{Toolchain, arch_to_target, native_arch};
use cod_ninja::{NinjaWriter, relative_to};
use cod_pkg::{Capability, Package, Profile};
use cod_repo::PkgInfo;
use cod_solve::Lock;

use crate::closure::{close_undefined, obj_defs};
use crate::project::Project;
use crate::{Error, Result};

/// Profile dependency libraries are built under.
pub const LIB_PROFILE: &str = "release";
/// Profile `build` uses when none is given.
pub const DEFAULT_PROFILE: &str = "dev";

fn posix(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// One package directory opened for building.
///
/// Holds the project, the top package, the toolchain and the lockfile for
/// the duration of a single command.
pub struct Workspace {
    pkg_dir: PathBuf,
    workdir: PathBuf,
    toolchain: Toolchain,
    project: Project,
    top_package: Package,
    lock: Lock,
}

impl Workspace {
    /// Open the workspace rooted at `pkg_dir`.
    ///
    /// # Errors
    /// Fails when the package or project manifest is missing or invalid,
    /// no toolchain is found, or the lockfile cannot be replayed.
    pub fn open(pkg_dir: impl Into<PathBuf>) -> Result<Self> {
        let pkg_dir = pkg_dir.into();
        let toolchain = Toolchain::find()?;
        let project = Project::open(&pkg_dir)?;
        let top_package = Package::open(&pkg_dir)?;
        let lock = Lock::open(pkg_dir.join("cod.lock"), project.repos()?)?;
        let workdir = pkg_dir.join(".cod");
        Ok(Self {
            pkg_dir,
            workdir,
            toolchain,
            project,
            top_package,
            lock,
        })
    }

    fn builddir(&self, profile_name: &str) -> PathBuf {
        self.workdir.join(profile_name)
    }

    /// Arch preference: explicit flag, then a package declaring exactly
    /// one arch, then the machine we run on.
    fn resolve_arch(&self, flag: Option<&str>) -> Result<String> {
        let arch = match flag {
            Some(arch) => arch.to_owned(),
            None => match &self.top_package.arch {
                Some(list) if list.len() == 1 => list[0].clone(),
                _ => native_arch(),
            },
        };
        if !self.top_package.supports_arch(&arch) {
            return Err(Error::UnsupportedArch {
                arch,
                package: self.top_package.name.clone(),
            });
        }
        Ok(arch)
    }

    fn run_ninja(&self, rootdir: &Path, targets: &[String]) -> Result<()> {
        let ninja = std::env::var_os("COD_NINJA").unwrap_or_else(|| "ninja".into());
        debug!(targets = ?targets, "running executor");
        let status = Command::new(ninja)
            .args(targets)
            .current_dir(rootdir)
            .status()?;
        if !status.success() {
            return Err(Error::Build(status.to_string()));
        }
        Ok(())
    }

    /// Open every locked dependency package at its library profile.
    fn locked_profiles(&self, profile_name: &str, arch: &str) -> Result<Vec<Profile>> {
        let mut profiles = Vec::new();
        for (id, repo_name) in self.lock.packages(profile_name) {
            let path = self.lock.package_path(&repo_name, &id)?;
            let package = Package::open(path)?;
            let profile = Profile::new(package, arch, &format!("{LIB_PROFILE}.{}", id.arch))?;
            let info = self.lock.package_info(&repo_name, &id)?;
            profile.validate_headers(&info.provides)?;
            profiles.push(profile);
        }
        Ok(profiles)
    }

    /// Regenerate the ninja root and every per-package fragment.
    ///
    /// Returns the library archive targets.
    fn write_build(&self, profile_name: &str, arch: &str, top: &Profile) -> Result<Vec<String>> {
        let rootdir = self.builddir(profile_name);
        std::fs::create_dir_all(&rootdir)?;

        let deps = self.locked_profiles(profile_name, arch)?;
        let mut packages: Vec<&Profile> = deps.iter().collect();
        packages.push(top);
        packages.sort_by_key(|p| p.id.to_string());

        let mut includedirs = Vec::new();
        for package in &packages {
            for dir in &package.includedirs {
                includedirs.push(posix(&relative_to(dir, &rootdir)));
            }
        }

        let mut ninja = NinjaWriter::new(rootdir.join("build.ninja"));
        let cod = std::env::current_exe()?;
        ninja.variable("zig", [posix(self.toolchain.zig())]);
        ninja.variable("clang", ["$zig".to_owned(), "clang".to_owned()]);
        ninja.variable("cod", [posix(&cod)]);
        ninja.variable(
            "cc",
            [
                "$clang".to_owned(),
                format!("--target={arch}-unknown-unknown"),
            ],
        );
        ninja.rule(
            "cc",
            ["$cc", "$cflags", "-MMD", "-MF", "$out.d", "-c", "$in", "-o", "$out"],
            Some("$out.d"),
            Some("CC $out"),
        );
        ninja.rule(
            "as",
            ["$cc", "$cflags", "$sflags", "-MMD", "-MF", "$out.d", "-c", "$in", "-o", "$out"],
            Some("$out.d"),
            Some("AS $out"),
        );
        ninja.rule("ar", ["$cod", "ar", "$out", "$in"], None, Some("AR $out"));
        ninja.rule(
            "objcopy",
            ["$cod", "objcopy", "$out", "$in"],
            None,
            Some("OBJCOPY $out"),
        );
        ninja.rule(
            "objconv",
            ["$cod", "objconv", "$out", "$in"],
            None,
            Some("OBJCONV $out"),
        );
        ninja.variable("linker-script", ["linker-script"]);
        ninja.build(["linker-script"], "phony", [], []);

        let mut ld = vec!["$zig".to_owned(), "cc".to_owned()];
        ld.extend(arch_to_target(arch));
        ld.extend(
            ["$cflags", "$ldflags", "$linker-script-flags", "$in", "$libs", "-o", "$out"]
                .map(str::to_owned),
        );
        ninja.rule("ld", ld, None, Some("LD $out"));

        let mut cflags: Vec<String> =
            ["-ffreestanding", "-nostdinc", "-nostdlib", "-fno-builtin"]
                .map(str::to_owned)
                .into();
        cflags.extend(includedirs.iter().map(|d| format!("-I{d}")));
        ninja.variable("cflags", cflags);
        self.project.write_build_variables(&mut ninja);

        for package in &packages {
            let export_ninja = Path::new(&package.id.to_string()).join("export.ninja");
            let mut export = NinjaWriter::new(rootdir.join(&export_ninja));
            package.write_export_variables(&rootdir, &mut export);
            export.close()?;
            ninja.include(&posix(&export_ninja));
        }

        let mut libs = Vec::new();
        for package in &packages {
            if package.objs().is_empty() {
                continue;
            }
            let lib_ninja = Path::new(&package.id.to_string()).join("lib.ninja");
            libs.push(package.write_build_lib(&rootdir, &lib_ninja)?);
            ninja.subninja(&posix(&lib_ninja));
        }
        ninja.build(
            ["libs".to_owned()],
            "phony",
            libs.clone(),
            Vec::<String>::new(),
        );
        ninja.variable("libs", libs.clone());

        if !top.elfs().is_empty() {
            let lib_ninja = Path::new("obj").join("lib.ninja");
            top.write_build_bin(&rootdir, &lib_ninja)?;
            ninja.subninja(&posix(&lib_ninja));
        }

        ninja.close()?;
        Ok(libs)
    }

    /// Build the top package.
    ///
    /// Header phase, graph emission, library build, then the iterated
    /// symbol phase until every executable closes.
    ///
    /// # Errors
    /// Fails on scan, resolution, emission or executor errors, and when
    /// undefined symbols remain with no package able to provide them.
    pub fn build(&mut self, arch: Option<&str>, profile: &str, no_bin: bool) -> Result<()> {
        let arch = self.resolve_arch(arch)?;
        let profile_name = format!("{profile}.{arch}");
        info!(profile = %profile_name, "building");
        let top = Profile::new(self.top_package.clone(), &arch, &profile_name)?;

        let includedeps = top.includedeps(&self.toolchain)?;
        if !includedeps.is_empty() {
            debug!(missing = ?includedeps, "header phase");
            self.lock
                .with_profile(&profile_name, |p| p.install_provides(&includedeps))?;
        }

        let rootdir = self.builddir(&profile_name);
        let mut libs = self.write_build(&profile_name, &arch, &top)?;

        if no_bin || top.elfs().is_empty() {
            if !libs.is_empty() {
                self.run_ninja(&rootdir, &libs)?;
            }
            return Ok(());
        }

        let target = arch_to_target(&arch);
        loop {
            let mut targets = vec!["lib/bin.a".to_owned()];
            targets.extend(libs.iter().cloned());
            self.run_ninja(&rootdir, &targets)?;

            let bin_defs = obj_defs(&parse_armap(&rootdir.join("lib/bin.a"))?)?;

            let mut symbols: FxHashMap<String, PathBuf> = FxHashMap::default();
            for lib in &libs {
                for (symbol, member) in parse_armap(&rootdir.join(lib))? {
                    let path = member
                        .path()
                        .ok_or_else(|| Error::NotAThinMember(symbol.clone()))?;
                    symbols.insert(symbol, path.to_path_buf());
                }
            }

            let members: BTreeSet<&PathBuf> = symbols.values().collect();
            let mut lib_deps: FxHashMap<PathBuf, Vec<String>> = FxHashMap::default();
            for member in members {
                let deps =
                    cod_dep::symbol_deps(&self.toolchain, &rootdir, &target, member)?;
                lib_deps.insert(member.clone(), deps);
            }

            let mut bin_deps: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
            for member in bin_defs.keys() {
                let deps =
                    cod_dep::symbol_deps(&self.toolchain, &rootdir, &target, member)?;
                bin_deps.insert(member.clone(), deps);
            }

            let undefined = close_undefined(&bin_defs, &bin_deps, &symbols, &lib_deps);
            if undefined.is_empty() {
                break;
            }

            info!(symbols = ?undefined, "symbol phase: resolving providers");
            let undefined: Vec<String> = undefined.into_iter().collect();
            let grew = self.lock.with_profile(&profile_name, |p| {
                p.install_from_symbols(&undefined)?;
                Ok(p.dirty())
            })?;
            if !grew {
                return Err(Error::UnresolvedSymbols(undefined));
            }
            libs = self.write_build(&profile_name, &arch, &top)?;
        }

        self.run_ninja(&rootdir, &[])
    }

    /// Resolve user-named packages into the profile's lockfile.
    ///
    /// # Errors
    /// Fails on resolution problems or conflicts with the installed set.
    pub fn install(&mut self, arch: Option<&str>, profile: &str, packages: &[String]) -> Result<()> {
        let arch = self.resolve_arch(arch)?;
        let profile_name = format!("{profile}.{arch}");
        info!(profile = %profile_name, packages = ?packages, "installing");
        self.lock
            .with_profile(&profile_name, |p| p.install_packages(packages))?;
        Ok(())
    }

    /// Produce the package metadata artifact for the current source tree.
    ///
    /// With no arch, iterates the package's declared arches (or the native
    /// one). Packages with sources get a library build first so the
    /// archive's symbol map can be published.
    ///
    /// # Errors
    /// Fails on scan, build or write errors.
    pub fn package(&mut self, arch: Option<&str>) -> Result<()> {
        let Some(arch) = arch.map(str::to_owned) else {
            let arches = self
                .top_package
                .arch
                .clone()
                .unwrap_or_else(|| vec![native_arch()]);
            for arch in arches {
                self.package(Some(&arch))?;
            }
            return Ok(());
        };

        if !self.top_package.supports_arch(&arch) {
            return Err(Error::UnsupportedArch {
                arch,
                package: self.top_package.name.clone(),
            });
        }

        let profile_name = format!("{LIB_PROFILE}.{arch}");
        let top = Profile::new(self.top_package.clone(), &arch, &profile_name)?;

        let mut info = PkgInfo {
            requires: top.includedeps(&self.toolchain)?,
            provides: top
                .include_files()
                .keys()
                .map(|h| Capability::Header(posix(h)).to_string())
                .collect(),
        };

        if top.export_flags().linker_script.is_some() {
            info.provides.push(Capability::LinkerScript.to_string());
        }

        if !top.objs().is_empty() {
            self.build(Some(&arch), LIB_PROFILE, true)?;
            let libname = format!("lib{}.a", top.id.name);
            let armap =
                parse_armap(&self.builddir(&profile_name).join("lib").join(&libname))?;
            info.provides.push(libname);
            info.provides.extend(
                armap
                    .iter()
                    .map(|(symbol, _)| Capability::Symbol(symbol.clone()).to_string()),
            );
        }

        std::fs::create_dir_all(&self.workdir)?;
        let artifact = self.workdir.join(format!("{}.cod", top.id));
        info.save(&artifact)?;
        info!(artifact = %artifact.display(), "packaged");
        Ok(())
    }

    #[must_use]
    pub fn pkg_dir(&self) -> &Path {
        &self.pkg_dir
    }
}
