//! The project: the nearest ancestor with a `cod.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cod_manifest::{ProjectManifest, write_compiler_variables};
use cod_ninja::NinjaWriter;
use cod_repo::{ProjectLocalRepo, Repo, open_repo};

use crate::{Error, Result};

/// Reserved repository name for the project's own packages.
const PROJECT_REPO: &str = "local";

/// A project groups packages and declares the repositories their
/// dependencies resolve from.
pub struct Project {
    pub rootdir: PathBuf,
    pub manifest: ProjectManifest,
    pub workdir: PathBuf,
}

fn find_project_dir(pkg_dir: &Path) -> Result<PathBuf> {
    for dir in pkg_dir.ancestors().skip(1) {
        if dir.join("cod.toml").is_file() {
            return Ok(dir.to_path_buf());
        }
    }
    Err(Error::NotInProject(pkg_dir.to_path_buf()))
}

impl Project {
    /// Locate and load the project containing `pkg_dir`.
    ///
    /// # Errors
    /// Fails when no ancestor carries a `cod.toml`, or the manifest is not
    /// a project manifest.
    pub fn open(pkg_dir: &Path) -> Result<Self> {
        let rootdir = find_project_dir(pkg_dir)?;
        let manifest = ProjectManifest::load(&rootdir.join("cod.toml"))?;
        let workdir = rootdir.join(".cod");
        Ok(Self {
            rootdir,
            manifest,
            workdir,
        })
    }

    /// Instantiate every declared repository, plus the implicit
    /// project-local one under the reserved name `local`.
    ///
    /// # Errors
    /// Fails on unknown repository types or bad plugin options.
    pub fn repos(&self) -> Result<BTreeMap<String, Box<dyn Repo>>> {
        let mut repos: BTreeMap<String, Box<dyn Repo>> = BTreeMap::new();
        for (name, spec) in &self.manifest.repo {
            repos.insert(name.clone(), open_repo(&self.rootdir, name, spec)?);
        }
        repos.insert(
            PROJECT_REPO.to_owned(),
            Box::new(ProjectLocalRepo::new(&self.rootdir)),
        );
        Ok(repos)
    }

    /// Project-wide compiler flag variables, emitted at root scope.
    pub fn write_build_variables(&self, ninja: &mut NinjaWriter) {
        write_compiler_variables(ninja, &self.manifest.build);
    }
}
