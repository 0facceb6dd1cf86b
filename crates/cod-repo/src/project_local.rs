//! The implicit repository over the project's own packages.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use cod_pkg::{Package, PackageId};

use crate::local::scan_artifacts;
use crate::{PkgInfo, Repo, RepoError, Result};

/// Every project child directory with a `cod.toml` is a package this
/// repository can serve. Artifacts that do not exist yet (first build, or
/// deleted `.cod` directories) are materialized on demand by running the
/// `package` command in the child directory.
pub struct ProjectLocalRepo {
    rootdir: PathBuf,
    packages: RefCell<Option<BTreeMap<String, PathBuf>>>,
}

impl ProjectLocalRepo {
    #[must_use]
    pub fn new(rootdir: impl Into<PathBuf>) -> Self {
        Self {
            rootdir: rootdir.into(),
            packages: RefCell::new(None),
        }
    }

    fn with_packages<T>(&self, f: impl FnOnce(&BTreeMap<String, PathBuf>) -> T) -> T {
        let mut packages = self.packages.borrow_mut();
        let map = packages.get_or_insert_with(|| scan_artifacts(&self.rootdir));
        f(map)
    }

    fn artifact(&self, id: &str) -> Result<PathBuf> {
        if let Some(path) = self.with_packages(|map| map.get(id).cloned()) {
            return Ok(path);
        }
        let path = self.materialize(id)?;
        self.packages
            .borrow_mut()
            .get_or_insert_with(BTreeMap::new)
            .insert(id.to_owned(), path.clone());
        Ok(path)
    }

    /// Find the one unpackaged project directory matching `id` and run
    /// `package` in it.
    fn materialize(&self, id: &str) -> Result<PathBuf> {
        let want = PackageId::parse(id)?;
        let packaged: Vec<PathBuf> = self.with_packages(|map| {
            map.values()
                .filter_map(|p| p.parent().and_then(Path::parent))
                .map(Path::to_path_buf)
                .collect()
        });

        let mut choices = Vec::new();
        let entries = fs::read_dir(&self.rootdir)?;
        for entry in entries.filter_map(std::result::Result::ok) {
            let dir = entry.path();
            if !dir.join("cod.toml").is_file() || packaged.contains(&dir) {
                continue;
            }
            let Ok(package) = Package::open(&dir) else {
                continue;
            };
            if package.name != want.name || package.evr.to_string() != want.evr {
                continue;
            }
            let arch_matches = match &package.arch {
                None => want.arch == "noarch",
                Some(list) => list.iter().any(|a| *a == want.arch),
            };
            if arch_matches {
                choices.push(dir);
            }
        }

        match choices.as_slice() {
            [] => Err(RepoError::NoCandidate(id.to_owned())),
            [dir] => {
                info!(package = id, dir = %dir.display(), "materializing project package");
                let exe = std::env::current_exe()?;
                let status = Command::new(exe).arg("package").current_dir(dir).status()?;
                if !status.success() {
                    return Err(RepoError::Materialize {
                        id: id.to_owned(),
                        status: status.to_string(),
                    });
                }
                let artifact = dir.join(".cod").join(format!("{id}.cod"));
                if !artifact.is_file() {
                    return Err(RepoError::Materialize {
                        id: id.to_owned(),
                        status: "no artifact produced".to_owned(),
                    });
                }
                Ok(artifact)
            }
            _ => Err(RepoError::MultipleCandidates(id.to_owned())),
        }
    }
}

impl Repo for ProjectLocalRepo {
    fn ids(&self) -> Vec<String> {
        self.with_packages(|map| map.keys().cloned().collect())
    }

    fn fetch(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    fn info(&self, id: &str) -> Result<PkgInfo> {
        PkgInfo::load(&self.artifact(id)?)
    }

    fn path(&self, id: &str) -> Result<PathBuf> {
        let artifact = self.artifact(id)?;
        Ok(artifact
            .parent()
            .and_then(Path::parent)
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf))
    }
}
