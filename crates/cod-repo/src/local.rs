//! Repository over a directory of packaged source trees.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{PkgInfo, Repo, RepoError, Result};

/// Scan `root` for `<package>/.cod/<pkgid>.cod` artifacts.
pub(crate) fn scan_artifacts(root: &Path) -> BTreeMap<String, PathBuf> {
    let mut found = BTreeMap::new();
    let Ok(entries) = fs::read_dir(root) else {
        return found;
    };
    for entry in entries.filter_map(std::result::Result::ok) {
        let workdir = entry.path().join(".cod");
        let Ok(artifacts) = fs::read_dir(&workdir) else {
            continue;
        };
        for artifact in artifacts.filter_map(std::result::Result::ok) {
            let path = artifact.path();
            if path.extension().and_then(|e| e.to_str()) != Some("cod") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                found.insert(stem.to_owned(), path.clone());
            }
        }
    }
    found
}

/// A directory of packages, each carrying its published `.cod` artifact.
pub struct LocalRepo {
    rootdir: PathBuf,
    packages: OnceCell<BTreeMap<String, PathBuf>>,
}

impl LocalRepo {
    #[must_use]
    pub fn new(rootdir: impl Into<PathBuf>) -> Self {
        Self {
            rootdir: rootdir.into(),
            packages: OnceCell::new(),
        }
    }

    fn packages(&self) -> &BTreeMap<String, PathBuf> {
        self.packages.get_or_init(|| scan_artifacts(&self.rootdir))
    }

    fn artifact(&self, id: &str) -> Result<&PathBuf> {
        self.packages()
            .get(id)
            .ok_or_else(|| RepoError::UnknownPackage(id.to_owned()))
    }
}

impl Repo for LocalRepo {
    fn ids(&self) -> Vec<String> {
        self.packages().keys().cloned().collect()
    }

    fn fetch(&self, _id: &str) -> Result<()> {
        // Everything is already on disk.
        Ok(())
    }

    fn info(&self, id: &str) -> Result<PkgInfo> {
        PkgInfo::load(self.artifact(id)?)
    }

    fn path(&self, id: &str) -> Result<PathBuf> {
        let artifact = self.artifact(id)?;
        Ok(artifact
            .parent()
            .and_then(Path::parent)
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf))
    }
}
