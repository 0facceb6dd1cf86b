//! The per-profile lockfile.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, info};

use cod_ninja::update_file;
use cod_pkg::PackageId;
use cod_repo::{PkgInfo, Repo};

use crate::pool::{Pool, Solvable};
use crate::solver::solve;
use crate::{Result, SolveError};

/// The lockfile: every repository's solvables pooled once, plus the
/// installed set of each profile, persisted as sorted INI sections.
pub struct Lock {
    path: PathBuf,
    pool: Pool,
    repos: BTreeMap<String, Box<dyn Repo>>,
    profiles: BTreeMap<String, Vec<Solvable>>,
    dirty: bool,
}

impl Lock {
    /// Load the lockfile at `path`, pooling every repository's packages
    /// and replaying the recorded installed sets.
    ///
    /// # Errors
    /// Fails on malformed lockfile lines, unknown repositories, or
    /// repository errors while replaying.
    pub fn open(path: impl Into<PathBuf>, repos: BTreeMap<String, Box<dyn Repo>>) -> Result<Self> {
        let path = path.into();

        let mut pool = Pool::new();
        for (name, repo) in &repos {
            for id in repo.ids() {
                let info = repo.info(&id)?;
                pool.add(Solvable::new(&id, name, &info)?);
            }
            debug!(repo = %name, packages = pool.len(), "pooled repository");
        }

        let mut lock = Self {
            path,
            pool,
            repos,
            profiles: BTreeMap::new(),
            dirty: false,
        };

        for (profile, entries) in lock.parse_lockfile()? {
            for (id, repo) in entries {
                lock.add_installed(&profile, &id, &repo)?;
            }
        }
        lock.dirty = false;
        Ok(lock)
    }

    fn parse_lockfile(&self) -> Result<Vec<(String, Vec<(String, String)>)>> {
        let Ok(text) = std::fs::read_to_string(&self.path) else {
            return Ok(Vec::new());
        };

        let mut sections = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                sections.push((name.to_owned(), Vec::new()));
                continue;
            }
            let entry = line.split_once('=').map(|(k, v)| (k.trim(), v.trim()));
            match (entry, sections.last_mut()) {
                (Some((key, value)), Some((_, entries))) if !key.is_empty() => {
                    entries.push((key.to_owned(), value.to_owned()));
                }
                _ => {
                    return Err(SolveError::BadLockLine {
                        path: self.path.clone(),
                        line: lineno + 1,
                    });
                }
            }
        }
        Ok(sections)
    }

    /// Fetch one package and add it to a profile's installed set.
    fn add_installed(&mut self, profile: &str, id: &str, repo_name: &str) -> Result<()> {
        let repo = self
            .repos
            .get(repo_name)
            .ok_or_else(|| SolveError::UnknownRepo(repo_name.to_owned()))?;
        repo.fetch(id)?;
        let info = repo.info(id)?;
        let solvable = Solvable::new(id, repo_name, &info)?;
        self.profiles
            .entry(profile.to_owned())
            .or_default()
            .push(solvable);
        self.dirty = true;
        Ok(())
    }

    /// The `(id, repo)` pairs installed in a profile.
    #[must_use]
    pub fn packages(&self, profile: &str) -> Vec<(PackageId, String)> {
        self.profiles
            .get(profile)
            .map(|solvables| {
                solvables
                    .iter()
                    .map(|s| (s.id.clone(), s.repo.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A package's source tree, through the repository that provides it.
    ///
    /// # Errors
    /// Fails on an unknown repository or package.
    pub fn package_path(&self, repo_name: &str, id: &PackageId) -> Result<PathBuf> {
        let repo = self
            .repos
            .get(repo_name)
            .ok_or_else(|| SolveError::UnknownRepo(repo_name.to_owned()))?;
        Ok(repo.path(&id.to_string())?)
    }

    /// A package's capability metadata, through its repository.
    ///
    /// # Errors
    /// Fails on an unknown repository or package.
    pub fn package_info(&self, repo_name: &str, id: &PackageId) -> Result<PkgInfo> {
        let repo = self
            .repos
            .get(repo_name)
            .ok_or_else(|| SolveError::UnknownRepo(repo_name.to_owned()))?;
        Ok(repo.info(&id.to_string())?)
    }

    #[must_use]
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Run `f` with the installed view scoped to `profile`, saving the
    /// lockfile afterwards unless `f` failed.
    ///
    /// # Errors
    /// Propagates `f`'s error, or a save failure.
    pub fn with_profile<T>(
        &mut self,
        profile: &str,
        f: impl FnOnce(&mut ProfileGuard) -> Result<T>,
    ) -> Result<T> {
        self.profiles.entry(profile.to_owned()).or_default();
        let mut guard = ProfileGuard {
            lock: self,
            profile: profile.to_owned(),
        };
        let value = f(&mut guard)?;
        self.save()?;
        Ok(value)
    }

    /// Persist the lockfile if anything changed.
    ///
    /// # Errors
    /// Fails when the file cannot be written.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let mut text = String::new();
        for (profile, solvables) in &self.profiles {
            text.push_str(&format!("[{profile}]\n"));
            let mut entries: Vec<(String, &str)> = solvables
                .iter()
                .map(|s| (s.id.to_string(), s.repo.as_str()))
                .collect();
            entries.sort();
            for (id, repo) in entries {
                text.push_str(&format!("{id} = {repo}\n"));
            }
            text.push('\n');
        }

        update_file(&self.path, text.as_bytes())?;
        info!(path = %self.path.display(), "lockfile saved");
        self.dirty = false;
        Ok(())
    }
}

/// The installed view of one profile, handed out by
/// [`Lock::with_profile`].
pub struct ProfileGuard<'a> {
    lock: &'a mut Lock,
    profile: String,
}

impl ProfileGuard<'_> {
    /// Whether the lock has unsaved changes.
    #[must_use]
    pub fn dirty(&self) -> bool {
        self.lock.dirty
    }

    fn install(&mut self, caps: &[String]) -> Result<()> {
        let installed = self
            .lock
            .profiles
            .get(&self.profile)
            .map_or(&[][..], Vec::as_slice);
        let transaction = solve(&self.lock.pool, installed, caps)?;
        if transaction.is_empty() {
            return Ok(());
        }

        for step in &transaction.steps {
            info!(package = %step.id, repo = %step.repo, profile = %self.profile, "installing");
            let repo = self
                .lock
                .repos
                .get(&step.repo)
                .ok_or_else(|| SolveError::UnknownRepo(step.repo.clone()))?;
            repo.fetch(&step.id.to_string())?;
        }

        let store = self.lock.profiles.entry(self.profile.clone()).or_default();
        store.extend(transaction.steps);
        self.lock.dirty = true;
        Ok(())
    }

    /// Install providers for a set of capability strings.
    ///
    /// # Errors
    /// See [`solve`].
    pub fn install_provides(&mut self, caps: &[String]) -> Result<()> {
        self.install(caps)
    }

    /// Install providers for undefined linker symbols.
    ///
    /// # Errors
    /// See [`solve`].
    pub fn install_from_symbols<S: AsRef<str>>(
        &mut self,
        symbols: impl IntoIterator<Item = S>,
    ) -> Result<()> {
        let caps: Vec<String> = symbols
            .into_iter()
            .map(|s| format!("({})", s.as_ref()))
            .collect();
        self.install(&caps)
    }

    /// Install packages by user-supplied selectors.
    ///
    /// # Errors
    /// See [`solve`].
    pub fn install_packages(&mut self, selectors: &[String]) -> Result<()> {
        self.install(selectors)
    }
}

#[cfg(test)]
mod tests;
