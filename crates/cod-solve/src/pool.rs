//! The capability pool.

use rustc_hash::FxHashMap;

use cod_pkg::{Capability, Evr, PackageId};
use cod_repo::PkgInfo;

use crate::Result;

/// One package as the resolver sees it.
#[derive(Clone, Debug)]
pub struct Solvable {
    pub id: PackageId,
    /// Name of the repository that can fetch this package.
    pub repo: String,
    pub provides: Vec<String>,
    /// Exclusive capabilities: no other installed package may provide
    /// any of these.
    pub conflicts: Vec<String>,
    pub obsoletes: Vec<String>,
    pub requires: Vec<String>,
}

impl Solvable {
    /// Build the capability schema for one package.
    ///
    /// # Errors
    /// Fails when the package id does not parse.
    pub fn new(id: &str, repo: &str, info: &PkgInfo) -> Result<Self> {
        let id = PackageId::parse(id)?;
        let mut provides = vec![format!("{} = {}", id.name, id.evr)];
        let mut conflicts = Vec::new();
        for cap in &info.provides {
            provides.push(cap.clone());
            if Capability::parse(cap).is_exclusive() {
                conflicts.push(cap.clone());
            }
        }
        let obsoletes = vec![format!("{} < {}", id.name, id.evr)];
        Ok(Self {
            id,
            repo: repo.to_owned(),
            provides,
            conflicts,
            obsoletes,
            requires: info.requires.clone(),
        })
    }

    /// The parsed EVR.
    ///
    /// # Errors
    /// Fails when the stored EVR string is malformed.
    pub fn evr(&self) -> Result<Evr> {
        Ok(self.id.parsed_evr()?)
    }

    /// Whether this solvable provides `cap`.
    ///
    /// Exclusive capabilities match literally; package selectors match the
    /// self-capability with their EVR constraint.
    ///
    /// # Errors
    /// Fails when an EVR in the capability cannot be parsed.
    pub fn satisfies(&self, cap: &str) -> Result<bool> {
        let parsed = Capability::parse(cap);
        if let Capability::Package { .. } = parsed {
            Ok(parsed.selects(&self.id.name, &self.evr()?)?)
        } else {
            Ok(self.provides.iter().any(|p| p == cap))
        }
    }
}

/// All solvables from all repositories, with a literal-capability index.
#[derive(Default)]
pub struct Pool {
    solvables: Vec<Solvable>,
    providers: FxHashMap<String, Vec<usize>>,
}

impl Pool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one solvable and index its provides.
    pub fn add(&mut self, solvable: Solvable) {
        let index = self.solvables.len();
        for cap in &solvable.provides {
            self.providers.entry(cap.clone()).or_default().push(index);
        }
        self.solvables.push(solvable);
    }

    /// Every solvable that provides `cap`.
    ///
    /// # Errors
    /// Fails when an EVR in the capability cannot be parsed.
    pub fn whatprovides(&self, cap: &str) -> Result<Vec<&Solvable>> {
        let parsed = Capability::parse(cap);
        if let Capability::Package { .. } = parsed {
            let mut found = Vec::new();
            for solvable in &self.solvables {
                if parsed.selects(&solvable.id.name, &solvable.evr()?)? {
                    found.push(solvable);
                }
            }
            return Ok(found);
        }
        Ok(self
            .providers
            .get(cap)
            .map(|indexes| indexes.iter().map(|&i| &self.solvables[i]).collect())
            .unwrap_or_default())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.solvables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.solvables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(requires: &[&str], provides: &[&str]) -> PkgInfo {
        PkgInfo {
            requires: requires.iter().map(|s| (*s).to_owned()).collect(),
            provides: provides.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    #[test]
    fn test_schema() {
        let solvable = Solvable::new(
            "lib-1.0-0.x86_64",
            "local",
            &info(&["<dep.h>"], &["<lib.h>", "liblib.a", "(lib_init)", "linker-script"]),
        )
        .unwrap();

        assert!(solvable.provides.contains(&"lib = 1.0-0".to_owned()));
        assert_eq!(
            solvable.conflicts,
            ["<lib.h>", "liblib.a", "(lib_init)", "linker-script"]
        );
        assert_eq!(solvable.obsoletes, ["lib < 1.0-0"]);
        assert_eq!(solvable.requires, ["<dep.h>"]);
    }

    #[test]
    fn test_whatprovides_literal_and_selector() {
        let mut pool = Pool::new();
        pool.add(Solvable::new("lib-1.0-0.noarch", "local", &info(&[], &["<lib.h>"])).unwrap());
        pool.add(Solvable::new("lib-2.0-0.noarch", "local", &info(&[], &["<lib.h>"])).unwrap());

        assert_eq!(pool.whatprovides("<lib.h>").unwrap().len(), 2);
        assert_eq!(pool.whatprovides("<other.h>").unwrap().len(), 0);
        assert_eq!(pool.whatprovides("lib").unwrap().len(), 2);
        assert_eq!(pool.whatprovides("lib = 2.0-0").unwrap().len(), 1);
        assert_eq!(pool.whatprovides("lib < 2.0-0").unwrap().len(), 1);
        assert_eq!(pool.whatprovides("other").unwrap().len(), 0);
    }

    #[test]
    fn test_self_provide_matches_selector() {
        let solvable =
            Solvable::new("foo-1.0-0.noarch", "local", &PkgInfo::default()).unwrap();
        assert!(solvable.satisfies("foo").unwrap());
        assert!(solvable.satisfies("foo = 1.0-0").unwrap());
        assert!(!solvable.satisfies("foo = 2.0-0").unwrap());
        assert!(!solvable.satisfies("bar").unwrap());
    }
}
