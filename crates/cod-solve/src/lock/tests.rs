use super::*;

use std::cell::RefCell;
use std::collections::BTreeMap;

/// In-memory repository for resolver tests.
struct TestRepo {
    packages: BTreeMap<String, PkgInfo>,
    fetched: RefCell<Vec<String>>,
}

impl TestRepo {
    fn new(packages: &[(&str, PkgInfo)]) -> Box<dyn Repo> {
        Box::new(Self {
            packages: packages
                .iter()
                .map(|(id, info)| ((*id).to_owned(), info.clone()))
                .collect(),
            fetched: RefCell::new(Vec::new()),
        })
    }
}

impl Repo for TestRepo {
    fn ids(&self) -> Vec<String> {
        self.packages.keys().cloned().collect()
    }

    fn fetch(&self, id: &str) -> cod_repo::Result<()> {
        self.fetched.borrow_mut().push(id.to_owned());
        Ok(())
    }

    fn info(&self, id: &str) -> cod_repo::Result<PkgInfo> {
        self.packages
            .get(id)
            .cloned()
            .ok_or_else(|| cod_repo::RepoError::UnknownPackage(id.to_owned()))
    }

    fn path(&self, id: &str) -> cod_repo::Result<PathBuf> {
        Ok(PathBuf::from("/repo").join(id))
    }
}

fn info(requires: &[&str], provides: &[&str]) -> PkgInfo {
    PkgInfo {
        requires: requires.iter().map(|s| (*s).to_owned()).collect(),
        provides: provides.iter().map(|s| (*s).to_owned()).collect(),
    }
}

fn repos(packages: &[(&str, PkgInfo)]) -> BTreeMap<String, Box<dyn Repo>> {
    let mut repos = BTreeMap::new();
    repos.insert("local".to_owned(), TestRepo::new(packages));
    repos
}

#[test]
fn test_install_writes_sorted_lockfile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cod.lock");
    let mut lock = Lock::open(
        &path,
        repos(&[
            ("zlib-1.0-0.noarch", info(&[], &["<z.h>"])),
            ("alib-1.0-0.noarch", info(&[], &["<a.h>"])),
        ]),
    )
    .unwrap();

    lock.with_profile("dev.x86_64", |profile| {
        profile.install_provides(&["<z.h>".to_owned(), "<a.h>".to_owned()])
    })
    .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "[dev.x86_64]\nalib-1.0-0.noarch = local\nzlib-1.0-0.noarch = local\n\n"
    );
}

#[test]
fn test_reopen_replays_installed_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cod.lock");
    let packages = [("lib-1.0-0.noarch", info(&[], &["<lib.h>"]))];

    let mut lock = Lock::open(&path, repos(&packages)).unwrap();
    lock.with_profile("dev.x86_64", |profile| {
        profile.install_provides(&["<lib.h>".to_owned()])
    })
    .unwrap();

    let lock = Lock::open(&path, repos(&packages)).unwrap();
    assert!(!lock.dirty());
    let installed = lock.packages("dev.x86_64");
    assert_eq!(installed.len(), 1);
    assert_eq!(installed[0].0.to_string(), "lib-1.0-0.noarch");
    assert_eq!(installed[0].1, "local");
}

#[test]
fn test_reinstall_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cod.lock");
    let packages = [("lib-1.0-0.noarch", info(&[], &["<lib.h>"]))];

    let mut lock = Lock::open(&path, repos(&packages)).unwrap();
    lock.with_profile("dev.x86_64", |profile| {
        profile.install_provides(&["<lib.h>".to_owned()])
    })
    .unwrap();
    let first = std::fs::read_to_string(&path).unwrap();

    let mut lock = Lock::open(&path, repos(&packages)).unwrap();
    lock.with_profile("dev.x86_64", |profile| {
        profile.install_provides(&["<lib.h>".to_owned()])?;
        assert!(!profile.dirty());
        Ok(())
    })
    .unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
}

#[test]
fn test_profiles_are_partitioned() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cod.lock");
    let packages = [
        ("lib-1.0-0.i686", info(&[], &["<lib.h>"])),
        ("other-1.0-0.noarch", info(&[], &["<other.h>"])),
    ];

    let mut lock = Lock::open(&path, repos(&packages)).unwrap();
    lock.with_profile("dev.i686", |profile| {
        profile.install_provides(&["<lib.h>".to_owned()])
    })
    .unwrap();
    lock.with_profile("release.x86_64", |profile| {
        profile.install_provides(&["<other.h>".to_owned()])
    })
    .unwrap();

    assert_eq!(lock.packages("dev.i686").len(), 1);
    assert_eq!(lock.packages("release.x86_64").len(), 1);
    assert!(lock.packages("dev.x86_64").is_empty());

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[dev.i686]\nlib-1.0-0.i686 = local\n"));
    assert!(text.contains("[release.x86_64]\nother-1.0-0.noarch = local\n"));
}

#[test]
fn test_failed_block_does_not_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cod.lock");
    let mut lock = Lock::open(&path, repos(&[])).unwrap();

    let result = lock.with_profile("dev.x86_64", |profile| {
        profile.install_provides(&["<ghost.h>".to_owned()])
    });
    assert!(matches!(result, Err(SolveError::Problems(_))));
    assert!(!path.exists());
}

#[test]
fn test_install_from_symbols_wraps_capabilities() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cod.lock");
    let packages = [(
        "mathlib-1.0-0.x86_64",
        info(&[], &["<math.h>", "libmathlib.a", "(mat_mul)"]),
    )];

    let mut lock = Lock::open(&path, repos(&packages)).unwrap();
    lock.with_profile("dev.x86_64", |profile| {
        profile.install_from_symbols(["mat_mul"])?;
        assert!(profile.dirty());
        Ok(())
    })
    .unwrap();
    assert_eq!(lock.packages("dev.x86_64").len(), 1);
}

#[test]
fn test_lockfile_with_unknown_repo() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cod.lock");
    std::fs::write(&path, "[dev.x86_64]\nlib-1.0-0.noarch = ghost\n").unwrap();

    let result = Lock::open(&path, repos(&[]));
    assert!(matches!(result, Err(SolveError::UnknownRepo(_))));
}

#[test]
fn test_malformed_lockfile_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cod.lock");
    std::fs::write(&path, "[dev.x86_64]\nnot an entry\n").unwrap();

    let result = Lock::open(&path, repos(&[]));
    assert!(matches!(result, Err(SolveError::BadLockLine { line: 2, .. })));
}

#[test]
fn test_alternatives_surface_through_guard() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cod.lock");
    let packages = [
        ("lib1-1.0-0.noarch", info(&[], &["<x.h>"])),
        ("lib2-1.0-0.noarch", info(&[], &["<x.h>"])),
    ];

    let mut lock = Lock::open(&path, repos(&packages)).unwrap();
    let result = lock.with_profile("dev.x86_64", |profile| {
        profile.install_provides(&["<x.h>".to_owned()])
    });
    let Err(SolveError::Alternatives(alternatives)) = result else {
        panic!("expected alternatives");
    };
    let message = SolveError::Alternatives(alternatives).to_string();
    assert!(message.contains("Alternatives exist:"));
    assert!(message.contains("0: lib1-1.0-0.noarch"));
    assert!(message.contains("Install one of the choices to proceed"));
}
