//! Transitive symbol closure over archive maps.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::PathBuf;

use rustc_hash::FxHashMap;

use cod_ar::ArMember;

use crate::{Error, Result};

/// Group an armap by member: which symbols does each member define.
///
/// # Errors
/// Fails when the archive is not thin (members must resolve to paths).
pub fn obj_defs(armap: &[(String, ArMember)]) -> Result<BTreeMap<PathBuf, BTreeSet<String>>> {
    let mut defs: BTreeMap<PathBuf, BTreeSet<String>> = BTreeMap::new();
    for (symbol, member) in armap {
        let path = member
            .path()
            .ok_or_else(|| Error::NotAThinMember(symbol.clone()))?;
        defs.entry(path.to_path_buf())
            .or_default()
            .insert(symbol.clone());
    }
    Ok(defs)
}

/// Close each executable member's undefined symbols over the library maps.
///
/// Starting from a member's own undefined set (`bin_deps`), symbols found
/// in a library (`symbols`) pull that library member in, along with its
/// own undefined symbols (`lib_deps`); anything not defined anywhere lands
/// in the returned global undefined set.
#[must_use]
pub fn close_undefined(
    bin_defs: &BTreeMap<PathBuf, BTreeSet<String>>,
    bin_deps: &BTreeMap<PathBuf, Vec<String>>,
    symbols: &FxHashMap<String, PathBuf>,
    lib_deps: &FxHashMap<PathBuf, Vec<String>>,
) -> BTreeSet<String> {
    let mut undefined = BTreeSet::new();

    for (member, initial) in bin_deps {
        let mut defs = bin_defs.get(member).cloned().unwrap_or_default();
        let mut queue: VecDeque<String> = initial.iter().cloned().collect();

        while let Some(symbol) = queue.pop_front() {
            if undefined.contains(&symbol) || defs.contains(&symbol) {
                continue;
            }
            if let Some(provider) = symbols.get(&symbol) {
                defs.insert(symbol);
                if let Some(deps) = lib_deps.get(provider) {
                    queue.extend(deps.iter().cloned());
                }
            } else {
                undefined.insert(symbol);
            }
        }
    }

    undefined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_obj_defs_groups_by_member() {
        let armap = vec![
            ("main".to_owned(), ArMember::Path(path("obj/main.o"))),
            ("helper".to_owned(), ArMember::Path(path("obj/main.o"))),
            ("init".to_owned(), ArMember::Path(path("obj/init.o"))),
        ];
        let defs = obj_defs(&armap).unwrap();
        assert_eq!(defs[&path("obj/main.o")], set(&["helper", "main"]));
        assert_eq!(defs[&path("obj/init.o")], set(&["init"]));
    }

    #[test]
    fn test_obj_defs_rejects_regular_archives() {
        let armap = vec![("main".to_owned(), ArMember::Offset(68))];
        assert!(matches!(
            obj_defs(&armap),
            Err(Error::NotAThinMember(_))
        ));
    }

    #[test]
    fn test_closed_program_has_no_undefined() {
        let bin_defs = BTreeMap::from([(path("main.o"), set(&["main"]))]);
        let bin_deps = BTreeMap::from([(path("main.o"), strings(&["foo_add"]))]);
        let symbols = FxHashMap::from_iter([("foo_add".to_owned(), path("foo.o"))]);
        let lib_deps = FxHashMap::from_iter([(path("foo.o"), strings(&[]))]);

        assert!(close_undefined(&bin_defs, &bin_deps, &symbols, &lib_deps).is_empty());
    }

    #[test]
    fn test_transitive_library_pull() {
        // main needs a; a's member needs b; b's member needs ghost.
        let bin_defs = BTreeMap::from([(path("main.o"), set(&["main"]))]);
        let bin_deps = BTreeMap::from([(path("main.o"), strings(&["a"]))]);
        let symbols = FxHashMap::from_iter([
            ("a".to_owned(), path("a.o")),
            ("b".to_owned(), path("b.o")),
        ]);
        let lib_deps = FxHashMap::from_iter([
            (path("a.o"), strings(&["b"])),
            (path("b.o"), strings(&["ghost"])),
        ]);

        let undefined = close_undefined(&bin_defs, &bin_deps, &symbols, &lib_deps);
        assert_eq!(undefined, set(&["ghost"]));
    }

    #[test]
    fn test_self_defined_symbols_are_skipped() {
        let bin_defs = BTreeMap::from([(path("main.o"), set(&["main", "helper"]))]);
        let bin_deps = BTreeMap::from([(path("main.o"), strings(&["helper", "puts"]))]);
        let symbols = FxHashMap::default();
        let lib_deps = FxHashMap::default();

        let undefined = close_undefined(&bin_defs, &bin_deps, &symbols, &lib_deps);
        assert_eq!(undefined, set(&["puts"]));
    }

    #[test]
    fn test_mutually_recursive_libraries_terminate() {
        let bin_defs = BTreeMap::from([(path("main.o"), set(&["main"]))]);
        let bin_deps = BTreeMap::from([(path("main.o"), strings(&["a"]))]);
        let symbols = FxHashMap::from_iter([
            ("a".to_owned(), path("a.o")),
            ("b".to_owned(), path("b.o")),
        ]);
        let lib_deps = FxHashMap::from_iter([
            (path("a.o"), strings(&["b"])),
            (path("b.o"), strings(&["a"])),
        ]);

        assert!(close_undefined(&bin_defs, &bin_deps, &symbols, &lib_deps).is_empty());
    }
}
