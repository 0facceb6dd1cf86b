//! Lexical relative-path computation.

use std::path::{Component, Path, PathBuf};

/// Express `path` relative to `base`, walking up with `..` as needed.
///
/// Purely lexical: neither path is touched on disk, and both are
/// interpreted against the same root (typically the current directory).
#[must_use]
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path: Vec<Component> = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let base: Vec<Component> = base
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base.len() {
        out.push("..");
    }
    for component in &path[common..] {
        out.push(component);
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
