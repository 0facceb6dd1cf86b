//! Compile-time repository plugin registry.

use std::path::Path;

use cod_manifest::RepoSpec;

use crate::{LocalRepo, Repo, RepoError, Result};

/// Construct the repository a `[repo.<name>]` table describes.
///
/// The `type` key dispatches into a fixed table of plugin constructors;
/// projects pin the supported repository kinds at compile time. Relative
/// plugin paths resolve against the project root.
///
/// # Errors
/// Fails on an unknown `type` or missing plugin options.
pub fn open_repo(project_root: &Path, name: &str, spec: &RepoSpec) -> Result<Box<dyn Repo>> {
    match spec.kind.as_str() {
        "local" => {
            let path = spec.option("path").ok_or_else(|| RepoError::MissingOption {
                name: name.to_owned(),
                key: "path".to_owned(),
            })?;
            Ok(Box::new(LocalRepo::new(project_root.join(path))))
        }
        other => Err(RepoError::UnknownType(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(toml: &str) -> RepoSpec {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_local_plugin() {
        let repo = open_repo(Path::new("/proj"), "vendor", &spec("type = \"local\"\npath = \"pkgs\"\n"));
        assert!(repo.is_ok());
    }

    #[test]
    fn test_local_requires_path() {
        let result = open_repo(Path::new("/proj"), "vendor", &spec("type = \"local\"\n"));
        assert!(matches!(result, Err(RepoError::MissingOption { .. })));
    }

    #[test]
    fn test_unknown_type() {
        let result = open_repo(Path::new("/proj"), "vendor", &spec("type = \"http\"\nurl = \"x\"\n"));
        assert!(matches!(result, Err(RepoError::UnknownType(_))));
    }
}
