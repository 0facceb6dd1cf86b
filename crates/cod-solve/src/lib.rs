//! Dependency resolution and the lockfile.
//!
//! The resolver reasons over capability strings. Every package becomes a
//! solvable whose provides carry its self-capability (`name = evr`), its
//! exported headers, archive, linker script and symbols; the exclusive
//! capabilities double as conflicts so no two installed packages can claim
//! the same header or archive. Resolution picks exactly one provider per
//! requested capability, closes over the provider's own requirements, and
//! refuses to guess when distinct packages could serve: the user must pin
//! a choice with `install`.

mod lock;
mod pool;
mod solver;

pub use lock::{Lock, ProfileGuard};
pub use pool::{Pool, Solvable};
pub use solver::{Transaction, solve};

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A reported ambiguity: one capability, several candidate packages.
#[derive(Clone, Debug)]
pub struct Alternative {
    pub capability: String,
    pub choices: Vec<String>,
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " {}", self.capability)?;
        for (i, choice) in self.choices.iter().enumerate() {
            writeln!(f, "  {i}: {choice}")?;
        }
        Ok(())
    }
}

/// Resolver and lockfile errors.
#[derive(Error, Debug)]
pub enum SolveError {
    #[error("{}", format_problems(.0))]
    Problems(Vec<String>),
    #[error("{}", format_alternatives(.0))]
    Alternatives(Vec<Alternative>),
    #[error("malformed lockfile {path} at line {line}")]
    BadLockLine { path: PathBuf, line: usize },
    #[error("lockfile names unknown repository {0:?}")]
    UnknownRepo(String),
    #[error(transparent)]
    Repo(#[from] cod_repo::RepoError),
    #[error(transparent)]
    Pkg(#[from] cod_pkg::PkgError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SolveError>;

fn format_problems(problems: &[String]) -> String {
    let mut out = String::new();
    for (i, problem) in problems.iter().enumerate() {
        out.push_str(&format!("Problem {}/{}: {problem}\n", i + 1, problems.len()));
    }
    out.pop();
    out
}

fn format_alternatives(alternatives: &[Alternative]) -> String {
    let mut out = String::from("Alternatives exist:\n");
    for alternative in alternatives {
        out.push_str(&alternative.to_string());
    }
    out.push_str("Install one of the choices to proceed");
    out
}
