//! Dependency discovery against a child C toolchain.
//!
//! Two stateless queries, both scoped to a working directory so relative
//! paths in toolchain output stay meaningful: the preprocessor's `-MM -MG`
//! mode lists headers a translation unit names but nobody provides, and a
//! deliberately failing link lists the external symbols an object needs.

mod include;
mod symbols;
mod toolchain;

pub use include::{include_deps, parse_makefile_deps};
pub use symbols::{parse_undefined_symbols, symbol_deps};
pub use toolchain::{Toolchain, arch_to_target, native_arch};

use std::path::PathBuf;

use thiserror::Error;

/// Scanner errors.
#[derive(Error, Debug)]
pub enum DepError {
    #[error("no C toolchain found (install zig or set COD_ZIG)")]
    ToolchainNotFound,
    #[error("include scan of {file} failed:\n{stderr}")]
    IncludeScan { file: PathBuf, stderr: String },
    #[error("symbol scan of {object} failed:\n{stderr}")]
    SymbolScan { object: PathBuf, stderr: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DepError>;
