//! C toolchain discovery and target naming.

use std::env;
use std::path::PathBuf;

use crate::{DepError, Result};

/// The external toolchain driver. `zig` front-ends a clang/lld toolchain
/// that can target every architecture we build for, so one discovered
/// binary covers compiling, assembling and linking.
#[derive(Clone, Debug)]
pub struct Toolchain {
    zig: PathBuf,
}

impl Toolchain {
    /// Locate the toolchain: `COD_ZIG` override first, then `PATH`.
    ///
    /// # Errors
    /// Fails when no `zig` executable can be found.
    pub fn find() -> Result<Self> {
        if let Some(zig) = env::var_os("COD_ZIG") {
            return Ok(Self { zig: zig.into() });
        }
        let path = env::var_os("PATH").ok_or(DepError::ToolchainNotFound)?;
        for dir in env::split_paths(&path) {
            let candidate = dir.join("zig");
            if candidate.is_file() {
                return Ok(Self { zig: candidate });
            }
        }
        Err(DepError::ToolchainNotFound)
    }

    /// The driver binary.
    #[must_use]
    pub fn zig(&self) -> &PathBuf {
        &self.zig
    }

    /// Compiler invocation prefix for one target: `zig clang --target=…`.
    #[must_use]
    pub fn clang(&self, arch: &str) -> Vec<String> {
        vec![
            self.zig.to_string_lossy().into_owned(),
            "clang".to_owned(),
            format!("--target={arch}-unknown-unknown"),
        ]
    }

    /// Link-driver invocation prefix: `zig cc` plus the target arguments.
    #[must_use]
    pub fn cc(&self, target: &[String]) -> Vec<String> {
        let mut argv = vec![self.zig.to_string_lossy().into_owned(), "cc".to_owned()];
        argv.extend(target.iter().cloned());
        argv
    }
}

/// Target arguments for the link driver.
///
/// The 32-bit x86 family shares one freestanding target and differs only in
/// `-mcpu`; everything else maps straight through.
#[must_use]
pub fn arch_to_target(arch: &str) -> Vec<String> {
    match arch {
        "i386" | "i486" | "i586" | "i686" => vec![
            "--target=x86-freestanding-none".to_owned(),
            format!("-mcpu={arch}"),
        ],
        _ => vec![format!("--target={arch}-freestanding-none")],
    }
}

/// The architecture tag of the machine we are running on.
#[must_use]
pub fn native_arch() -> String {
    match env::consts::ARCH {
        "x86" => "i686".to_owned(),
        arch => arch.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arch_to_target_x86_family() {
        assert_eq!(
            arch_to_target("i686"),
            ["--target=x86-freestanding-none", "-mcpu=i686"]
        );
        assert_eq!(
            arch_to_target("i386"),
            ["--target=x86-freestanding-none", "-mcpu=i386"]
        );
    }

    #[test]
    fn test_arch_to_target_other() {
        assert_eq!(arch_to_target("x86_64"), ["--target=x86_64-freestanding-none"]);
        assert_eq!(
            arch_to_target("aarch64"),
            ["--target=aarch64-freestanding-none"]
        );
    }

    #[test]
    fn test_clang_prefix() {
        let toolchain = Toolchain {
            zig: PathBuf::from("/opt/zig/zig"),
        };
        assert_eq!(
            toolchain.clang("x86_64"),
            ["/opt/zig/zig", "clang", "--target=x86_64-unknown-unknown"]
        );
    }
}
