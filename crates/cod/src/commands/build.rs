//! The `build`, `install` and `package` commands.

use cod::{Result, Workspace};

fn workspace() -> Result<Workspace> {
    Workspace::open(std::env::current_dir()?)
}

pub fn cmd_build(arch: Option<&str>, profile: &str) -> Result<()> {
    workspace()?.build(arch, profile, false)
}

pub fn cmd_install(arch: Option<&str>, profile: &str, packages: &[String]) -> Result<()> {
    workspace()?.install(arch, profile, packages)
}

pub fn cmd_package(arch: Option<&str>) -> Result<()> {
    workspace()?.package(arch)
}
