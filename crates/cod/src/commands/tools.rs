//! Internal tool verbs the generated ninja rules call back into.

use std::path::{Path, PathBuf};

use cod::Result;

pub fn cmd_ar(archive: &Path, members: &[PathBuf]) -> Result<()> {
    // Always rewrite: the member set may have changed even if mtimes lie.
    if archive.exists() {
        std::fs::remove_file(archive)?;
    }
    if let Some(parent) = archive.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let members: Vec<&Path> = members.iter().map(PathBuf::as_path).collect();
    cod_ar::write_thin(archive, &members)?;
    Ok(())
}

pub fn cmd_objcopy(output: &Path, input: &Path) -> Result<()> {
    cod_elf::objcopy(output, input)?;
    Ok(())
}

pub fn cmd_objconv(output: &Path, input: &Path) -> Result<()> {
    cod_elf::objconv(output, input)?;
    Ok(())
}
