//! Flatten a linked executable into a raw binary image.

use std::fs;
use std::path::Path;

use crate::object::{Ehdr, Phdr};
use crate::{PT_LOAD, Result};

/// Produce the raw-binary image of `input` at `output`.
///
/// Every `PT_LOAD` segment's file bytes land at the segment's physical
/// address; the image is then extended with zeros to cover the segment's
/// memory size.
///
/// # Errors
/// Fails on unreadable input, a malformed ELF, or an unwritable output.
pub fn objcopy(output: &Path, input: &Path) -> Result<()> {
    let data = fs::read(input)?;
    let image = flatten(&data)?;
    fs::write(output, image)?;
    Ok(())
}

/// Flatten ELF bytes into a raw image in memory.
///
/// # Errors
/// Fails when the ELF headers are malformed or a segment extends past the
/// end of the file.
pub fn flatten(data: &[u8]) -> Result<Vec<u8>> {
    let ehdr = Ehdr::parse(data)?;
    let phdrs = Phdr::parse_all(data, &ehdr)?;

    let mut image = Vec::new();
    for phdr in &phdrs {
        if phdr.p_type != PT_LOAD {
            continue;
        }

        let src = usize::try_from(phdr.p_offset).map_err(|_| crate::ElfError::ProgramOutOfBounds)?;
        let len = usize::try_from(phdr.p_filesz).map_err(|_| crate::ElfError::ProgramOutOfBounds)?;
        let dst = usize::try_from(phdr.p_paddr).map_err(|_| crate::ElfError::ProgramOutOfBounds)?;
        let memsz = usize::try_from(phdr.p_memsz).map_err(|_| crate::ElfError::ProgramOutOfBounds)?;
        if src + len > data.len() {
            return Err(crate::ElfError::ProgramOutOfBounds);
        }

        if image.len() < dst + len {
            image.resize(dst + len, 0);
        }
        image[dst..dst + len].copy_from_slice(&data[src..src + len]);
        if image.len() < dst + memsz {
            image.resize(dst + memsz, 0);
        }
    }
    Ok(image)
}
