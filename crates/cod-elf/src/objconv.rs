//! Lift an i386 `REL` relocatable object to an x86_64 `RELA` one.
//!
//! The section table and contents are preserved in input order; only the
//! class-dependent layouts change. `SHT_REL` entries carry their addend in
//! the target section, so the target must already have been emitted when
//! the relocation section is converted: the addend is read out of the
//! output image, zeroed in place, and moved into the explicit `r_addend`.

use std::fs;
use std::path::Path;

use crate::constants::*;
use crate::object::{Ehdr, Shdr, Sym};
use crate::{ElfError, Result};

/// Map an i386 relocation type to its x86_64 counterpart.
///
/// Returns `(type, addend byte width, addend signedness)`.
fn map_reloc(type32: u8) -> Result<(u32, usize, bool)> {
    match type32 {
        R_386_32 => Ok((R_X86_64_32, 4, false)),
        R_386_PC32 => Ok((R_X86_64_PC32, 4, true)),
        R_386_16 => Ok((R_X86_64_16, 2, false)),
        R_386_PC16 => Ok((R_X86_64_PC16, 2, true)),
        R_386_8 => Ok((R_X86_64_8, 1, false)),
        R_386_PC8 => Ok((R_X86_64_PC8, 1, true)),
        other => Err(ElfError::UnsupportedRelocation(other)),
    }
}

fn check_ehdr(ehdr: &Ehdr) -> Result<()> {
    if ehdr.class() != ELF_CLASS_32 {
        return Err(ElfError::UnsupportedClass(ehdr.class()));
    }
    if ehdr.e_version != 1 || ehdr.ident[EI_VERSION] != ELF_VERSION_CURRENT {
        return Err(ElfError::BadVersion);
    }
    if ehdr.ident[EI_OSABI] != ELF_OSABI_SYSV {
        return Err(ElfError::BadOsAbi);
    }
    if ehdr.e_type != ET_REL {
        return Err(ElfError::NotRelocatable);
    }
    if ehdr.e_machine != EM_386 {
        return Err(ElfError::UnsupportedMachine(ehdr.e_machine));
    }
    if ehdr.e_ehsize as usize != EHDR32_SIZE {
        return Err(ElfError::SizeMismatch {
            what: "ELF header",
            expected: EHDR32_SIZE,
            actual: ehdr.e_ehsize as usize,
        });
    }
    if ehdr.e_shentsize as usize != SHDR32_SIZE {
        return Err(ElfError::SizeMismatch {
            what: "section header",
            expected: SHDR32_SIZE,
            actual: ehdr.e_shentsize as usize,
        });
    }
    Ok(())
}

fn section_bytes(data: &[u8], shdr: &Shdr) -> Result<(usize, usize)> {
    let off = usize::try_from(shdr.sh_offset).map_err(|_| ElfError::SectionOutOfBounds)?;
    let size = usize::try_from(shdr.sh_size).map_err(|_| ElfError::SectionOutOfBounds)?;
    if off + size > data.len() {
        return Err(ElfError::SectionOutOfBounds);
    }
    Ok((off, size))
}

fn read_addend(out: &[u8], pos: usize, nbytes: usize, signed: bool) -> Result<i64> {
    if pos + nbytes > out.len() {
        return Err(ElfError::SectionOutOfBounds);
    }
    let bytes = &out[pos..pos + nbytes];
    let mut value: u64 = 0;
    for (i, &b) in bytes.iter().enumerate() {
        value |= u64::from(b) << (8 * i);
    }
    if signed {
        let shift = 64 - 8 * nbytes as u32;
        #[allow(clippy::cast_possible_wrap)]
        Ok(((value << shift) as i64) >> shift)
    } else {
        #[allow(clippy::cast_possible_wrap)]
        Ok(value as i64)
    }
}

/// Convert the i386 relocatable object at `input` and write the x86_64
/// result to `output`.
///
/// # Errors
/// Fails on unreadable input, anything but a supported ELF32 `REL` object,
/// or an unwritable output.
pub fn objconv(output: &Path, input: &Path) -> Result<()> {
    let data = fs::read(input)?;
    let lifted = lift(&data)?;
    fs::write(output, lifted)?;
    Ok(())
}

/// Lift ELF32 bytes to ELF64 in memory.
///
/// # Errors
/// See [`objconv`].
pub fn lift(data: &[u8]) -> Result<Vec<u8>> {
    let ehdr32 = Ehdr::parse(data)?;
    check_ehdr(&ehdr32)?;
    let shdrs32 = Shdr::parse_all(data, &ehdr32)?;

    let mut out = vec![0u8; EHDR64_SIZE];
    let mut shdrs64: Vec<Shdr> = Vec::with_capacity(shdrs32.len());

    for (index, shdr32) in shdrs32.iter().enumerate() {
        let mut shdr64 = shdr32.clone();
        shdr64.sh_offset = out.len() as u64;

        match shdr32.sh_type {
            SHT_NULL | SHT_PROGBITS | SHT_STRTAB | SHT_LLVM_ADDRSIG => {
                let (off, size) = section_bytes(data, shdr32)?;
                out.extend_from_slice(&data[off..off + size]);
            }
            _ if shdr32.sh_size == 0 => {}
            SHT_NOBITS => {}
            SHT_SYMTAB => {
                if shdr32.sh_entsize as usize != SYM32_SIZE {
                    return Err(ElfError::SizeMismatch {
                        what: "symbol entry",
                        expected: SYM32_SIZE,
                        actual: shdr32.sh_entsize as usize,
                    });
                }
                let (off, size) = section_bytes(data, shdr32)?;
                shdr64.sh_entsize = SYM64_SIZE as u64;
                for entry in (off..off + size).step_by(SYM32_SIZE) {
                    let sym = Sym::parse(data, entry, ELF_CLASS_32)?;
                    sym.write64(&mut out);
                }
                shdr64.sh_size = out.len() as u64 - shdr64.sh_offset;
            }
            SHT_REL => {
                if shdr32.sh_entsize as usize != REL32_SIZE {
                    return Err(ElfError::SizeMismatch {
                        what: "relocation entry",
                        expected: REL32_SIZE,
                        actual: shdr32.sh_entsize as usize,
                    });
                }
                let target = shdr32.sh_info as usize;
                if index <= target {
                    return Err(ElfError::RelocationOrder { rel: index, target });
                }
                let target_off = usize::try_from(shdrs64[target].sh_offset)
                    .map_err(|_| ElfError::SectionOutOfBounds)?;

                shdr64.sh_type = SHT_RELA;
                shdr64.sh_entsize = RELA64_SIZE as u64;

                let (off, size) = section_bytes(data, shdr32)?;
                let mut relas: Vec<(u64, u64, i64)> = Vec::new();
                for entry in (off..off + size).step_by(REL32_SIZE) {
                    let r_offset = u32::from_le_bytes([
                        data[entry],
                        data[entry + 1],
                        data[entry + 2],
                        data[entry + 3],
                    ]);
                    let r_info = u32::from_le_bytes([
                        data[entry + 4],
                        data[entry + 5],
                        data[entry + 6],
                        data[entry + 7],
                    ]);
                    #[allow(clippy::cast_possible_truncation)]
                    let type32 = (r_info & 0xFF) as u8;
                    let sym = u64::from(r_info >> 8);
                    let (type64, nbytes, signed) = map_reloc(type32)?;

                    let addend_pos = target_off + r_offset as usize;
                    let addend = read_addend(&out, addend_pos, nbytes, signed)?;
                    out[addend_pos..addend_pos + nbytes].fill(0);

                    relas.push((u64::from(r_offset), (sym << 32) | u64::from(type64), addend));
                }

                for (r_offset, r_info, r_addend) in relas {
                    out.extend_from_slice(&r_offset.to_le_bytes());
                    out.extend_from_slice(&r_info.to_le_bytes());
                    out.extend_from_slice(&r_addend.to_le_bytes());
                }
                shdr64.sh_size = out.len() as u64 - shdr64.sh_offset;
            }
            other => return Err(ElfError::UnsupportedSectionType(other)),
        }

        shdrs64.push(shdr64);
    }

    let e_shoff = out.len() as u64;
    for shdr64 in &shdrs64 {
        shdr64.write64(&mut out);
    }

    let mut ehdr64 = ehdr32;
    ehdr64.ident[EI_CLASS] = ELF_CLASS_64;
    ehdr64.e_machine = EM_X86_64;
    ehdr64.e_entry = 0;
    ehdr64.e_phoff = 0;
    ehdr64.e_phentsize = 0;
    ehdr64.e_phnum = 0;
    ehdr64.e_shoff = e_shoff;
    ehdr64.e_ehsize = EHDR64_SIZE as u16;
    ehdr64.e_shentsize = SHDR64_SIZE as u16;

    let mut header = Vec::with_capacity(EHDR64_SIZE);
    ehdr64.write64(&mut header);
    out[..EHDR64_SIZE].copy_from_slice(&header);

    Ok(out)
}

#[cfg(test)]
mod tests;
