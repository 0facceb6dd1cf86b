//! Defined-symbol extraction for archive indexing.

use crate::constants::*;
use crate::object::{Ehdr, Shdr, Sym, strtab_str};
use crate::{ElfError, Result};

/// List the global and weak symbols an object defines.
///
/// These are the names the archiver records in the armap; undefined and
/// local entries are skipped. Works on both ELF classes.
///
/// # Errors
/// Fails when the object's headers or symbol table are malformed.
pub fn defined_symbols(data: &[u8]) -> Result<Vec<String>> {
    let ehdr = Ehdr::parse(data)?;
    let shdrs = Shdr::parse_all(data, &ehdr)?;

    let Some(symtab) = shdrs.iter().find(|s| s.sh_type == SHT_SYMTAB) else {
        return Ok(Vec::new());
    };
    let strtab = shdrs
        .get(symtab.sh_link as usize)
        .ok_or(ElfError::SectionOutOfBounds)?;
    let strtab_off =
        usize::try_from(strtab.sh_offset).map_err(|_| ElfError::SectionOutOfBounds)?;

    let entsize = if ehdr.class() == ELF_CLASS_64 {
        SYM64_SIZE
    } else {
        SYM32_SIZE
    };
    if symtab.sh_entsize as usize != entsize {
        return Err(ElfError::SizeMismatch {
            what: "symbol entry",
            expected: entsize,
            actual: symtab.sh_entsize as usize,
        });
    }

    let off = usize::try_from(symtab.sh_offset).map_err(|_| ElfError::SectionOutOfBounds)?;
    let size = usize::try_from(symtab.sh_size).map_err(|_| ElfError::SectionOutOfBounds)?;
    if off + size > data.len() {
        return Err(ElfError::SectionOutOfBounds);
    }

    let mut names = Vec::new();
    for entry in (off..off + size).step_by(entsize) {
        let sym = Sym::parse(data, entry, ehdr.class())?;
        if sym.st_shndx == SHN_UNDEF {
            continue;
        }
        if !matches!(sym.binding(), STB_GLOBAL | STB_WEAK) {
            continue;
        }
        let name = strtab_str(data, strtab_off, sym.st_name as usize);
        if !name.is_empty() {
            names.push(name);
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym32(st_name: u32, st_info: u8, st_shndx: u16) -> Vec<u8> {
        let mut sym = vec![0u8; SYM32_SIZE];
        sym[..4].copy_from_slice(&st_name.to_le_bytes());
        sym[12] = st_info;
        sym[14..16].copy_from_slice(&st_shndx.to_le_bytes());
        sym
    }

    // ELF32 with a NULL section, a symtab, and its strtab.
    fn object_with_syms(syms: &[Vec<u8>], strtab: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; EHDR32_SIZE];
        out[..4].copy_from_slice(ELF_MAGIC);
        out[EI_CLASS] = ELF_CLASS_32;
        out[EI_DATA] = ELF_DATA_LSB;
        out[EI_VERSION] = ELF_VERSION_CURRENT;

        let symtab_off = out.len() as u32;
        for sym in syms {
            out.extend_from_slice(sym);
        }
        let strtab_off = out.len() as u32;
        out.extend_from_slice(strtab);

        let shoff = out.len() as u32;
        let mut write_shdr = |sh_type: u32, off: u32, size: u32, link: u32, entsize: u32| {
            let mut shdr = [0u8; SHDR32_SIZE];
            shdr[4..8].copy_from_slice(&sh_type.to_le_bytes());
            shdr[16..20].copy_from_slice(&off.to_le_bytes());
            shdr[20..24].copy_from_slice(&size.to_le_bytes());
            shdr[24..28].copy_from_slice(&link.to_le_bytes());
            shdr[36..40].copy_from_slice(&entsize.to_le_bytes());
            shdr
        };
        let shdrs = [
            write_shdr(SHT_NULL, 0, 0, 0, 0),
            write_shdr(
                SHT_SYMTAB,
                symtab_off,
                (syms.len() * SYM32_SIZE) as u32,
                2,
                SYM32_SIZE as u32,
            ),
            write_shdr(SHT_STRTAB, strtab_off, strtab.len() as u32, 0, 0),
        ];
        for shdr in shdrs {
            out.extend_from_slice(&shdr);
        }

        out[32..36].copy_from_slice(&shoff.to_le_bytes());
        out[46..48].copy_from_slice(&(SHDR32_SIZE as u16).to_le_bytes());
        out[48..50].copy_from_slice(&3u16.to_le_bytes());
        out
    }

    #[test]
    fn test_defined_symbols_skips_undef_and_local() {
        let syms = [
            sym32(0, 0, 0),                      // null entry
            sym32(1, STB_GLOBAL << 4, 1),        // "add", defined
            sym32(5, STB_GLOBAL << 4, SHN_UNDEF), // "memcpy", undefined
            sym32(12, 0, 1),                     // "tmp", local
            sym32(16, STB_WEAK << 4, 1),         // "init", weak
        ];
        let strtab = b"\0add\0memcpy\0tmp\0init\0";
        let obj = object_with_syms(&syms, strtab);
        assert_eq!(defined_symbols(&obj).unwrap(), ["add", "init"]);
    }

    #[test]
    fn test_no_symtab_is_empty() {
        let obj = object_with_syms(&[], b"\0");
        // Strip the symtab by relabeling it NOBITS.
        let mut obj = obj;
        let shoff = u32::from_le_bytes(obj[32..36].try_into().unwrap()) as usize;
        let symtab_type = shoff + SHDR32_SIZE + 4;
        obj[symtab_type..symtab_type + 4].copy_from_slice(&SHT_NOBITS.to_le_bytes());
        assert_eq!(defined_symbols(&obj).unwrap(), Vec::<String>::new());
    }
}
