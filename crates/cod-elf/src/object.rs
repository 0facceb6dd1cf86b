//! Class-generic ELF structure readers.
//!
//! Values widen to 64 bits on read; the writers emit the 64-bit layouts
//! used by the relocatable lift.

use crate::constants::*;
use crate::{ElfError, Result};

/// Read little-endian u16 from bytes.
#[inline]
fn read_le16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Read little-endian u32 from bytes.
#[inline]
fn read_le32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Read little-endian u64 from bytes.
#[inline]
fn read_le64(data: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

/// Validate the magic and return the `EI_CLASS` byte.
///
/// # Errors
/// Fails on truncated data, bad magic, or an unknown class.
pub fn elf_class(data: &[u8]) -> Result<u8> {
    if data.len() < EI_NIDENT {
        return Err(ElfError::TooSmall);
    }
    if &data[..4] != ELF_MAGIC {
        return Err(ElfError::InvalidMagic);
    }
    match data[EI_CLASS] {
        c @ (ELF_CLASS_32 | ELF_CLASS_64) => Ok(c),
        other => Err(ElfError::UnsupportedClass(other)),
    }
}

/// ELF file header, widened to 64-bit fields.
#[derive(Clone, Debug)]
pub struct Ehdr {
    pub ident: [u8; EI_NIDENT],
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u64,
    pub e_phoff: u64,
    pub e_shoff: u64,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl Ehdr {
    /// Parse the file header, dispatching on `EI_CLASS`.
    ///
    /// # Errors
    /// Fails on truncation or a non-little-endian encoding.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let class = elf_class(data)?;
        let size = if class == ELF_CLASS_64 {
            EHDR64_SIZE
        } else {
            EHDR32_SIZE
        };
        if data.len() < size {
            return Err(ElfError::TooSmall);
        }
        if data[EI_DATA] != ELF_DATA_LSB {
            return Err(ElfError::NotLittleEndian);
        }

        let mut ident = [0u8; EI_NIDENT];
        ident.copy_from_slice(&data[..EI_NIDENT]);

        if class == ELF_CLASS_64 {
            Ok(Self {
                ident,
                e_type: read_le16(data, 16),
                e_machine: read_le16(data, 18),
                e_version: read_le32(data, 20),
                e_entry: read_le64(data, 24),
                e_phoff: read_le64(data, 32),
                e_shoff: read_le64(data, 40),
                e_flags: read_le32(data, 48),
                e_ehsize: read_le16(data, 52),
                e_phentsize: read_le16(data, 54),
                e_phnum: read_le16(data, 56),
                e_shentsize: read_le16(data, 58),
                e_shnum: read_le16(data, 60),
                e_shstrndx: read_le16(data, 62),
            })
        } else {
            Ok(Self {
                ident,
                e_type: read_le16(data, 16),
                e_machine: read_le16(data, 18),
                e_version: read_le32(data, 20),
                e_entry: u64::from(read_le32(data, 24)),
                e_phoff: u64::from(read_le32(data, 28)),
                e_shoff: u64::from(read_le32(data, 32)),
                e_flags: read_le32(data, 36),
                e_ehsize: read_le16(data, 40),
                e_phentsize: read_le16(data, 42),
                e_phnum: read_le16(data, 44),
                e_shentsize: read_le16(data, 46),
                e_shnum: read_le16(data, 48),
                e_shstrndx: read_le16(data, 50),
            })
        }
    }

    /// The `EI_CLASS` byte.
    #[must_use]
    pub fn class(&self) -> u8 {
        self.ident[EI_CLASS]
    }

    /// Serialize as an ELF64 header.
    pub fn write64(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.ident);
        out.extend_from_slice(&self.e_type.to_le_bytes());
        out.extend_from_slice(&self.e_machine.to_le_bytes());
        out.extend_from_slice(&self.e_version.to_le_bytes());
        out.extend_from_slice(&self.e_entry.to_le_bytes());
        out.extend_from_slice(&self.e_phoff.to_le_bytes());
        out.extend_from_slice(&self.e_shoff.to_le_bytes());
        out.extend_from_slice(&self.e_flags.to_le_bytes());
        out.extend_from_slice(&self.e_ehsize.to_le_bytes());
        out.extend_from_slice(&self.e_phentsize.to_le_bytes());
        out.extend_from_slice(&self.e_phnum.to_le_bytes());
        out.extend_from_slice(&self.e_shentsize.to_le_bytes());
        out.extend_from_slice(&self.e_shnum.to_le_bytes());
        out.extend_from_slice(&self.e_shstrndx.to_le_bytes());
    }
}

/// Program header, widened to 64-bit fields.
#[derive(Clone, Debug)]
pub struct Phdr {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

impl Phdr {
    /// Parse all program headers described by `ehdr`.
    ///
    /// # Errors
    /// Fails when the table extends past the end of the data.
    pub fn parse_all(data: &[u8], ehdr: &Ehdr) -> Result<Vec<Self>> {
        let entsize = ehdr.e_phentsize as usize;
        let mut headers = Vec::with_capacity(ehdr.e_phnum as usize);
        for i in 0..ehdr.e_phnum as usize {
            let offset = usize::try_from(ehdr.e_phoff).map_err(|_| ElfError::ProgramOutOfBounds)?
                + i * entsize;
            headers.push(Self::parse(data, offset, ehdr.class())?);
        }
        Ok(headers)
    }

    fn parse(data: &[u8], offset: usize, class: u8) -> Result<Self> {
        if class == ELF_CLASS_64 {
            if offset + PHDR64_SIZE > data.len() {
                return Err(ElfError::ProgramOutOfBounds);
            }
            Ok(Self {
                p_type: read_le32(data, offset),
                p_flags: read_le32(data, offset + 4),
                p_offset: read_le64(data, offset + 8),
                p_vaddr: read_le64(data, offset + 16),
                p_paddr: read_le64(data, offset + 24),
                p_filesz: read_le64(data, offset + 32),
                p_memsz: read_le64(data, offset + 40),
                p_align: read_le64(data, offset + 48),
            })
        } else {
            if offset + PHDR32_SIZE > data.len() {
                return Err(ElfError::ProgramOutOfBounds);
            }
            Ok(Self {
                p_type: read_le32(data, offset),
                p_offset: u64::from(read_le32(data, offset + 4)),
                p_vaddr: u64::from(read_le32(data, offset + 8)),
                p_paddr: u64::from(read_le32(data, offset + 12)),
                p_filesz: u64::from(read_le32(data, offset + 16)),
                p_memsz: u64::from(read_le32(data, offset + 20)),
                p_flags: read_le32(data, offset + 24),
                p_align: u64::from(read_le32(data, offset + 28)),
            })
        }
    }
}

/// Section header, widened to 64-bit fields.
#[derive(Clone, Debug)]
pub struct Shdr {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    pub sh_entsize: u64,
}

impl Shdr {
    /// Parse all section headers described by `ehdr`.
    ///
    /// # Errors
    /// Fails when the table extends past the end of the data.
    pub fn parse_all(data: &[u8], ehdr: &Ehdr) -> Result<Vec<Self>> {
        let entsize = ehdr.e_shentsize as usize;
        let mut headers = Vec::with_capacity(ehdr.e_shnum as usize);
        for i in 0..ehdr.e_shnum as usize {
            let offset = usize::try_from(ehdr.e_shoff).map_err(|_| ElfError::SectionOutOfBounds)?
                + i * entsize;
            headers.push(Self::parse(data, offset, ehdr.class())?);
        }
        Ok(headers)
    }

    fn parse(data: &[u8], offset: usize, class: u8) -> Result<Self> {
        if class == ELF_CLASS_64 {
            if offset + SHDR64_SIZE > data.len() {
                return Err(ElfError::SectionOutOfBounds);
            }
            Ok(Self {
                sh_name: read_le32(data, offset),
                sh_type: read_le32(data, offset + 4),
                sh_flags: read_le64(data, offset + 8),
                sh_addr: read_le64(data, offset + 16),
                sh_offset: read_le64(data, offset + 24),
                sh_size: read_le64(data, offset + 32),
                sh_link: read_le32(data, offset + 40),
                sh_info: read_le32(data, offset + 44),
                sh_addralign: read_le64(data, offset + 48),
                sh_entsize: read_le64(data, offset + 56),
            })
        } else {
            if offset + SHDR32_SIZE > data.len() {
                return Err(ElfError::SectionOutOfBounds);
            }
            Ok(Self {
                sh_name: read_le32(data, offset),
                sh_type: read_le32(data, offset + 4),
                sh_flags: u64::from(read_le32(data, offset + 8)),
                sh_addr: u64::from(read_le32(data, offset + 12)),
                sh_offset: u64::from(read_le32(data, offset + 16)),
                sh_size: u64::from(read_le32(data, offset + 20)),
                sh_link: read_le32(data, offset + 24),
                sh_info: read_le32(data, offset + 28),
                sh_addralign: u64::from(read_le32(data, offset + 32)),
                sh_entsize: u64::from(read_le32(data, offset + 36)),
            })
        }
    }

    /// Serialize as an ELF64 section header.
    pub fn write64(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.sh_name.to_le_bytes());
        out.extend_from_slice(&self.sh_type.to_le_bytes());
        out.extend_from_slice(&self.sh_flags.to_le_bytes());
        out.extend_from_slice(&self.sh_addr.to_le_bytes());
        out.extend_from_slice(&self.sh_offset.to_le_bytes());
        out.extend_from_slice(&self.sh_size.to_le_bytes());
        out.extend_from_slice(&self.sh_link.to_le_bytes());
        out.extend_from_slice(&self.sh_info.to_le_bytes());
        out.extend_from_slice(&self.sh_addralign.to_le_bytes());
        out.extend_from_slice(&self.sh_entsize.to_le_bytes());
    }
}

/// Symbol table entry, widened to 64-bit fields.
#[derive(Clone, Debug)]
pub struct Sym {
    pub st_name: u32,
    pub st_info: u8,
    pub st_other: u8,
    pub st_shndx: u16,
    pub st_value: u64,
    pub st_size: u64,
}

impl Sym {
    /// Parse one symbol entry. The two classes order fields differently.
    ///
    /// # Errors
    /// Fails when the entry extends past the end of the data.
    pub fn parse(data: &[u8], offset: usize, class: u8) -> Result<Self> {
        if class == ELF_CLASS_64 {
            if offset + SYM64_SIZE > data.len() {
                return Err(ElfError::SectionOutOfBounds);
            }
            Ok(Self {
                st_name: read_le32(data, offset),
                st_info: data[offset + 4],
                st_other: data[offset + 5],
                st_shndx: read_le16(data, offset + 6),
                st_value: read_le64(data, offset + 8),
                st_size: read_le64(data, offset + 16),
            })
        } else {
            if offset + SYM32_SIZE > data.len() {
                return Err(ElfError::SectionOutOfBounds);
            }
            Ok(Self {
                st_name: read_le32(data, offset),
                st_value: u64::from(read_le32(data, offset + 4)),
                st_size: u64::from(read_le32(data, offset + 8)),
                st_info: data[offset + 12],
                st_other: data[offset + 13],
                st_shndx: read_le16(data, offset + 14),
            })
        }
    }

    /// Symbol binding (upper four bits of `st_info`).
    #[must_use]
    pub fn binding(&self) -> u8 {
        self.st_info >> 4
    }

    /// Serialize as an ELF64 symbol entry.
    pub fn write64(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.st_name.to_le_bytes());
        out.push(self.st_info);
        out.push(self.st_other);
        out.extend_from_slice(&self.st_shndx.to_le_bytes());
        out.extend_from_slice(&self.st_value.to_le_bytes());
        out.extend_from_slice(&self.st_size.to_le_bytes());
    }
}

/// Read a NUL-terminated string out of a string table.
#[must_use]
pub(crate) fn strtab_str(data: &[u8], strtab_offset: usize, index: usize) -> String {
    let start = strtab_offset + index;
    if start >= data.len() {
        return String::new();
    }
    data[start..]
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect()
}
