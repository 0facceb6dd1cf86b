//! ELF object tooling for the build driver.
//!
//! Three consumers: the archiver needs the defined-symbol list of an object
//! to build an armap, `objcopy` flattens a linked executable into a raw
//! binary image, and `objconv` lifts an i386 relocatable object into an
//! x86_64 one so 32-bit libraries can be linked into 64-bit programs.

mod constants;
mod object;
mod objconv;
mod objcopy;
mod symbols;

pub use constants::*;
pub use object::{Ehdr, Phdr, Shdr, Sym, elf_class};
pub use objconv::objconv;
pub use objcopy::objcopy;
pub use symbols::defined_symbols;

use thiserror::Error;

/// ELF parsing and rewriting errors.
#[derive(Error, Debug)]
pub enum ElfError {
    #[error("ELF data too small")]
    TooSmall,
    #[error("invalid ELF magic number")]
    InvalidMagic,
    #[error("only little-endian ELF supported")]
    NotLittleEndian,
    #[error("unsupported ELF class: {0}")]
    UnsupportedClass(u8),
    #[error("ELF version must be 1")]
    BadVersion,
    #[error("OS/ABI must be System V")]
    BadOsAbi,
    #[error("type other than REL (relocatable file) not supported")]
    NotRelocatable,
    #[error("machine {0} not supported (expected Intel 80386)")]
    UnsupportedMachine(u16),
    #[error("unexpected {what} size {actual} (expected {expected})")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("section data out of bounds")]
    SectionOutOfBounds,
    #[error("program header out of bounds")]
    ProgramOutOfBounds,
    #[error("section type {0:#x} not supported")]
    UnsupportedSectionType(u32),
    #[error("relocation type {0} not supported")]
    UnsupportedRelocation(u8),
    #[error("relocation section {rel} precedes its target section {target}")]
    RelocationOrder { rel: usize, target: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ElfError>;
