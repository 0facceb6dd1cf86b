//! ELF specification constants.

// e_ident layout
pub const EI_NIDENT: usize = 16;
pub const ELF_MAGIC: &[u8; 4] = b"\x7fELF";
pub const EI_CLASS: usize = 4;
pub const EI_DATA: usize = 5;
pub const EI_VERSION: usize = 6;
pub const EI_OSABI: usize = 7;

pub const ELF_CLASS_32: u8 = 1;
pub const ELF_CLASS_64: u8 = 2;
pub const ELF_DATA_LSB: u8 = 1;
pub const ELF_VERSION_CURRENT: u8 = 1;
pub const ELF_OSABI_SYSV: u8 = 0;

// Object file types
pub const ET_REL: u16 = 1;

// Machines
pub const EM_386: u16 = 3;
pub const EM_X86_64: u16 = 62;

// Program header types
pub const PT_LOAD: u32 = 1;

// Section header types
pub const SHT_NULL: u32 = 0;
pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_RELA: u32 = 4;
pub const SHT_NOBITS: u32 = 8;
pub const SHT_REL: u32 = 9;
pub const SHT_LOOS: u32 = 0x6000_0000;
pub const SHT_LLVM_ADDRSIG: u32 = SHT_LOOS + 0xfff_4c03;

// Symbol binding (upper 4 bits of st_info)
pub const STB_GLOBAL: u8 = 1;
pub const STB_WEAK: u8 = 2;

// Special section indexes
pub const SHN_UNDEF: u16 = 0;

// i386 relocation types
pub const R_386_32: u8 = 1;
pub const R_386_PC32: u8 = 2;
pub const R_386_16: u8 = 20;
pub const R_386_PC16: u8 = 21;
pub const R_386_8: u8 = 22;
pub const R_386_PC8: u8 = 23;

// x86_64 relocation types
pub const R_X86_64_PC32: u32 = 2;
pub const R_X86_64_32: u32 = 10;
pub const R_X86_64_16: u32 = 12;
pub const R_X86_64_PC16: u32 = 13;
pub const R_X86_64_8: u32 = 14;
pub const R_X86_64_PC8: u32 = 15;

// Fixed structure sizes
pub const EHDR32_SIZE: usize = 52;
pub const EHDR64_SIZE: usize = 64;
pub const SHDR32_SIZE: usize = 40;
pub const SHDR64_SIZE: usize = 64;
pub const PHDR32_SIZE: usize = 32;
pub const PHDR64_SIZE: usize = 56;
pub const SYM32_SIZE: usize = 16;
pub const SYM64_SIZE: usize = 24;
pub const REL32_SIZE: usize = 8;
pub const RELA64_SIZE: usize = 24;
