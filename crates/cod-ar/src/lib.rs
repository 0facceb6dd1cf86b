//! `ar` archive codec.
//!
//! The build collects objects into GNU thin archives (members stay on disk,
//! the archive only references them) and reads the symbol index (armap) back
//! to drive the symbol-resolution phase. Regular System-V archives with
//! embedded members are supported for distributable output.

mod header;
mod read;
mod write;

pub use header::MemberHeader;
pub use read::{ArMember, parse_armap};
pub use write::{write_regular, write_thin};

use thiserror::Error;

/// Magic for regular System-V archives.
pub const MAGIC: &[u8; 8] = b"!<arch>\n";
/// Magic for GNU thin archives.
pub const MAGIC_THIN: &[u8; 8] = b"!<thin>\n";

/// Archive codec errors.
#[derive(Error, Debug)]
pub enum ArError {
    #[error("bad archive magic")]
    BadMagic,
    #[error("truncated archive")]
    Truncated,
    #[error("malformed member header")]
    BadHeader,
    #[error("first archive member is not a symbol index")]
    MissingArmap,
    #[error("symbol index names {names} entries but counts {count}")]
    CountMismatch { names: usize, count: usize },
    #[error("missing extended name table")]
    MissingNameTable,
    #[error("bad extended name reference {0:?}")]
    BadNameReference(String),
    #[error("archive member {0}: {1}")]
    Member(String, cod_elf::ElfError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ArError>;
