//! Archive emission with symbol index.

use std::fs;
use std::path::Path;

use cod_ninja::relative_to;

use crate::header::{HEADER_SIZE, MemberHeader};
use crate::{ArError, MAGIC, MAGIC_THIN, Result};

/// Defined symbols per member, in member order.
fn member_symbols(members: &[&Path]) -> Result<Vec<Vec<String>>> {
    members
        .iter()
        .map(|member| {
            let data = fs::read(member)?;
            cod_elf::defined_symbols(&data)
                .map_err(|e| ArError::Member(member.display().to_string(), e))
        })
        .collect()
}

/// Armap payload: count, one header offset per symbol, NUL-separated names.
fn armap_payload(symbols: &[Vec<String>], header_offsets: &[usize]) -> Vec<u8> {
    let count: usize = symbols.iter().map(Vec::len).sum();
    let mut payload = Vec::new();
    payload.extend_from_slice(&u32::try_from(count).unwrap_or(u32::MAX).to_be_bytes());
    for (member, offset) in symbols.iter().zip(header_offsets) {
        for _ in member {
            payload.extend_from_slice(&u32::try_from(*offset).unwrap_or(u32::MAX).to_be_bytes());
        }
    }
    for member in symbols {
        for symbol in member {
            payload.extend_from_slice(symbol.as_bytes());
            payload.push(0);
        }
    }
    payload
}

fn pad_even(out: &mut Vec<u8>) {
    if out.len() % 2 != 0 {
        out.push(b'\n');
    }
}

/// Write a GNU thin archive referencing `members`, with a symbol index.
///
/// Member paths are stored relative to the archive's directory, the way
/// `ar --thin` records them, so the archive stays valid no matter where the
/// build is invoked from.
///
/// # Errors
/// Fails when a member cannot be read or is not a valid ELF object.
pub fn write_thin(archive: &Path, members: &[&Path]) -> Result<()> {
    let symbols = member_symbols(members)?;
    let parent = archive.parent().unwrap_or_else(|| Path::new("."));

    // Extended name table, one `relpath/\n` entry per member.
    let mut table = Vec::new();
    let mut name_index = Vec::with_capacity(members.len());
    for member in members {
        name_index.push(table.len());
        let rel = relative_to(member, parent);
        table.extend_from_slice(rel.to_string_lossy().as_bytes());
        table.extend_from_slice(b"/\n");
    }

    // Lay out: magic, armap, name table, then one data-less header per
    // member. Armap offsets need the header positions, which depend only on
    // sizes known up front.
    let count: usize = symbols.iter().map(Vec::len).sum();
    let names_len: usize = symbols.iter().flatten().map(|s| s.len() + 1).sum();
    let armap_len = 4 + 4 * count + names_len;
    let mut headers_at = 8 + HEADER_SIZE + armap_len;
    headers_at += headers_at % 2;
    headers_at += HEADER_SIZE + table.len();
    headers_at += headers_at % 2;

    let header_offsets: Vec<usize> = (0..members.len())
        .map(|i| headers_at + i * HEADER_SIZE)
        .collect();

    let mut out = Vec::new();
    out.extend_from_slice(MAGIC_THIN);
    MemberHeader::emit(&mut out, "/", armap_len as u64);
    out.extend_from_slice(&armap_payload(&symbols, &header_offsets));
    pad_even(&mut out);
    MemberHeader::emit(&mut out, "//", table.len() as u64);
    out.extend_from_slice(&table);
    pad_even(&mut out);
    for (member, index) in members.iter().zip(name_index) {
        let size = fs::metadata(member)?.len();
        MemberHeader::emit(&mut out, &format!("/{index}"), size);
    }

    fs::write(archive, out)?;
    Ok(())
}

/// Write a regular archive embedding `members`, with a symbol index.
///
/// Member names longer than 15 bytes go through the extended name table;
/// short names are stored inline with the `/` terminator.
///
/// # Errors
/// Fails when a member cannot be read or is not a valid ELF object.
pub fn write_regular(archive: &Path, members: &[&Path]) -> Result<()> {
    let symbols = member_symbols(members)?;

    let datas: Vec<Vec<u8>> = members
        .iter()
        .map(|m| fs::read(m).map_err(ArError::from))
        .collect::<Result<_>>()?;
    let basenames: Vec<String> = members
        .iter()
        .map(|m| {
            m.file_name()
                .map_or_else(|| m.display().to_string(), |n| n.to_string_lossy().into_owned())
        })
        .collect();

    let mut table = Vec::new();
    let stored: Vec<String> = basenames
        .iter()
        .map(|name| {
            if name.len() <= 15 {
                format!("{name}/")
            } else {
                let index = table.len();
                table.extend_from_slice(name.as_bytes());
                table.extend_from_slice(b"/\n");
                format!("/{index}")
            }
        })
        .collect();

    let count: usize = symbols.iter().map(Vec::len).sum();
    let names_len: usize = symbols.iter().flatten().map(|s| s.len() + 1).sum();
    let armap_len = 4 + 4 * count + names_len;
    let mut cursor = 8 + HEADER_SIZE + armap_len;
    cursor += cursor % 2;
    if !table.is_empty() {
        cursor += HEADER_SIZE + table.len();
        cursor += cursor % 2;
    }

    let mut header_offsets = Vec::with_capacity(members.len());
    for data in &datas {
        header_offsets.push(cursor);
        cursor += HEADER_SIZE + data.len();
        cursor += cursor % 2;
    }

    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    MemberHeader::emit(&mut out, "/", armap_len as u64);
    out.extend_from_slice(&armap_payload(&symbols, &header_offsets));
    pad_even(&mut out);
    if !table.is_empty() {
        MemberHeader::emit(&mut out, "//", table.len() as u64);
        out.extend_from_slice(&table);
        pad_even(&mut out);
    }
    for ((name, data), offset) in stored.iter().zip(&datas).zip(&header_offsets) {
        debug_assert_eq!(out.len(), *offset);
        MemberHeader::emit(&mut out, name, data.len() as u64);
        out.extend_from_slice(data);
        pad_even(&mut out);
    }

    fs::write(archive, out)?;
    Ok(())
}
