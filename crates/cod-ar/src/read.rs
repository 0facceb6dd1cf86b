//! Symbol-index (armap) extraction.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::header::{HEADER_SIZE, MemberHeader};
use crate::{ArError, MAGIC, MAGIC_THIN, Result};

/// Where a symbol's defining member lives.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArMember {
    /// Thin archive: the member file, relative to the archive's directory.
    Path(PathBuf),
    /// Regular archive: byte offset of the member header.
    Offset(u64),
}

impl ArMember {
    /// The member path, for thin archives.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Offset(_) => None,
        }
    }
}

fn read_u32be(data: &[u8], offset: usize) -> Result<u32> {
    if offset + 4 > data.len() {
        return Err(ArError::Truncated);
    }
    Ok(u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]))
}

/// Parse the symbol index of the archive at `path`.
///
/// Returns `(symbol, member)` pairs in armap order. For thin archives the
/// member is resolved through the extended name table to a path relative to
/// the archive's parent directory; for regular archives it is the member
/// header offset.
///
/// # Errors
/// Fails on bad magic, a missing or malformed armap, or a name table that
/// does not cover every referenced member.
pub fn parse_armap(path: &Path) -> Result<Vec<(String, ArMember)>> {
    let data = fs::read(path)?;
    if data.len() < 8 {
        return Err(ArError::Truncated);
    }
    let thin = match &data[..8] {
        m if m == MAGIC_THIN => true,
        m if m == MAGIC => false,
        _ => return Err(ArError::BadMagic),
    };

    let armap_header = MemberHeader::parse(&data, 8)?;
    if armap_header.name != "/" {
        return Err(ArError::MissingArmap);
    }
    let payload_off = 8 + HEADER_SIZE;
    let payload_len = usize::try_from(armap_header.size).map_err(|_| ArError::Truncated)?;
    if payload_off + payload_len > data.len() {
        return Err(ArError::Truncated);
    }
    let payload = &data[payload_off..payload_off + payload_len];

    let count = read_u32be(payload, 0)? as usize;
    if payload.last() != Some(&0) && count > 0 {
        return Err(ArError::BadHeader);
    }
    let mut offsets = Vec::with_capacity(count);
    for i in 0..count {
        offsets.push(u64::from(read_u32be(payload, 4 + i * 4)?));
    }

    let names_blob = &payload[4 + count * 4..];
    let names_blob = &names_blob[..names_blob
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |i| i + 1)];
    let names: Vec<String> = if names_blob.is_empty() {
        Vec::new()
    } else {
        names_blob
            .split(|&b| b == 0)
            .map(|s| String::from_utf8(s.to_vec()).map_err(|_| ArError::BadHeader))
            .collect::<Result<_>>()?
    };
    if names.len() != count {
        return Err(ArError::CountMismatch {
            names: names.len(),
            count,
        });
    }

    if !thin {
        return Ok(names
            .into_iter()
            .zip(offsets)
            .map(|(name, offset)| (name, ArMember::Offset(offset)))
            .collect());
    }

    // Thin archives: the second member is the extended name table, and each
    // armap offset points at a member header whose name indexes into it.
    let mut table_at = payload_off + payload_len;
    table_at += table_at % 2;
    let table_header = MemberHeader::parse(&data, table_at)?;
    if table_header.name != "//" {
        return Err(ArError::MissingNameTable);
    }
    let table_off = table_at + HEADER_SIZE;
    let table_len = usize::try_from(table_header.size).map_err(|_| ArError::Truncated)?;
    if table_off + table_len > data.len() {
        return Err(ArError::Truncated);
    }
    let table = &data[table_off..table_off + table_len];

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut resolved: BTreeMap<u64, PathBuf> = BTreeMap::new();
    for &offset in &offsets {
        if resolved.contains_key(&offset) {
            continue;
        }
        let header = MemberHeader::parse(&data, usize::try_from(offset).map_err(|_| ArError::Truncated)?)?;
        let index: usize = header
            .name
            .strip_prefix('/')
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ArError::BadNameReference(header.name.clone()))?;
        let end = table[index..]
            .windows(2)
            .position(|w| w == b"/\n")
            .map(|p| index + p)
            .ok_or_else(|| ArError::BadNameReference(header.name.clone()))?;
        let name = std::str::from_utf8(&table[index..end]).map_err(|_| ArError::BadHeader)?;
        resolved.insert(offset, parent.join(name));
    }

    Ok(names
        .into_iter()
        .zip(offsets)
        .map(|(name, offset)| (name, ArMember::Path(resolved[&offset].clone())))
        .collect())
}
