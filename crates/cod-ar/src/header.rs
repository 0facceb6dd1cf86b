//! The 60-byte `ar` member header.

use crate::{ArError, Result};

/// Size of a member header on disk.
pub const HEADER_SIZE: usize = 60;

/// Parsed member header. Only the name and size matter to this tool; the
/// remaining fields are carried as trimmed byte strings.
#[derive(Clone, Debug)]
pub struct MemberHeader {
    pub name: String,
    pub size: u64,
}

fn trimmed(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ')
        .map_or(0, |i| i + 1);
    &bytes[..end]
}

impl MemberHeader {
    /// Parse the header at `offset`.
    ///
    /// # Errors
    /// Fails on truncation, a missing `` `\n `` terminator, or a non-numeric
    /// size field.
    pub fn parse(data: &[u8], offset: usize) -> Result<Self> {
        let end = offset + HEADER_SIZE;
        if end > data.len() {
            return Err(ArError::Truncated);
        }
        let header = &data[offset..end];
        if &header[58..60] != b"`\n" {
            return Err(ArError::BadHeader);
        }

        let name = String::from_utf8(trimmed(&header[0..16]).to_vec())
            .map_err(|_| ArError::BadHeader)?;
        let size = std::str::from_utf8(trimmed(&header[48..58]))
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(ArError::BadHeader)?;

        Ok(Self { name, size })
    }

    /// Emit a header with deterministic date/uid/gid/mode fields.
    pub fn emit(out: &mut Vec<u8>, name: &str, size: u64) {
        let mut header = format!(
            "{name:<16}{date:<12}{uid:<6}{gid:<6}{mode:<8}{size:<10}",
            date = 0,
            uid = 0,
            gid = 0,
            mode = 644,
        )
        .into_bytes();
        header.extend_from_slice(b"`\n");
        debug_assert_eq!(header.len(), HEADER_SIZE);
        out.extend_from_slice(&header);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_parse_round_trip() {
        let mut buf = Vec::new();
        MemberHeader::emit(&mut buf, "/", 1234);
        let header = MemberHeader::parse(&buf, 0).unwrap();
        assert_eq!(header.name, "/");
        assert_eq!(header.size, 1234);
    }

    #[test]
    fn test_rejects_missing_terminator() {
        let buf = vec![b' '; HEADER_SIZE];
        assert!(matches!(
            MemberHeader::parse(&buf, 0),
            Err(ArError::BadHeader)
        ));
    }

    #[test]
    fn test_rejects_truncation() {
        assert!(matches!(
            MemberHeader::parse(&[0u8; 10], 0),
            Err(ArError::Truncated)
        ));
    }
}
