//! Epoch-version-release tuples with RPM-style ordering.

use std::cmp::Ordering;
use std::fmt;

use crate::{PkgError, Result};

/// An epoch-version-release tuple.
///
/// Canonical form is `[epoch:]version-release`, the epoch omitted when 0.
/// Equality follows the ordering, so `1.05-0` and `1.5-0` compare equal.
#[derive(Clone, Debug)]
pub struct Evr {
    pub epoch: i64,
    pub version: String,
    pub release: String,
}

impl PartialEq for Evr {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Evr {}

impl Evr {
    /// Build from the manifest fields.
    #[must_use]
    pub fn new(epoch: i64, version: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            epoch,
            version: version.into(),
            release: release.into(),
        }
    }

    /// Parse the canonical form.
    ///
    /// # Errors
    /// Fails when the release part or a numeric epoch is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let (ev, release) = s
            .rsplit_once('-')
            .ok_or_else(|| PkgError::BadEvr(s.to_owned()))?;
        let (epoch, version) = match ev.split_once(':') {
            Some((epoch, version)) => (
                epoch
                    .parse()
                    .map_err(|_| PkgError::BadEvr(s.to_owned()))?,
                version,
            ),
            None => (0, ev),
        };
        Ok(Self::new(epoch, version, release))
    }
}

impl fmt::Display for Evr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch == 0 {
            write!(f, "{}-{}", self.version, self.release)
        } else {
            write!(f, "{}:{}-{}", self.epoch, self.version, self.release)
        }
    }
}

impl Ord for Evr {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| vercmp(&self.version, &other.version))
            .then_with(|| vercmp(&self.release, &other.release))
    }
}

impl PartialOrd for Evr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// RPM's segment-wise version comparison.
///
/// Alternating digit and alpha runs compare numerically and lexically; a
/// digit run outranks an alpha run; `~` sorts before anything, including
/// the end of the string.
#[must_use]
pub fn vercmp(a: &str, b: &str) -> Ordering {
    let mut a = a;
    let mut b = b;

    loop {
        a = a.trim_start_matches(|c| !is_segment_char(c) && c != '~');
        b = b.trim_start_matches(|c| !is_segment_char(c) && c != '~');

        match (a.starts_with('~'), b.starts_with('~')) {
            (true, true) => {
                a = &a[1..];
                b = &b[1..];
                continue;
            }
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        if a.is_empty() || b.is_empty() {
            return a.len().cmp(&b.len());
        }

        let a_digits = a.starts_with(|c: char| c.is_ascii_digit());
        let b_digits = b.starts_with(|c: char| c.is_ascii_digit());
        if a_digits != b_digits {
            // A numeric segment is always newer than an alphabetic one.
            return if a_digits {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let run = |s: &str| -> usize {
            s.chars()
                .take_while(|&c| c.is_ascii_digit() == a_digits && is_segment_char(c))
                .count()
        };
        let (a_seg, a_rest) = a.split_at(run(a));
        let (b_seg, b_rest) = b.split_at(run(b));

        let ordering = if a_digits {
            let a_seg = a_seg.trim_start_matches('0');
            let b_seg = b_seg.trim_start_matches('0');
            a_seg.len().cmp(&b_seg.len()).then_with(|| a_seg.cmp(b_seg))
        } else {
            a_seg.cmp(b_seg)
        };
        if ordering != Ordering::Equal {
            return ordering;
        }

        a = a_rest;
        b = b_rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let evr = Evr::parse("1.2.3-4").unwrap();
        assert_eq!(evr, Evr::new(0, "1.2.3", "4"));
        assert_eq!(evr.to_string(), "1.2.3-4");

        let epoch = Evr::parse("2:0.9-1").unwrap();
        assert_eq!(epoch, Evr::new(2, "0.9", "1"));
        assert_eq!(epoch.to_string(), "2:0.9-1");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Evr::parse("noversion").is_err());
        assert!(Evr::parse("x:1.0-1").is_err());
    }

    #[test]
    fn test_numeric_ordering() {
        assert_eq!(vercmp("1.10", "1.9"), Ordering::Greater);
        assert_eq!(vercmp("1.05", "1.5"), Ordering::Equal);
        assert_eq!(vercmp("2.0", "10.0"), Ordering::Less);
    }

    #[test]
    fn test_alpha_vs_digit() {
        assert_eq!(vercmp("1.0a", "1.0"), Ordering::Greater);
        assert_eq!(vercmp("1.a", "1.1"), Ordering::Less);
        assert_eq!(vercmp("alpha", "beta"), Ordering::Less);
    }

    #[test]
    fn test_tilde_sorts_first() {
        assert_eq!(vercmp("1.0~rc1", "1.0"), Ordering::Less);
        assert_eq!(vercmp("1.0~rc1", "1.0~rc2"), Ordering::Less);
        assert_eq!(vercmp("1.0~~", "1.0~"), Ordering::Less);
    }

    #[test]
    fn test_epoch_beats_version() {
        let old = Evr::new(0, "9.9", "9");
        let new = Evr::new(1, "0.1", "0");
        assert!(new > old);
    }

    #[test]
    fn test_release_breaks_ties() {
        let a = Evr::new(0, "1.0", "1");
        let b = Evr::new(0, "1.0", "2");
        assert!(a < b);
    }
}
