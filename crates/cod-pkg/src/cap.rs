//! Capability strings.
//!
//! Every dependency edge in the system is a capability token. The syntax
//! partitions the namespace: `<path.h>` names a public header, `(sym)` a
//! linker symbol, `libfoo.a` a static archive, the literal `linker-script`
//! an exported linker script, and anything else selects a package by name
//! with an optional EVR constraint.

use std::fmt;

use crate::{Evr, Result};

/// Constraint operator in a package selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapOp {
    Eq,
    Lt,
}

/// A parsed capability token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Capability {
    Header(String),
    Symbol(String),
    Archive(String),
    LinkerScript,
    Package {
        name: String,
        constraint: Option<(CapOp, String)>,
    },
}

impl Capability {
    /// Parse a capability token. Never fails: unrecognized syntax is a
    /// bare package-name selector.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if let Some(inner) = s.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            return Self::Header(inner.to_owned());
        }
        if let Some(inner) = s.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            return Self::Symbol(inner.to_owned());
        }
        if s == "linker-script" {
            return Self::LinkerScript;
        }
        if s.ends_with(".a") && !s.contains(' ') {
            return Self::Archive(s.to_owned());
        }

        let mut words = s.split_whitespace();
        let name = words.next().unwrap_or_default().to_owned();
        let constraint = match (words.next(), words.next()) {
            (Some("="), Some(evr)) => Some((CapOp::Eq, evr.to_owned())),
            (Some("<"), Some(evr)) => Some((CapOp::Lt, evr.to_owned())),
            _ => None,
        };
        Self::Package { name, constraint }
    }

    /// Whether at most one installed package may provide this capability.
    #[must_use]
    pub fn is_exclusive(&self) -> bool {
        !matches!(self, Self::Package { .. })
    }

    /// Whether a provided `name = evr` self-capability satisfies this
    /// selector.
    ///
    /// # Errors
    /// Fails when an EVR in the constraint cannot be parsed.
    pub fn selects(&self, name: &str, evr: &Evr) -> Result<bool> {
        let Self::Package {
            name: want,
            constraint,
        } = self
        else {
            return Ok(false);
        };
        if want != name {
            return Ok(false);
        }
        match constraint {
            None => Ok(true),
            Some((op, want_evr)) => {
                let want_evr = Evr::parse(want_evr)?;
                Ok(match op {
                    CapOp::Eq => *evr == want_evr,
                    CapOp::Lt => *evr < want_evr,
                })
            }
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header(h) => write!(f, "<{h}>"),
            Self::Symbol(s) => write!(f, "({s})"),
            Self::Archive(a) => write!(f, "{a}"),
            Self::LinkerScript => write!(f, "linker-script"),
            Self::Package { name, constraint } => match constraint {
                None => write!(f, "{name}"),
                Some((CapOp::Eq, evr)) => write!(f, "{name} = {evr}"),
                Some((CapOp::Lt, evr)) => write!(f, "{name} < {evr}"),
            },
        }
    }
}
