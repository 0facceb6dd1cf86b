//! Undefined-symbol discovery via a link probe.

use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use cod_ninja::update_file;

use crate::toolchain::Toolchain;
use crate::{DepError, Result};

/// Linker script that makes every probe link fail after diagnostics.
const ALWAYS_FAIL_LD: &str = include_str!("../../../toolchain/always-fail.ld");

/// Marker from the script's ASSERT; its presence distinguishes the expected
/// probe failure from a toolchain malfunction.
const PROBE_MARKER: &str = "symbol probe";

const SCRIPT_NAME: &str = "always-fail.ld";

fn undefined_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m): error: undefined symbol: (\S+)$").unwrap())
}

/// Extract undefined symbol names from linker stderr.
#[must_use]
pub fn parse_undefined_symbols(stderr: &str) -> Vec<String> {
    undefined_re()
        .captures_iter(stderr)
        .map(|c| c[1].to_owned())
        .collect()
}

/// The external symbols `object` references but does not define.
///
/// Links the single object (or archive member) against a script that
/// resolves nothing and always fails, then reads the undefined-symbol
/// diagnostics off stderr. `object` is interpreted relative to `workdir`.
///
/// # Errors
/// Fails when the toolchain cannot be spawned, or when the link fails
/// without reporting either undefined symbols or the probe assertion.
pub fn symbol_deps(
    toolchain: &Toolchain,
    workdir: &Path,
    target: &[String],
    object: &Path,
) -> Result<Vec<String>> {
    update_file(&workdir.join(SCRIPT_NAME), ALWAYS_FAIL_LD.as_bytes())?;

    let argv = toolchain.cc(target);
    debug!(object = %object.display(), "symbol scan");
    let output = Command::new(&argv[0])
        .args(&argv[1..])
        .arg(format!("-Wl,--script={SCRIPT_NAME}"))
        .arg(object)
        .current_dir(workdir)
        .output()?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    let symbols = parse_undefined_symbols(&stderr);
    if symbols.is_empty() && !output.status.success() && !stderr.contains(PROBE_MARKER) {
        return Err(DepError::SymbolScan {
            object: object.to_path_buf(),
            stderr: stderr.into_owned(),
        });
    }
    Ok(symbols)
}
