//! Missing-header discovery via `-MM -MG`.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::toolchain::Toolchain;
use crate::{DepError, Result};

/// Join makefile continuation lines (`\` at end of line).
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut full = String::new();
    for line in text.lines() {
        if let Some(stripped) = line.strip_suffix('\\') {
            full.push_str(stripped);
            full.push(' ');
        } else {
            full.push_str(line);
            lines.push(std::mem::take(&mut full));
        }
    }
    if !full.is_empty() {
        lines.push(full);
    }
    lines
}

/// Split one logical line into words the way make would read them:
/// backslash escapes the next character, `#` starts a comment.
fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    word.push(next);
                }
            }
            '#' => break,
            c if c.is_whitespace() => {
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
            }
            c => word.push(c),
        }
    }
    if !word.is_empty() {
        words.push(word);
    }
    words
}

/// Parse `-MM` output into prerequisite names.
///
/// The first word of each logical line is the target; the rest are
/// prerequisites. `$$` collapses to a literal `$`.
#[must_use]
pub fn parse_makefile_deps(output: &str) -> Vec<String> {
    let mut names = Vec::new();
    for line in logical_lines(output) {
        let words = split_words(&line);
        for name in words.into_iter().skip(1) {
            names.push(name.replace("$$", "$"));
        }
    }
    names
}

/// Headers `file` names that exist under none of the scanned roots.
///
/// Runs the preprocessor in dependency-listing mode with `-MG` so unknown
/// headers come back as plain prerequisites instead of errors, then keeps
/// every prerequisite with no file behind it. Relative names resolve
/// against the file's own directory, which is also the child's cwd.
///
/// # Errors
/// Fails when the toolchain cannot be spawned or exits unsuccessfully.
pub fn include_deps(
    toolchain: &Toolchain,
    includedirs: &[PathBuf],
    file: &Path,
    arch: &str,
) -> Result<Vec<String>> {
    let parent = file.parent().unwrap_or_else(|| Path::new("."));
    let name = file.file_name().unwrap_or(file.as_os_str());

    let mut argv = toolchain.clang(arch);
    argv.push("-nostdinc".to_owned());
    argv.push("-MM".to_owned());
    argv.push("-MG".to_owned());
    for dir in includedirs {
        argv.push(format!("-I{}", dir.display()));
    }

    debug!(file = %file.display(), "include scan");
    let output = Command::new(&argv[0])
        .args(&argv[1..])
        .arg(name)
        .current_dir(parent)
        .output()?;
    if !output.status.success() {
        return Err(DepError::IncludeScan {
            file: file.to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_makefile_deps(&stdout)
        .into_iter()
        .filter(|name| !parent.join(name).exists())
        .collect())
}
