//! Minimal ninja-syntax writer.

use std::io;
use std::path::{Path, PathBuf};

use crate::update_file;

/// Escape a path for use in a `build` statement.
///
/// Space and `:` are significant to ninja in path position. Bare `$` is
/// left alone so variable references like `$basedir/x.o` still expand.
fn escape_path(s: &str) -> String {
    s.replace("$ ", "$$ ").replace(' ', "$ ").replace(':', "$:")
}

fn join<S: AsRef<str>>(values: impl IntoIterator<Item = S>) -> String {
    let mut out = String::new();
    for v in values {
        let v = v.as_ref();
        if v.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(v);
    }
    out
}

/// Buffered emitter for a single ninja file.
///
/// Nothing touches the filesystem until [`NinjaWriter::close`], which routes
/// the buffer through [`update_file`]. Dropping the writer without closing
/// discards the buffer, leaving any previous fragment in place.
pub struct NinjaWriter {
    path: PathBuf,
    buf: String,
}

impl NinjaWriter {
    /// Create a writer that will emit to `path` on close.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            buf: String::new(),
        }
    }

    /// Emit `name = value`, joining list values with spaces.
    pub fn variable<S: AsRef<str>>(&mut self, name: &str, values: impl IntoIterator<Item = S>) {
        let value = join(values);
        self.buf.push_str(name);
        self.buf.push_str(" = ");
        self.buf.push_str(&value);
        self.buf.push('\n');
    }

    /// Emit a rule declaration.
    pub fn rule<S: AsRef<str>>(
        &mut self,
        name: &str,
        command: impl IntoIterator<Item = S>,
        depfile: Option<&str>,
        description: Option<&str>,
    ) {
        self.buf.push_str("rule ");
        self.buf.push_str(name);
        self.buf.push('\n');
        self.buf.push_str("  command = ");
        self.buf.push_str(&join(command));
        self.buf.push('\n');
        if let Some(depfile) = depfile {
            self.buf.push_str("  depfile = ");
            self.buf.push_str(depfile);
            self.buf.push('\n');
        }
        if let Some(description) = description {
            self.buf.push_str("  description = ");
            self.buf.push_str(description);
            self.buf.push('\n');
        }
    }

    /// Emit a build statement. `implicit` dependencies go after `|`.
    pub fn build<S: AsRef<str>>(
        &mut self,
        outputs: impl IntoIterator<Item = S>,
        rule: &str,
        inputs: impl IntoIterator<Item = S>,
        implicit: impl IntoIterator<Item = S>,
    ) {
        let outs = join(outputs.into_iter().map(|s| escape_path(s.as_ref())));
        self.buf.push_str("build ");
        self.buf.push_str(&outs);
        self.buf.push_str(": ");
        self.buf.push_str(rule);
        let ins = join(inputs.into_iter().map(|s| escape_path(s.as_ref())));
        if !ins.is_empty() {
            self.buf.push(' ');
            self.buf.push_str(&ins);
        }
        let imps = join(implicit.into_iter().map(|s| escape_path(s.as_ref())));
        if !imps.is_empty() {
            self.buf.push_str(" | ");
            self.buf.push_str(&imps);
        }
        self.buf.push('\n');
    }

    /// Emit an `include` statement (included scope shares variables).
    pub fn include(&mut self, path: &str) {
        self.buf.push_str("include ");
        self.buf.push_str(&escape_path(path));
        self.buf.push('\n');
    }

    /// Emit a `subninja` statement (child scope, variables do not leak).
    pub fn subninja(&mut self, path: &str) {
        self.buf.push_str("subninja ");
        self.buf.push_str(&escape_path(path));
        self.buf.push('\n');
    }

    /// The path this writer will emit to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the buffer out if it differs from the existing file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn close(self) -> io::Result<bool> {
        update_file(&self.path, self.buf.as_bytes())
    }

    #[cfg(test)]
    fn output(&self) -> &str {
        &self.buf
    }
}
