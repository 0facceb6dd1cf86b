//! Ninja build-file emission.
//!
//! Build fragments are regenerated on every resolution round, so all writes
//! go through [`update_file`]: a fragment that did not change is left
//! untouched and ninja sees no reason to rebuild its targets.

mod relpath;
mod update;
mod writer;

pub use relpath::relative_to;
pub use update::update_file;
pub use writer::NinjaWriter;
