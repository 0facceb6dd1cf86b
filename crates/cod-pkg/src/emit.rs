//! Per-package ninja fragment emission.
//!
//! Each package contributes two fragments to the build graph: an
//! `export.ninja` included at root scope (flags the package imposes on its
//! consumers) and a `lib.ninja` brought in via `subninja` (its own objects
//! and archive, with variables scoped to the package).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cod_manifest::{BuildFlags, write_compiler_variables};
use cod_ninja::{NinjaWriter, relative_to};

use crate::profile::Profile;
use crate::{PkgError, Result};

fn posix(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl Profile {
    fn write_linker_variables(&self, rootdir: &Path, ninja: &mut NinjaWriter, flags: &BuildFlags) {
        if !flags.ldflags.is_empty() {
            let mut values = vec!["$ldflags".to_owned()];
            values.extend(flags.ldflags.iter().cloned());
            ninja.variable("ldflags", values);
        }
        if let Some(script) = &flags.linker_script {
            let script = relative_to(&self.package().rootdir.join(script), rootdir);
            ninja.variable(
                "linker-script-flags",
                [format!("-Wl,--script={}", posix(&script))],
            );
            ninja.variable("linker-script", [posix(&script)]);
        }
    }

    /// Variables scoped to this package's own compilation.
    pub fn write_build_variables(&self, rootdir: &Path, ninja: &mut NinjaWriter) {
        if self.build_arch() != self.top_arch() {
            ninja.variable("arch", [self.build_arch()]);
            ninja.variable("cc", ["$clang", "--target=${arch}-unknown-unknown"]);
        }
        self.write_linker_variables(rootdir, ninja, self.build_flags());
        write_compiler_variables(
            ninja,
            &cod_manifest::ArchFlags::Flat(self.build_flags().clone()),
        );
    }

    /// Variables this package exports to every consumer in the graph.
    pub fn write_export_variables(&self, rootdir: &Path, ninja: &mut NinjaWriter) {
        self.write_linker_variables(rootdir, ninja, self.export_flags());
        write_compiler_variables(ninja, &self.package().manifest.export);
    }

    /// Compile rules for a destination-to-source map.
    ///
    /// Returns the object paths in emission order. When the package's
    /// architecture differs from the top architecture, each object is
    /// compiled to `.o32` and lifted to `.o` through `objconv`.
    fn write_build_objs(
        &self,
        rootdir: &Path,
        ninja: &mut NinjaWriter,
        objs: &BTreeMap<PathBuf, PathBuf>,
    ) -> Result<Vec<String>> {
        ninja.variable(
            "cflags",
            ["$cflags".to_owned(), format!("$cflags-{}", self.build_arch())],
        );
        ninja.variable(
            "sflags",
            ["$sflags".to_owned(), format!("$sflags-{}", self.build_arch())],
        );

        let lifted = self.build_arch() != self.top_arch();
        if lifted && self.top_arch() != "x86_64" {
            return Err(PkgError::BadLiftTarget(self.top_arch().to_owned()));
        }

        let mut result = Vec::with_capacity(objs.len());
        for (key, src) in objs {
            let dst = if lifted {
                let out = format!("$basedir/{}", posix(&key.with_extension("o")));
                let dst = format!("$basedir/{}", posix(&key.with_extension("o32")));
                ninja.build([out.as_str()], "objconv", [dst.as_str()], []);
                result.push(out);
                dst
            } else {
                let dst = format!("$basedir/{}", posix(&key.with_extension("o")));
                result.push(dst.clone());
                dst
            };

            let srcpath = posix(&relative_to(src, rootdir));
            match src.extension().and_then(|e| e.to_str()) {
                Some("c") => ninja.build([dst.as_str()], "cc", [srcpath.as_str()], []),
                Some("S") => ninja.build([dst.as_str()], "as", [srcpath.as_str()], []),
                _ => return Err(PkgError::UnsupportedSource(src.clone())),
            }
        }
        Ok(result)
    }

    /// Emit this package's library fragment and return the archive path.
    ///
    /// # Errors
    /// Fails on unsupported sources or an unwritable fragment.
    pub fn write_build_lib(&self, rootdir: &Path, lib_ninja: &Path) -> Result<String> {
        let mut ninja = NinjaWriter::new(rootdir.join(lib_ninja));
        self.write_build_variables(rootdir, &mut ninja);
        let basedir = lib_ninja.parent().unwrap_or_else(|| Path::new("."));
        ninja.variable("basedir", [posix(basedir)]);
        let objs = self.write_build_objs(rootdir, &mut ninja, self.objs())?;
        let libname = format!("lib/lib{}.a", self.id.name);
        ninja.build(
            [libname.as_str()],
            "ar",
            objs.iter().map(String::as_str).collect::<Vec<_>>(),
            [],
        );
        ninja.close()?;
        Ok(libname)
    }

    /// Emit the top package's executable fragment: the `bin.a` probe
    /// archive, one link per unit, and raw-binary flattening when the
    /// output format asks for it.
    ///
    /// # Errors
    /// Fails on unsupported sources or an unwritable fragment.
    pub fn write_build_bin(&self, rootdir: &Path, lib_ninja: &Path) -> Result<()> {
        let mut ninja = NinjaWriter::new(rootdir.join(lib_ninja));
        self.write_build_variables(rootdir, &mut ninja);
        let basedir = lib_ninja.parent().unwrap_or_else(|| Path::new("."));
        ninja.variable("basedir", [posix(basedir)]);
        let objs = self.write_build_objs(rootdir, &mut ninja, self.elfs())?;
        ninja.build(
            ["lib/bin.a"],
            "ar",
            objs.iter().map(String::as_str).collect::<Vec<_>>(),
            [],
        );

        let flat = self.build_flags().format.as_deref() == Some("binary");
        for key in self.elfs().keys() {
            let src = format!("$basedir/{}", posix(&key.with_extension("o")));
            let elf = posix(&Path::new("bin").join(key));
            ninja.build(
                [elf.as_str()],
                "ld",
                [src.as_str()],
                ["libs", "$linker-script"],
            );
            if flat {
                let bin = posix(&Path::new("bin").join(key.with_extension("bin")));
                ninja.build([bin.as_str()], "objcopy", [elf.as_str()], []);
            }
        }
        ninja.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Package;
    use std::fs;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn profile(root: &Path, manifest: &str, build_arch: &str, name: &str) -> Profile {
        write(&root.join("cod.toml"), manifest);
        let package = Package::open(root).unwrap();
        Profile::new(package, build_arch, name).unwrap()
    }

    #[test]
    fn test_lib_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("pkg");
        write(&root.join("src/add.c"), "int add(int a, int b) { return a + b; }\n");
        let top = profile(
            &root,
            "[package]\nname = \"foo\"\nversion = \"1.0\"\narch = \"x86_64\"\n",
            "x86_64",
            "dev.x86_64",
        );

        let rootdir = dir.path().join(".cod/dev.x86_64");
        fs::create_dir_all(&rootdir).unwrap();
        let libname = top
            .write_build_lib(&rootdir, Path::new("foo-1.0-0.x86_64/lib.ninja"))
            .unwrap();
        assert_eq!(libname, "lib/libfoo.a");

        let text = fs::read_to_string(rootdir.join("foo-1.0-0.x86_64/lib.ninja")).unwrap();
        assert!(text.contains("basedir = foo-1.0-0.x86_64\n"));
        assert!(text.contains("build $basedir/add.o: cc ../../pkg/src/add.c\n"));
        assert!(text.contains("build lib/libfoo.a: ar $basedir/add.o\n"));
    }

    #[test]
    fn test_lifted_objects_go_through_objconv() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("pkg");
        write(&root.join("src/io.c"), "");
        let top = profile(
            &root,
            "[package]\nname = \"legacy\"\nversion = \"1.0\"\narch = \"i686\"\n",
            "x86_64",
            "release.i686",
        );

        let rootdir = dir.path().join(".cod/release.x86_64");
        fs::create_dir_all(&rootdir).unwrap();
        top.write_build_lib(&rootdir, Path::new("legacy-1.0-0.i686/lib.ninja"))
            .unwrap();

        let text = fs::read_to_string(rootdir.join("legacy-1.0-0.i686/lib.ninja")).unwrap();
        assert!(text.contains("arch = i686\n"));
        assert!(text.contains("cc = $clang --target=${arch}-unknown-unknown\n"));
        assert!(text.contains("build $basedir/io.o: objconv $basedir/io.o32\n"));
        assert!(text.contains("build $basedir/io.o32: cc ../../pkg/src/io.c\n"));
        assert!(text.contains("build lib/liblegacy.a: ar $basedir/io.o\n"));
    }

    #[test]
    fn test_bin_fragment_with_binary_format() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("pkg");
        write(&root.join("bin/boot.c"), "");
        write(&root.join("kernel.ld"), "");
        let top = profile(
            &root,
            "[package]\nname = \"kern\"\nversion = \"1.0\"\narch = \"i686\"\n\
             [build]\nformat = \"binary\"\nlinker-script = \"kernel.ld\"\n",
            "i686",
            "dev.i686",
        );

        let rootdir = dir.path().join(".cod/dev.i686");
        fs::create_dir_all(&rootdir).unwrap();
        top.write_build_bin(&rootdir, Path::new("obj/lib.ninja")).unwrap();

        let text = fs::read_to_string(rootdir.join("obj/lib.ninja")).unwrap();
        assert!(text.contains("linker-script-flags = -Wl,--script=../../pkg/kernel.ld\n"));
        assert!(text.contains("linker-script = ../../pkg/kernel.ld\n"));
        assert!(text.contains("build lib/bin.a: ar $basedir/boot.o\n"));
        assert!(text.contains("build bin/boot.elf: ld $basedir/boot.o | libs $linker-script\n"));
        assert!(text.contains("build bin/boot.bin: objcopy bin/boot.elf\n"));
    }

    #[test]
    fn test_cross_arch_profile_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("pkg");
        write(&root.join("src/a.c"), "");
        write(&root.join("cod.toml"), "[package]\nname = \"a\"\nversion = \"1\"\narch = \"i686\"\n");
        let package = Package::open(&root).unwrap();
        let profile = Profile::new(package, "x86_64", "dev.i686").unwrap();
        assert_eq!(profile.build_arch(), "i686");
        assert_eq!(profile.top_arch(), "x86_64");
    }
}
