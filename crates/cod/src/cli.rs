//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cod::DEFAULT_PROFILE;

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "cod")]
#[command(about = "Package manager and build driver for C projects")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the current package
    Build {
        /// Target architecture (defaults to the package's arch, or native)
        #[arg(short, long)]
        arch: Option<String>,

        /// Build profile
        #[arg(short, long, default_value = DEFAULT_PROFILE)]
        profile: String,
    },

    /// Resolve packages into the profile's lockfile
    Install {
        /// Target architecture
        #[arg(short, long)]
        arch: Option<String>,

        /// Build profile
        #[arg(short, long, default_value = DEFAULT_PROFILE)]
        profile: String,

        /// Package selectors to install
        #[arg(value_name = "PKG", required = true)]
        packages: Vec<String>,
    },

    /// Produce package metadata for the current source tree
    Package {
        /// Target architecture (defaults to every declared arch)
        #[arg(short, long)]
        arch: Option<String>,
    },

    /// Collect objects into a thin archive with a symbol index
    #[command(hide = true)]
    Ar {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
        #[arg(value_name = "OBJECT", required = true)]
        members: Vec<PathBuf>,
    },

    /// Flatten a linked executable into a raw binary image
    #[command(hide = true)]
    Objcopy {
        #[arg(value_name = "OUT")]
        output: PathBuf,
        #[arg(value_name = "IN")]
        input: PathBuf,
    },

    /// Lift an i386 relocatable object to x86_64
    #[command(hide = true)]
    Objconv {
        #[arg(value_name = "OUT")]
        output: PathBuf,
        #[arg(value_name = "IN")]
        input: PathBuf,
    },
}
