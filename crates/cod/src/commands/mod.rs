//! Command implementations.

mod build;
mod tools;

use crate::cli::{Cli, Commands, EXIT_FAILURE, EXIT_SUCCESS};

/// Dispatch the CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    let result = match &cli.command {
        Commands::Build { arch, profile } => build::cmd_build(arch.as_deref(), profile),
        Commands::Install {
            arch,
            profile,
            packages,
        } => build::cmd_install(arch.as_deref(), profile, packages),
        Commands::Package { arch } => build::cmd_package(arch.as_deref()),
        Commands::Ar { archive, members } => tools::cmd_ar(archive, members),
        Commands::Objcopy { output, input } => tools::cmd_objcopy(output, input),
        Commands::Objconv { output, input } => tools::cmd_objconv(output, input),
    };

    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            EXIT_FAILURE
        }
    }
}
