pub mod commands;
pub mod handlers;

use std::process::ExitCode;

use clap::Parser;

use commands::{Cli, Commands};
use handlers::{PathsHandler, ProbeHandler, RelocateHandler, relocate::RelocateOptions};

pub fn run_cli() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    transplant_logger::init_logger(cli.quiet);

    match &cli.command {
        Commands::Relocate {
            install_dir,
            package,
            package_version,
            strategy,
            backup,
            json,
            environment,
        } => {
            let options = RelocateOptions {
                install_dir,
                package,
                package_version,
                strategy,
                backup: *backup,
                json: *json,
                quiet: cli.quiet,
                debug: cli.debug,
            };
            if !RelocateHandler::handle(&options, environment)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Paths { environment } => PathsHandler::handle(environment),
        Commands::Probe { install_dir } => ProbeHandler::handle(install_dir, cli.debug)?,
    }

    Ok(ExitCode::SUCCESS)
}
