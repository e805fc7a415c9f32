use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use transplant_constants::{BIN_NAME, DESCRIPTION, HOST_OS_ENV, PREFIX_ENV, TARGET_PACKAGE, VERSION};

#[derive(Parser)]
#[command(name = BIN_NAME)]
#[command(version = VERSION)]
#[command(propagate_version = true)]
#[command(about = DESCRIPTION, long_about = None)]
pub struct Cli {
    /// Only print errors
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
    /// Enable debug mode for verbose output
    #[arg(long, global = true)]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Runs the post-install relocation against an installed package
    #[command(alias = "r")]
    Relocate {
        /// Directory holding the installed package files
        #[arg(short = 'd', long = "install-dir")]
        install_dir: PathBuf,
        /// Name of the installed package
        #[arg(short = 'p', long, default_value = TARGET_PACKAGE)]
        package: String,
        /// Version of the installed package
        #[arg(long = "package-version", default_value = "unknown")]
        package_version: String,
        /// Write strategy: auto, override-files or in-place
        #[arg(long, default_value = "auto")]
        strategy: String,
        /// Keep a .orig copy of the source file when patching in place
        #[arg(long)]
        backup: bool,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        environment: EnvironmentArgs,
    },
    /// Prints the organisation and relocated directories for this runtime
    Paths {
        #[command(flatten)]
        environment: EnvironmentArgs,
    },
    /// Reports which write strategy an installed package supports
    Probe {
        /// Directory holding the installed package files
        #[arg(short = 'd', long = "install-dir")]
        install_dir: PathBuf,
    },
}

#[derive(Args)]
pub struct EnvironmentArgs {
    /// Installation prefix the organisation is derived from
    #[arg(long, env = PREFIX_ENV)]
    pub prefix: Option<String>,
    /// Host-OS identifier (e.g. linux-gnu, mingw32)
    #[arg(long = "host-os", env = HOST_OS_ENV)]
    pub host_os: Option<String>,
    /// Confdir template, `{org}` is replaced with the organisation
    #[arg(long = "confdir-template")]
    pub confdir_template: Option<String>,
    /// Vardir template, `{org}` is replaced with the organisation
    #[arg(long = "vardir-template")]
    pub vardir_template: Option<String>,
}
