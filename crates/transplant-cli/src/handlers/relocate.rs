use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use transplant_core::{
    HookRegistry, InstallContext, Phase, RelocationConfig, RelocationOutcome, Relocator, Strategy,
    collect_installed_files,
};
use transplant_logger::ConsoleSink;

use crate::commands::EnvironmentArgs;

pub struct RelocateHandler;

pub struct RelocateOptions<'a> {
    pub install_dir: &'a Path,
    pub package: &'a str,
    pub package_version: &'a str,
    pub strategy: &'a str,
    pub backup: bool,
    pub json: bool,
    pub quiet: bool,
    pub debug: bool,
}

impl RelocateHandler {
    /// Returns whether every post-install hook succeeded.
    pub fn handle(options: &RelocateOptions<'_>, environment: &EnvironmentArgs) -> Result<bool> {
        let strategy: Strategy = options.strategy.parse()?;
        let config = RelocationConfig {
            templates: environment.templates(),
            strategy,
            backup: options.backup,
            ..RelocationConfig::default()
        };

        let files = collect_installed_files(options.install_dir).with_context(|| {
            format!(
                "Failed to list installed files in {}",
                options.install_dir.display()
            )
        })?;

        if !options.json && !options.quiet {
            Self::print_header(options.package, options.package_version);
        }

        let mut registry = HookRegistry::new();
        transplant_core::register(
            &mut registry,
            Relocator::new(config, environment.runtime()),
        );

        let sink = ConsoleSink::new(options.debug);
        let ctx = InstallContext::new(
            options.package,
            options.package_version,
            options.install_dir,
            files,
            &sink,
        );
        transplant_logger::debug(
            &format!(
                "{} installed files in {}",
                ctx.installed_files.len(),
                ctx.install_dir.display()
            ),
            options.debug,
        );

        let outcomes = registry.run(Phase::PostInstall, &ctx);
        for outcome in &outcomes {
            if options.json {
                println!("{}", serde_json::to_string_pretty(&outcome.report())?);
            } else {
                Self::print_outcome(outcome);
            }
        }

        Ok(outcomes.iter().all(RelocationOutcome::is_success))
    }

    fn print_outcome(outcome: &RelocationOutcome) {
        match outcome {
            RelocationOutcome::Relocated {
                paths,
                strategy,
                files,
            } => {
                for file in files {
                    transplant_logger::info(&format!("wrote {}", file.display()));
                }
                transplant_logger::finish(&format!(
                    "Relocated to {} and {} ({strategy:?}, org '{}')",
                    paths.confdir, paths.vardir, paths.org
                ));
            }
            RelocationOutcome::NotApplicable { package } => {
                transplant_logger::warn(&format!("Nothing to relocate for package '{package}'"));
            }
            RelocationOutcome::Failed(_) => {}
        }
    }

    fn print_header(package: &str, version: &str) {
        println!(
            "{} {} {}",
            "transplant".bright_cyan().bold(),
            "relocate".bright_white(),
            format!("{package}@{version}").bright_white()
        );
        println!();
    }
}
