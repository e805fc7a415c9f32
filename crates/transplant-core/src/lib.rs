pub mod commit;
pub mod config;
pub mod context;
pub mod detector;
pub mod hooks;
pub mod outcome;
pub mod relocator;
pub mod substitute;

#[cfg(test)]
mod test_support;

pub use config::{RelocationConfig, RuntimeEnvironment, Strategy};
pub use context::{InstallContext, collect_installed_files};
pub use detector::{
    InstalledPackage, MechanismDetector, OverridePathApi, PackageModule, Setting,
    supports_override_api,
};
pub use hooks::{Hook, HookRegistry, Phase};
pub use outcome::{AppliedStrategy, OutcomeReport, RelocationOutcome};
pub use relocator::Relocator;

use transplant_constants::BIN_NAME;

/// Post-install entry point: relocates with the default configuration and
/// the detected runtime environment.
pub fn process(ctx: &InstallContext<'_>) -> RelocationOutcome {
    Relocator::from_environment().process(ctx)
}

/// Registers `relocator` as the single post-install callback.
pub fn register(registry: &mut HookRegistry, relocator: Relocator) {
    registry.register(Phase::PostInstall, BIN_NAME, move |ctx| {
        relocator.process(ctx)
    });
}
