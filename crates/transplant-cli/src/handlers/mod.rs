pub mod paths;
pub mod probe;
pub mod relocate;

pub use paths::PathsHandler;
pub use probe::ProbeHandler;
pub use relocate::RelocateHandler;

use transplant_core::RuntimeEnvironment;
use transplant_utils::PathTemplates;

use crate::commands::EnvironmentArgs;

impl EnvironmentArgs {
    /// Detected runtime environment with any explicit overrides applied.
    pub fn runtime(&self) -> RuntimeEnvironment {
        let mut environment = RuntimeEnvironment::detect();
        if let Some(prefix) = &self.prefix {
            environment = environment.with_prefix(prefix);
        }
        if let Some(host_os) = &self.host_os {
            environment = environment.with_host_os(host_os);
        }
        environment
    }

    pub fn templates(&self) -> PathTemplates {
        let mut templates = PathTemplates::default();
        if let Some(confdir) = &self.confdir_template {
            templates.confdir.clone_from(confdir);
        }
        if let Some(vardir) = &self.vardir_template {
            templates.vardir.clone_from(vardir);
        }
        templates
    }
}
