use crate::context::InstallContext;
use crate::outcome::RelocationOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before installed files are placed.
    PreInstall,
    /// After installed files are placed.
    PostInstall,
}

pub type Hook = Box<dyn Fn(&InstallContext<'_>) -> RelocationOutcome>;

/// Named lifecycle callbacks handed to the install pipeline. Registering a
/// name twice for the same phase replaces the earlier callback.
#[derive(Default)]
pub struct HookRegistry {
    pre_install: Vec<(String, Hook)>,
    post_install: Vec<(String, Hook)>,
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, phase: Phase, name: &str, hook: F)
    where
        F: Fn(&InstallContext<'_>) -> RelocationOutcome + 'static,
    {
        let hooks = self.hooks_mut(phase);
        let hook: Hook = Box::new(hook);
        if let Some(slot) = hooks.iter_mut().find(|(existing, _)| existing == name) {
            slot.1 = hook;
        } else {
            hooks.push((name.to_string(), hook));
        }
    }

    #[must_use]
    pub fn names(&self, phase: Phase) -> Vec<&str> {
        self.hooks(phase)
            .iter()
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Invokes every callback of `phase` once for `ctx`, in registration order.
    pub fn run(&self, phase: Phase, ctx: &InstallContext<'_>) -> Vec<RelocationOutcome> {
        self.hooks(phase).iter().map(|(_, hook)| hook(ctx)).collect()
    }

    fn hooks(&self, phase: Phase) -> &[(String, Hook)] {
        match phase {
            Phase::PreInstall => &self.pre_install,
            Phase::PostInstall => &self.post_install,
        }
    }

    fn hooks_mut(&mut self, phase: Phase) -> &mut Vec<(String, Hook)> {
        match phase {
            Phase::PreInstall => &mut self.pre_install,
            Phase::PostInstall => &mut self.post_install,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingSink;

    fn not_applicable(ctx: &InstallContext<'_>) -> RelocationOutcome {
        RelocationOutcome::NotApplicable {
            package: ctx.package_name.clone(),
        }
    }

    #[test]
    fn test_runs_only_requested_phase() {
        let mut registry = HookRegistry::new();
        registry.register(Phase::PostInstall, "transplant", not_applicable);
        let sink = RecordingSink::default();
        let ctx = InstallContext::new("facter", "1.7.0", "/gems", Vec::new(), &sink);

        assert!(registry.run(Phase::PreInstall, &ctx).is_empty());
        assert_eq!(registry.run(Phase::PostInstall, &ctx).len(), 1);
    }

    #[test]
    fn test_reregistering_replaces_hook() {
        let mut registry = HookRegistry::new();
        registry.register(Phase::PostInstall, "transplant", not_applicable);
        registry.register(Phase::PostInstall, "transplant", not_applicable);
        registry.register(Phase::PostInstall, "audit", not_applicable);

        assert_eq!(
            registry.names(Phase::PostInstall),
            vec!["transplant", "audit"]
        );
    }
}
