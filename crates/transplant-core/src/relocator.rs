use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use transplant_error::{RelocationError, Result};
use transplant_utils::{TargetPaths, derive_with};

use crate::commit::{backup_path, commit_all, stage};
use crate::config::{RelocationConfig, RuntimeEnvironment, Strategy};
use crate::context::InstallContext;
use crate::detector::{
    InstalledPackage, MechanismDetector, OverridePathApi, PackageModule, Setting,
};
use crate::outcome::{AppliedStrategy, RelocationOutcome};
use crate::substitute::replace_token;

pub struct Relocator {
    config: RelocationConfig,
    environment: RuntimeEnvironment,
    paths: OnceLock<TargetPaths>,
}

impl Relocator {
    #[must_use]
    pub fn new(config: RelocationConfig, environment: RuntimeEnvironment) -> Self {
        Self {
            config,
            environment,
            paths: OnceLock::new(),
        }
    }

    /// Default configuration with the detected runtime environment.
    #[must_use]
    pub fn from_environment() -> Self {
        Self::new(RelocationConfig::default(), RuntimeEnvironment::detect())
    }

    #[must_use]
    pub const fn config(&self) -> &RelocationConfig {
        &self.config
    }

    /// Relocated directories, derived once per relocator.
    pub fn target_paths(&self) -> &TargetPaths {
        self.paths.get_or_init(|| {
            derive_with(
                &self.environment.prefix,
                self.environment.platform(),
                &self.config.templates,
            )
        })
    }

    /// Relocates and reports the outcome through the context's sink.
    pub fn process(&self, ctx: &InstallContext<'_>) -> RelocationOutcome {
        let outcome = self.relocate(ctx);
        match &outcome {
            RelocationOutcome::Relocated { paths, .. } => {
                ctx.sink
                    .debug(&format!("Transplanted confdir: {}", paths.confdir));
                ctx.sink
                    .debug(&format!("Transplanted vardir:  {}", paths.vardir));
            }
            RelocationOutcome::NotApplicable { .. } => {}
            RelocationOutcome::Failed(e) => {
                ctx.sink
                    .alert_error(&format!("Transplant relocation failed: {e}"));
            }
        }
        outcome
    }

    pub fn relocate(&self, ctx: &InstallContext<'_>) -> RelocationOutcome {
        if let Some(outcome) = self.not_applicable(ctx) {
            return outcome;
        }
        let source = self.locate_source(ctx);
        let module = InstalledPackage::at(source.clone(), &self.config.source_file_name);
        self.relocate_located(ctx, &module, source.as_deref())
    }

    /// Relocates using `module` to look up the override extension point.
    pub fn relocate_with(
        &self,
        ctx: &InstallContext<'_>,
        module: &dyn PackageModule,
    ) -> RelocationOutcome {
        if let Some(outcome) = self.not_applicable(ctx) {
            return outcome;
        }
        let source = self.locate_source(ctx);
        self.relocate_located(ctx, module, source.as_deref())
    }

    fn relocate_located(
        &self,
        ctx: &InstallContext<'_>,
        module: &dyn PackageModule,
        source: Option<&Path>,
    ) -> RelocationOutcome {
        match self.apply(ctx, module, source) {
            Ok((strategy, files)) => RelocationOutcome::Relocated {
                paths: self.target_paths().clone(),
                strategy,
                files,
            },
            Err(e) => RelocationOutcome::Failed(e),
        }
    }

    /// Absolute path of the default-path source file, looked up once per attempt.
    fn locate_source(&self, ctx: &InstallContext<'_>) -> Option<PathBuf> {
        ctx.find_installed(&self.config.source_file_name)
            .map(|relative| ctx.absolute(relative))
    }

    fn not_applicable(&self, ctx: &InstallContext<'_>) -> Option<RelocationOutcome> {
        (ctx.package_name != self.config.target_package).then(|| {
            RelocationOutcome::NotApplicable {
                package: ctx.package_name.clone(),
            }
        })
    }

    fn apply(
        &self,
        ctx: &InstallContext<'_>,
        module: &dyn PackageModule,
        source: Option<&Path>,
    ) -> Result<(AppliedStrategy, Vec<PathBuf>)> {
        self.config.validate()?;

        let paths = self.target_paths();
        ctx.sink.debug(&format!(
            "Relocating {} {} for organisation '{}'",
            ctx.package_name, ctx.package_version, paths.org
        ));

        let api = match self.config.strategy {
            Strategy::InPlace => None,
            Strategy::Auto => MechanismDetector::probe(module, ctx.sink),
            Strategy::OverrideFiles => Some(
                MechanismDetector::probe(module, ctx.sink).ok_or_else(|| {
                    RelocationError::InvalidConfig(format!(
                        "{} {} does not provide the override path API",
                        ctx.package_name, ctx.package_version
                    ))
                })?,
            ),
        };

        match api {
            Some(api) => {
                let files = self.write_override_files(api.as_ref(), paths)?;
                Ok((AppliedStrategy::OverrideFiles, files))
            }
            None => {
                let files = self.modify_source_in_place(ctx, source, paths)?;
                Ok((AppliedStrategy::InPlace, files))
            }
        }
    }

    fn write_override_files(
        &self,
        api: &dyn OverridePathApi,
        paths: &TargetPaths,
    ) -> Result<Vec<PathBuf>> {
        // both files are staged before either is renamed into place
        let mut staged = Vec::with_capacity(2);
        for (setting, value) in [
            (Setting::Confdir, &paths.confdir),
            (Setting::Vardir, &paths.vardir),
        ] {
            let contents = format!("{value}\n{}\n", self.config.marker);
            staged.push(stage(&api.override_path(setting), contents.as_bytes(), None)?);
        }
        commit_all(staged)
    }

    /// Every check and both substitutions happen before the single commit,
    /// so any failure leaves the source file as it was.
    fn modify_source_in_place(
        &self,
        ctx: &InstallContext<'_>,
        source: Option<&Path>,
        paths: &TargetPaths,
    ) -> Result<Vec<PathBuf>> {
        let source = source.map(Path::to_path_buf).ok_or_else(|| {
            RelocationError::SourceFileNotFound(self.config.source_file_name.clone())
        })?;

        if OpenOptions::new().read(true).open(&source).is_err() {
            return Err(RelocationError::NotReadable(source));
        }
        if OpenOptions::new().write(true).open(&source).is_err() {
            return Err(RelocationError::NotWritable(source));
        }

        let permissions = fs::metadata(&source)
            .map_err(|_| RelocationError::NotReadable(source.clone()))?
            .permissions();
        let original =
            fs::read(&source).map_err(|_| RelocationError::NotReadable(source.clone()))?;

        let confdir = replace_token(&original, &self.config.confdir_token, &paths.confdir);
        if confdir.replaced == 0 {
            return Err(RelocationError::ConfdirTokenNotFound(
                self.config.confdir_token.clone(),
            ));
        }

        let vardir = replace_token(&confdir.buffer, &self.config.vardir_token, &paths.vardir);
        if vardir.replaced == 0 {
            return Err(RelocationError::VardirTokenNotFound(
                self.config.vardir_token.clone(),
            ));
        }

        ctx.sink.debug(&format!(
            "Replacing {} confdir and {} vardir occurrences in {}",
            confdir.replaced,
            vardir.replaced,
            source.display()
        ));

        let mut staged = Vec::with_capacity(2);
        if self.config.backup {
            staged.push(stage(
                &backup_path(&source),
                &original,
                Some(permissions.clone()),
            )?);
        }
        staged.push(stage(&source, &vardir.buffer, Some(permissions))?);
        commit_all(staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingSink, sha256};

    const RUN_MODE: &str = "def conf_dir\n  \"/etc/puppet\"\nend\ndef var_dir\n  \"/var/lib/puppet\"\nend\n";

    fn relocator(config: RelocationConfig) -> Relocator {
        Relocator::new(config, RuntimeEnvironment::new("/opt/acme/lib/ruby", "linux-gnu"))
    }

    fn install(dir: &Path, source: &str) -> PathBuf {
        let relative = PathBuf::from("lib/puppet/util/run_mode.rb");
        let full = dir.join(&relative);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(&full, source).unwrap();
        relative
    }

    fn context<'a>(dir: &Path, files: Vec<PathBuf>, sink: &'a RecordingSink) -> InstallContext<'a> {
        InstallContext::new("puppet", "3.4.2", dir, files, sink)
    }

    struct FixedApi(PathBuf);

    impl OverridePathApi for FixedApi {
        fn override_path(&self, setting: Setting) -> PathBuf {
            self.0.join(format!("override_{}", setting.name()))
        }
    }

    struct WithApi(PathBuf);

    impl PackageModule for WithApi {
        fn load_extension(&self) -> Result<Option<Box<dyn OverridePathApi>>> {
            Ok(Some(Box::new(FixedApi(self.0.clone()))))
        }
    }

    struct BrokenModule;

    impl PackageModule for BrokenModule {
        fn load_extension(&self) -> Result<Option<Box<dyn OverridePathApi>>> {
            Err(RelocationError::NotReadable(PathBuf::from("run_mode.rb")))
        }
    }

    #[test]
    fn test_other_package_is_not_applicable() {
        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), RUN_MODE);
        let before = sha256(&dir.path().join(&relative));
        let sink = RecordingSink::default();
        let ctx = InstallContext::new("facter", "1.7.0", dir.path(), vec![relative.clone()], &sink);

        let outcome = relocator(RelocationConfig::default()).process(&ctx);

        assert_eq!(
            outcome,
            RelocationOutcome::NotApplicable {
                package: "facter".to_string()
            }
        );
        assert_eq!(sha256(&dir.path().join(&relative)), before);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        assert!(sink.debug_messages().is_empty());
    }

    #[test]
    fn test_in_place_relocation() {
        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), RUN_MODE);
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![relative.clone()], &sink);

        let outcome = relocator(RelocationConfig::default()).process(&ctx);

        let RelocationOutcome::Relocated {
            paths,
            strategy,
            files,
        } = outcome
        else {
            panic!("expected a relocated outcome");
        };
        assert_eq!(strategy, AppliedStrategy::InPlace);
        assert_eq!(paths.confdir, "/etc/acme/puppet");
        assert_eq!(files, vec![dir.path().join(&relative)]);
        assert_eq!(
            fs::read_to_string(dir.path().join(&relative)).unwrap(),
            "def conf_dir\n  \"/etc/acme/puppet\"\nend\ndef var_dir\n  \"/var/lib/acme/puppet\"\nend\n"
        );
        assert!(
            sink.debug_messages()
                .iter()
                .any(|m| m == "Transplanted confdir: /etc/acme/puppet")
        );
    }

    #[test]
    fn test_missing_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![PathBuf::from("lib/puppet.rb")], &sink);

        let outcome = relocator(RelocationConfig::default()).process(&ctx);

        assert_eq!(
            outcome.error(),
            Some(&RelocationError::SourceFileNotFound("run_mode.rb".to_string()))
        );
        assert_eq!(sink.error_messages().len(), 1);
        assert!(sink.error_messages()[0].starts_with("Transplant relocation failed:"));
    }

    #[test]
    fn test_listed_but_absent_source_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RecordingSink::default();
        let relative = PathBuf::from("lib/puppet/util/run_mode.rb");
        let ctx = context(dir.path(), vec![relative.clone()], &sink);

        let outcome = relocator(RelocationConfig::default()).relocate(&ctx);

        assert_eq!(
            outcome.error(),
            Some(&RelocationError::NotReadable(dir.path().join(relative)))
        );
    }

    #[test]
    fn test_missing_confdir_token_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), "var = \"/var/lib/puppet\"\n");
        let before = sha256(&dir.path().join(&relative));
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![relative.clone()], &sink);

        let outcome = relocator(RelocationConfig::default()).relocate(&ctx);

        assert!(matches!(
            outcome.error(),
            Some(RelocationError::ConfdirTokenNotFound(_))
        ));
        assert_eq!(sha256(&dir.path().join(&relative)), before);
    }

    #[test]
    fn test_missing_vardir_token_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), "conf = \"/etc/puppet\"\n");
        let before = sha256(&dir.path().join(&relative));
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![relative.clone()], &sink);

        let outcome = relocator(RelocationConfig::default()).relocate(&ctx);

        assert!(matches!(
            outcome.error(),
            Some(RelocationError::VardirTokenNotFound(_))
        ));
        assert_eq!(sha256(&dir.path().join(&relative)), before);
        assert_eq!(fs::read_dir(dir.path().join("lib/puppet/util")).unwrap().count(), 1);
    }

    #[test]
    fn test_second_run_reports_token_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), RUN_MODE);
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![relative.clone()], &sink);
        let relocator = relocator(RelocationConfig::default());

        assert!(relocator.relocate(&ctx).is_success());
        let patched = sha256(&dir.path().join(&relative));

        let outcome = relocator.relocate(&ctx);

        assert!(outcome.error().is_some_and(RelocationError::is_token_not_found));
        assert_eq!(sha256(&dir.path().join(&relative)), patched);
    }

    #[test]
    fn test_override_files_written_when_api_present() {
        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), RUN_MODE);
        let before = sha256(&dir.path().join(&relative));
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![relative.clone()], &sink);
        let module = WithApi(dir.path().join("overrides"));

        let outcome = relocator(RelocationConfig::default()).relocate_with(&ctx, &module);

        let RelocationOutcome::Relocated { strategy, files, .. } = outcome else {
            panic!("expected a relocated outcome");
        };
        assert_eq!(strategy, AppliedStrategy::OverrideFiles);
        assert_eq!(files.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("overrides/override_confdir")).unwrap(),
            "/etc/acme/puppet\n# Automatically overridden by the transplant tool\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("overrides/override_vardir")).unwrap(),
            "/var/lib/acme/puppet\n# Automatically overridden by the transplant tool\n"
        );
        assert_eq!(sha256(&dir.path().join(&relative)), before);
    }

    #[test]
    fn test_broken_probe_falls_back_to_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), RUN_MODE);
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![relative], &sink);

        let outcome = relocator(RelocationConfig::default()).relocate_with(&ctx, &BrokenModule);

        assert!(matches!(
            outcome,
            RelocationOutcome::Relocated {
                strategy: AppliedStrategy::InPlace,
                ..
            }
        ));
    }

    #[test]
    fn test_in_place_strategy_skips_probe() {
        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), RUN_MODE);
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![relative], &sink);
        let config = RelocationConfig {
            strategy: Strategy::InPlace,
            ..RelocationConfig::default()
        };

        let outcome = relocator(config).relocate_with(&ctx, &WithApi(dir.path().join("o")));

        assert!(matches!(
            outcome,
            RelocationOutcome::Relocated {
                strategy: AppliedStrategy::InPlace,
                ..
            }
        ));
        assert!(!dir.path().join("o").exists());
    }

    #[test]
    fn test_forced_override_without_api_fails() {
        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), RUN_MODE);
        let before = sha256(&dir.path().join(&relative));
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![relative.clone()], &sink);
        let config = RelocationConfig {
            strategy: Strategy::OverrideFiles,
            ..RelocationConfig::default()
        };

        let outcome = relocator(config).relocate(&ctx);

        assert!(matches!(
            outcome.error(),
            Some(RelocationError::InvalidConfig(_))
        ));
        assert_eq!(sha256(&dir.path().join(&relative)), before);
    }

    #[test]
    fn test_backup_keeps_original_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), RUN_MODE);
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![relative.clone()], &sink);
        let config = RelocationConfig {
            backup: true,
            ..RelocationConfig::default()
        };

        let outcome = relocator(config).relocate(&ctx);

        let RelocationOutcome::Relocated { files, .. } = outcome else {
            panic!("expected a relocated outcome");
        };
        let backup = dir.path().join("lib/puppet/util/run_mode.rb.orig");
        assert_eq!(files, vec![backup.clone(), dir.path().join(&relative)]);
        assert_eq!(fs::read_to_string(backup).unwrap(), RUN_MODE);
    }

    #[test]
    fn test_target_paths_are_cached() {
        let relocator = relocator(RelocationConfig::default());

        let first: *const TargetPaths = relocator.target_paths();
        let second: *const TargetPaths = relocator.target_paths();

        assert_eq!(first, second);
        assert_eq!(relocator.target_paths().org, "acme");
    }

    #[cfg(unix)]
    #[test]
    fn test_in_place_preserves_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), RUN_MODE);
        let full = dir.path().join(&relative);
        fs::set_permissions(&full, fs::Permissions::from_mode(0o664)).unwrap();
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![relative], &sink);

        assert!(relocator(RelocationConfig::default()).relocate(&ctx).is_success());

        let mode = fs::metadata(&full).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o664);
    }

    struct SplitApi {
        confdir: PathBuf,
        vardir: PathBuf,
    }

    impl OverridePathApi for SplitApi {
        fn override_path(&self, setting: Setting) -> PathBuf {
            match setting {
                Setting::Confdir => self.confdir.clone(),
                Setting::Vardir => self.vardir.clone(),
            }
        }
    }

    struct WithSplitApi(PathBuf, PathBuf);

    impl PackageModule for WithSplitApi {
        fn load_extension(&self) -> Result<Option<Box<dyn OverridePathApi>>> {
            Ok(Some(Box::new(SplitApi {
                confdir: self.0.clone(),
                vardir: self.1.clone(),
            })))
        }
    }

    #[test]
    fn test_unwritable_vardir_override_leaves_no_confdir_override() {
        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), RUN_MODE);
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![relative], &sink);
        // a regular file where the vardir override's directory should be
        fs::write(dir.path().join("blocker"), "").unwrap();
        let confdir = dir.path().join("override_confdir");
        let module = WithSplitApi(confdir.clone(), dir.path().join("blocker/override_vardir"));

        let outcome = relocator(RelocationConfig::default()).relocate_with(&ctx, &module);

        assert!(matches!(
            outcome.error(),
            Some(RelocationError::WriteFailure(..))
        ));
        assert!(!confdir.exists());
    }

    #[test]
    fn test_failed_vardir_rename_rolls_back_confdir_override() {
        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), RUN_MODE);
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![relative], &sink);
        let confdir = dir.path().join("override_confdir");
        fs::write(&confdir, "/etc/previous/puppet\n").unwrap();
        let vardir = dir.path().join("override_vardir");
        fs::create_dir(&vardir).unwrap();
        let module = WithSplitApi(confdir.clone(), vardir.clone());

        let outcome = relocator(RelocationConfig::default()).relocate_with(&ctx, &module);

        assert_eq!(
            outcome.error().map(RelocationError::kind),
            Some("write_failure")
        );
        assert_eq!(
            fs::read_to_string(&confdir).unwrap(),
            "/etc/previous/puppet\n"
        );
        assert!(vardir.is_dir());
    }

    #[test]
    fn test_directory_at_source_path_is_not_writable() {
        let dir = tempfile::tempdir().unwrap();
        let relative = PathBuf::from("lib/puppet/util/run_mode.rb");
        let source = dir.path().join(&relative);
        fs::create_dir_all(&source).unwrap();
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![relative], &sink);
        let config = RelocationConfig {
            strategy: Strategy::InPlace,
            ..RelocationConfig::default()
        };

        let outcome = relocator(config).process(&ctx);

        assert_eq!(
            outcome.error(),
            Some(&RelocationError::NotWritable(source.clone()))
        );
        assert!(sink.error_messages()[0].contains("not writable"));
        assert!(source.is_dir());
        assert_eq!(fs::read_dir(&source).unwrap().count(), 0);
        assert_eq!(fs::read_dir(dir.path().join("lib/puppet/util")).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_source_is_not_writable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), RUN_MODE);
        let full = dir.path().join(&relative);
        fs::set_permissions(&full, fs::Permissions::from_mode(0o444)).unwrap();
        if OpenOptions::new().write(true).open(&full).is_ok() {
            // running with privileges that ignore file modes
            return;
        }
        let before = sha256(&full);
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![relative], &sink);

        let outcome = relocator(RelocationConfig::default()).relocate(&ctx);

        assert_eq!(outcome.error(), Some(&RelocationError::NotWritable(full.clone())));
        assert_eq!(sha256(&full), before);
        assert_eq!(
            fs::metadata(&full).unwrap().permissions().mode() & 0o777,
            0o444
        );
    }

    #[test]
    fn test_duplicate_sources_are_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), RUN_MODE);
        let sink = RecordingSink::default();
        let ctx = context(
            dir.path(),
            vec![relative, PathBuf::from("spec/fixtures/run_mode.rb")],
            &sink,
        );

        assert!(relocator(RelocationConfig::default()).relocate(&ctx).is_success());

        let duplicates = sink
            .debug_messages()
            .iter()
            .filter(|m| m.contains("more files named run_mode.rb"))
            .count();
        assert_eq!(duplicates, 1);
    }

    #[test]
    fn test_failed_backup_commit_leaves_source_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let relative = install(dir.path(), RUN_MODE);
        let sink = RecordingSink::default();
        let ctx = context(dir.path(), vec![relative.clone()], &sink);
        // the backup destination is a directory, so its rename fails first
        let backup = dir.path().join("lib/puppet/util/run_mode.rb.orig");
        fs::create_dir(&backup).unwrap();
        let before = sha256(&dir.path().join(&relative));
        let config = RelocationConfig {
            backup: true,
            ..RelocationConfig::default()
        };

        let outcome = relocator(config).relocate(&ctx);

        assert!(matches!(
            outcome.error(),
            Some(RelocationError::WriteFailure(..))
        ));
        assert_eq!(sha256(&dir.path().join(&relative)), before);
        assert!(backup.is_dir());
    }
}
