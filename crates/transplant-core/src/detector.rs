use std::fs;
use std::path::{Path, PathBuf};

use transplant_constants::{CONFDIR_OVERRIDE_FILE, OVERRIDE_API_SIGNATURE, VARDIR_OVERRIDE_FILE};
use transplant_error::{RelocationError, Result};
use transplant_logger::MessageSink;

use crate::context::InstallContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Confdir,
    Vardir,
}

impl Setting {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Confdir => "confdir",
            Self::Vardir => "vardir",
        }
    }
}

/// Extension point through which a package lets its default directories be
/// redirected without editing its source.
pub trait OverridePathApi {
    /// Location of the declaration file overriding `setting`.
    fn override_path(&self, setting: Setting) -> PathBuf;
}

/// A package release that may or may not expose the override extension point.
pub trait PackageModule {
    /// `Ok(None)` when the release predates the extension point.
    fn load_extension(&self) -> Result<Option<Box<dyn OverridePathApi>>>;
}

/// Installed package whose extension point is declared in its default-path
/// source file.
pub struct InstalledPackage {
    source: Option<PathBuf>,
    source_file_name: String,
}

impl InstalledPackage {
    #[must_use]
    pub fn new(ctx: &InstallContext<'_>, source_file_name: &str) -> Self {
        let source = ctx
            .find_installed(source_file_name)
            .map(|relative| ctx.absolute(relative));
        Self::at(source, source_file_name)
    }

    /// Package whose source file was already located (`None` when absent).
    #[must_use]
    pub fn at(source: Option<PathBuf>, source_file_name: &str) -> Self {
        Self {
            source,
            source_file_name: source_file_name.to_string(),
        }
    }
}

impl PackageModule for InstalledPackage {
    fn load_extension(&self) -> Result<Option<Box<dyn OverridePathApi>>> {
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| RelocationError::SourceFileNotFound(self.source_file_name.clone()))?;

        let contents =
            fs::read(source).map_err(|_| RelocationError::NotReadable(source.to_path_buf()))?;
        if !contains(&contents, OVERRIDE_API_SIGNATURE.as_bytes()) {
            return Ok(None);
        }

        let dir = source.parent().unwrap_or_else(|| Path::new("."));
        Ok(Some(Box::new(SourceOverrideApi {
            dir: dir.to_path_buf(),
        })))
    }
}

struct SourceOverrideApi {
    dir: PathBuf,
}

impl OverridePathApi for SourceOverrideApi {
    fn override_path(&self, setting: Setting) -> PathBuf {
        match setting {
            Setting::Confdir => self.dir.join(CONFDIR_OVERRIDE_FILE),
            Setting::Vardir => self.dir.join(VARDIR_OVERRIDE_FILE),
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

pub struct MechanismDetector;

impl MechanismDetector {
    /// Loads the extension point, treating every load failure as absence.
    pub fn probe(
        module: &dyn PackageModule,
        sink: &dyn MessageSink,
    ) -> Option<Box<dyn OverridePathApi>> {
        match module.load_extension() {
            Ok(Some(api)) => Some(api),
            Ok(None) => {
                sink.debug("Override path API not available in this release");
                None
            }
            Err(e) => {
                sink.debug(&format!("Override path API could not be loaded: {e}"));
                None
            }
        }
    }
}

#[must_use]
pub fn supports_override_api(module: &dyn PackageModule, sink: &dyn MessageSink) -> bool {
    MechanismDetector::probe(module, sink).is_some()
}
