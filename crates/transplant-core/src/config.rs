use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use transplant_constants::{
    DEFAULT_CONFDIR_TOKEN, DEFAULT_VARDIR_TOKEN, HOST_OS_ENV, OVERRIDE_MARKER, PREFIX_ENV,
    SOURCE_FILE_NAME, TARGET_PACKAGE,
};
use transplant_error::{RelocationError, Result};
use transplant_utils::{PathTemplates, Platform, has_drive_prefix, platform::current_host_os};

/// Which write path a relocation may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Override files when the extension point exists, in-place otherwise.
    #[default]
    Auto,
    /// Override files only; fails when the extension point is missing.
    OverrideFiles,
    /// In-place substitution without probing for the extension point.
    InPlace,
}

impl FromStr for Strategy {
    type Err = RelocationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "override-files" => Ok(Self::OverrideFiles),
            "in-place" => Ok(Self::InPlace),
            other => Err(RelocationError::InvalidConfig(format!(
                "unknown strategy '{other}' (expected auto, override-files or in-place)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationConfig {
    pub target_package: String,
    pub source_file_name: String,
    pub confdir_token: String,
    pub vardir_token: String,
    pub templates: PathTemplates,
    pub marker: String,
    pub strategy: Strategy,
    /// Keep a `<source>.orig` copy of the unmodified file on in-place commits.
    pub backup: bool,
}

impl Default for RelocationConfig {
    fn default() -> Self {
        Self {
            target_package: TARGET_PACKAGE.to_string(),
            source_file_name: SOURCE_FILE_NAME.to_string(),
            confdir_token: DEFAULT_CONFDIR_TOKEN.to_string(),
            vardir_token: DEFAULT_VARDIR_TOKEN.to_string(),
            templates: PathTemplates::default(),
            marker: OVERRIDE_MARKER.to_string(),
            strategy: Strategy::Auto,
            backup: false,
        }
    }
}

impl RelocationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.source_file_name.is_empty() {
            return Err(RelocationError::InvalidConfig(
                "source file name is empty".to_string(),
            ));
        }
        if self.confdir_token.is_empty() || self.vardir_token.is_empty() {
            return Err(RelocationError::InvalidConfig(
                "default path tokens must not be empty".to_string(),
            ));
        }
        if self.confdir_token == self.vardir_token {
            return Err(RelocationError::InvalidConfig(
                "confdir and vardir tokens must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runtime inputs of the path derivation: installation prefix and host OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEnvironment {
    pub prefix: String,
    pub host_os: String,
}

impl RuntimeEnvironment {
    pub fn new(prefix: impl Into<String>, host_os: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            host_os: host_os.into(),
        }
    }

    /// Reads `TRANSPLANT_PREFIX` / `TRANSPLANT_HOST_OS`, falling back to the
    /// prefix the running executable is installed under and the build target.
    #[must_use]
    pub fn detect() -> Self {
        let prefix = non_empty_var(PREFIX_ENV)
            .map(PathBuf::from)
            .or_else(executable_prefix)
            .map(|prefix| absolutize(&prefix))
            .unwrap_or_default();
        let host_os = non_empty_var(HOST_OS_ENV).unwrap_or_else(current_host_os);

        Self { prefix, host_os }
    }

    /// Replaces the prefix, anchoring a relative one at the current directory.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = absolutize(Path::new(prefix));
        self
    }

    #[must_use]
    pub fn with_host_os(mut self, host_os: &str) -> Self {
        self.host_os = host_os.to_string();
        self
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        Platform::from_host_os(&self.host_os)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

/// `<prefix>/bin/<exe>` yields `<prefix>`.
fn executable_prefix() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    exe.parent()?.parent().map(Path::to_path_buf)
}

/// Drive-prefixed paths count as absolute on every host, so a Windows prefix
/// given on a POSIX build keeps its own segments.
fn absolutize(path: &Path) -> String {
    let text = path.to_string_lossy();
    if has_drive_prefix(&text) {
        return text.into_owned();
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    absolute.to_string_lossy().into_owned()
}
