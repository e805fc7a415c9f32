pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = "Relocates the default confdir and vardir of an installed puppet package";
pub const BIN_NAME: &str = "transplant";

/// The one package this tool relocates.
pub const TARGET_PACKAGE: &str = "puppet";

/// File (matched by suffix against the installed file list) that holds the
/// default confdir and vardir.
pub const SOURCE_FILE_NAME: &str = "run_mode.rb";

pub const DEFAULT_CONFDIR_TOKEN: &str = "/etc/puppet";
pub const DEFAULT_VARDIR_TOKEN: &str = "/var/lib/puppet";

/// `{org}` is replaced with the organisation name.
pub const ORG_PLACEHOLDER: &str = "{org}";
pub const CONFDIR_TEMPLATE: &str = "/etc/{org}/puppet";
pub const VARDIR_TEMPLATE: &str = "/var/lib/{org}/puppet";

pub const UNKNOWN_ORG: &str = "unknown";

/// Host-OS identifiers containing any of these (case-insensitive) are Windows.
pub const WINDOWS_HOST_MARKERS: &[&str] = &["mswin", "mingw", "cygwin", "windows"];

/// Source declaration that marks a package release as exposing the
/// override-path extension point.
pub const OVERRIDE_API_SIGNATURE: &str = "def self.override_path";
pub const CONFDIR_OVERRIDE_FILE: &str = "override_confdir";
pub const VARDIR_OVERRIDE_FILE: &str = "override_vardir";

pub const OVERRIDE_MARKER: &str = "# Automatically overridden by the transplant tool";

pub const BACKUP_EXTENSION: &str = "orig";

pub const PREFIX_ENV: &str = "TRANSPLANT_PREFIX";
pub const HOST_OS_ENV: &str = "TRANSPLANT_HOST_OS";
