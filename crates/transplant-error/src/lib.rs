use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationError {
    SourceFileNotFound(String),
    NotReadable(PathBuf),
    NotWritable(PathBuf),
    ConfdirTokenNotFound(String),
    VardirTokenNotFound(String),
    WriteFailure(PathBuf, String),
    InvalidConfig(String),
}

impl RelocationError {
    /// Stable tag for the failure class, used in machine-readable output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SourceFileNotFound(_) => "source_file_not_found",
            Self::NotReadable(_) | Self::NotWritable(_) => "permission_error",
            Self::ConfdirTokenNotFound(_) | Self::VardirTokenNotFound(_) => "token_not_found",
            Self::WriteFailure(..) => "write_failure",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }

    #[must_use]
    pub const fn is_token_not_found(&self) -> bool {
        matches!(
            self,
            Self::ConfdirTokenNotFound(_) | Self::VardirTokenNotFound(_)
        )
    }
}

impl fmt::Display for RelocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceFileNotFound(name) => {
                write!(f, "Could not find {name} in the file list")
            }
            Self::NotReadable(path) => {
                write!(f, "Permission error: {} is not readable", path.display())
            }
            Self::NotWritable(path) => {
                write!(f, "Permission error: {} is not writable", path.display())
            }
            Self::ConfdirTokenNotFound(token) => {
                write!(f, "Found no occurrences of confdir {token} to replace")
            }
            Self::VardirTokenNotFound(token) => {
                write!(f, "Found no occurrences of vardir {token} to replace")
            }
            Self::WriteFailure(path, reason) => {
                write!(f, "Failed to write {}: {reason}", path.display())
            }
            Self::InvalidConfig(msg) => {
                write!(f, "Invalid configuration: {msg}")
            }
        }
    }
}

impl std::error::Error for RelocationError {}

pub type Result<T> = std::result::Result<T, RelocationError>;
