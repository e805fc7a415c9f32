use std::env;

use transplant_constants::WINDOWS_HOST_MARKERS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    /// Classifies a host-OS identifier such as `x86_64-linux` or `mingw32`.
    #[must_use]
    pub fn from_host_os(host_os: &str) -> Self {
        let host_os = host_os.to_ascii_lowercase();
        if WINDOWS_HOST_MARKERS
            .iter()
            .any(|marker| host_os.contains(marker))
        {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    /// Index of the organisation segment once a normalised prefix is split on `/`.
    #[must_use]
    pub const fn org_segment_index(self) -> usize {
        match self {
            Self::Posix => 2,
            Self::Windows => 1,
        }
    }
}

/// Host-OS identifier of the running binary, in the `<os>-<env>` shape the
/// marker match expects (`windows-msvc`, `linux-gnu`, `macos`).
#[must_use]
pub fn current_host_os() -> String {
    let target_env = if cfg!(target_env = "gnu") {
        "gnu"
    } else if cfg!(target_env = "msvc") {
        "msvc"
    } else if cfg!(target_env = "musl") {
        "musl"
    } else {
        ""
    };

    if target_env.is_empty() {
        env::consts::OS.to_string()
    } else {
        format!("{}-{target_env}", env::consts::OS)
    }
}
