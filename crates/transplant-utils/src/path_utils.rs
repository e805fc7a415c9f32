use serde::Serialize;

use transplant_constants::{CONFDIR_TEMPLATE, ORG_PLACEHOLDER, UNKNOWN_ORG, VARDIR_TEMPLATE};

use crate::platform::Platform;

/// Confdir and vardir patterns containing an `{org}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplates {
    pub confdir: String,
    pub vardir: String,
}

impl Default for PathTemplates {
    fn default() -> Self {
        Self {
            confdir: CONFDIR_TEMPLATE.to_string(),
            vardir: VARDIR_TEMPLATE.to_string(),
        }
    }
}

impl PathTemplates {
    #[must_use]
    pub fn expand(&self, org: &str) -> (String, String) {
        (
            self.confdir.replace(ORG_PLACEHOLDER, org),
            self.vardir.replace(ORG_PLACEHOLDER, org),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetPaths {
    pub org: String,
    pub confdir: String,
    pub vardir: String,
}

/// Derives the organisation and relocated directories with the default templates.
#[must_use]
pub fn derive(prefix: &str, platform: Platform) -> TargetPaths {
    derive_with(prefix, platform, &PathTemplates::default())
}

#[must_use]
pub fn derive_with(prefix: &str, platform: Platform, templates: &PathTemplates) -> TargetPaths {
    let org = org_name(prefix, platform);
    let (confdir, vardir) = templates.expand(&org);
    TargetPaths {
        org,
        confdir,
        vardir,
    }
}

/// Organisation segment of the prefix, or `unknown` when the path is too shallow.
#[must_use]
pub fn org_name(prefix: &str, platform: Platform) -> String {
    let normalized = normalize_prefix(prefix, platform);
    normalized
        .split('/')
        .nth(platform.org_segment_index())
        .filter(|segment| !segment.is_empty())
        .unwrap_or(UNKNOWN_ORG)
        .to_string()
}

/// Lexically normalises a prefix into an absolute, `/`-separated path.
///
/// Backslashes become `/`, empty and `.` segments are dropped and `..` pops
/// the previous segment (never past the root). On Windows a leading drive
/// component (`C:`) is kept as the root. A relative prefix is anchored at the
/// root; callers that want it resolved against a working directory must join
/// it themselves first.
#[must_use]
pub fn normalize_prefix(prefix: &str, platform: Platform) -> String {
    let unified = prefix.replace('\\', "/");
    let mut raw = unified.split('/').peekable();

    let drive = match (platform, raw.peek()) {
        (Platform::Windows, Some(first)) if is_drive(first) => {
            let drive = first.to_ascii_uppercase();
            raw.next();
            Some(drive)
        }
        _ => None,
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let root = drive.unwrap_or_default();
    format!("{root}/{}", segments.join("/"))
}

/// Whether `path` starts with a drive component such as `C:/` or `d:\\`,
/// regardless of the host it is evaluated on.
#[must_use]
pub fn has_drive_prefix(path: &str) -> bool {
    path.split(['/', '\\']).next().is_some_and(is_drive)
}

fn is_drive(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2
        && bytes.first().is_some_and(u8::is_ascii_alphabetic)
        && bytes.get(1) == Some(&b':')
}
