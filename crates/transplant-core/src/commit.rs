use std::fs::{self, Permissions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use transplant_constants::BACKUP_EXTENSION;
use transplant_error::{RelocationError, Result};

/// A write prepared in a temp file beside its destination, not yet visible
/// at the destination.
pub struct StagedWrite {
    path: PathBuf,
    temp: NamedTempFile,
}

impl StagedWrite {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(self) -> Result<()> {
        let Self { path, temp } = self;
        temp.persist(&path)
            .map_err(|e| RelocationError::WriteFailure(path.clone(), e.error.to_string()))?;
        Ok(())
    }
}

/// Writes `contents` to a synced temp file in the directory of `path`.
/// Nothing at `path` changes until the write is committed.
pub fn stage(
    path: &Path,
    contents: &[u8],
    permissions: Option<Permissions>,
) -> Result<StagedWrite> {
    let fail = |e: std::io::Error| RelocationError::WriteFailure(path.to_path_buf(), e.to_string());

    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(fail)?;

    let mut temp = NamedTempFile::new_in(parent).map_err(fail)?;
    temp.write_all(contents).map_err(fail)?;
    temp.as_file().sync_all().map_err(fail)?;

    if let Some(permissions) = permissions.or_else(new_file_permissions) {
        temp.as_file().set_permissions(permissions).map_err(fail)?;
    }

    Ok(StagedWrite {
        path: path.to_path_buf(),
        temp,
    })
}

/// Writes `contents` to a temp file beside `path` and renames it into place,
/// so readers see either the old file or the complete new one.
pub fn write_atomic(path: &Path, contents: &[u8], permissions: Option<Permissions>) -> Result<()> {
    stage(path, contents, permissions)?.persist()
}

/// Renames every staged write into place, in order. If a rename fails, the
/// destinations already replaced get their previous contents back, or are
/// removed when they did not exist before.
pub fn commit_all(staged: Vec<StagedWrite>) -> Result<Vec<PathBuf>> {
    let mut committed: Vec<(PathBuf, Option<Previous>)> = Vec::with_capacity(staged.len());

    for write in staged {
        let path = write.path.clone();
        let previous = Previous::capture(&path);
        if let Err(e) = write.persist() {
            roll_back(committed);
            return Err(e);
        }
        committed.push((path, previous));
    }

    Ok(committed.into_iter().map(|(path, _)| path).collect())
}

struct Previous {
    bytes: Vec<u8>,
    permissions: Permissions,
}

impl Previous {
    fn capture(path: &Path) -> Option<Self> {
        let permissions = fs::metadata(path).ok()?.permissions();
        let bytes = fs::read(path).ok()?;
        Some(Self { bytes, permissions })
    }
}

// Best effort: the original failure is what gets reported.
fn roll_back(committed: Vec<(PathBuf, Option<Previous>)>) {
    for (path, previous) in committed.into_iter().rev() {
        match previous {
            Some(previous) => {
                let _ = write_atomic(&path, &previous.bytes, Some(previous.permissions));
            }
            None => {
                let _ = fs::remove_file(&path);
            }
        }
    }
}

#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(BACKUP_EXTENSION);
    PathBuf::from(name)
}

#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}
