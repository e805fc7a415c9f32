use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use transplant_logger::MessageSink;

/// Read-only view of one package installation, valid for a single relocation call.
pub struct InstallContext<'a> {
    pub package_name: String,
    pub package_version: String,
    pub install_dir: PathBuf,
    /// Installed files, relative to `install_dir`.
    pub installed_files: Vec<PathBuf>,
    pub sink: &'a dyn MessageSink,
}

impl<'a> InstallContext<'a> {
    pub fn new(
        package_name: impl Into<String>,
        package_version: impl Into<String>,
        install_dir: impl Into<PathBuf>,
        installed_files: Vec<PathBuf>,
        sink: &'a dyn MessageSink,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            package_version: package_version.into(),
            install_dir: install_dir.into(),
            installed_files,
            sink,
        }
    }

    /// First installed file whose trailing components equal `file_name`.
    #[must_use]
    pub fn find_installed(&self, file_name: &str) -> Option<&Path> {
        let wanted = Path::new(file_name);
        let mut matches = self
            .installed_files
            .iter()
            .filter(|path| path.ends_with(wanted));

        let first = matches.next()?;
        let extra = matches.count();
        if extra > 0 {
            self.sink.debug(&format!(
                "{extra} more files named {file_name}; using {}",
                first.display()
            ));
        }
        Some(first.as_path())
    }

    #[must_use]
    pub fn absolute(&self, relative: &Path) -> PathBuf {
        self.install_dir.join(relative)
    }
}

/// Lists every regular file below `install_dir` as a sorted relative path.
pub fn collect_installed_files(install_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk(install_dir, install_dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            walk(root, &path, files)?;
        } else if file_type.is_file() {
            if let Ok(relative) = path.strip_prefix(root) {
                files.push(relative.to_path_buf());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingSink;

    #[test]
    fn test_find_installed_matches_whole_file_name() {
        let sink = RecordingSink::default();
        let ctx = InstallContext::new(
            "puppet",
            "3.4.2",
            "/gems/puppet-3.4.2",
            vec![
                PathBuf::from("lib/puppet/util/not_run_mode.rb"),
                PathBuf::from("lib/puppet/util/run_mode.rb"),
            ],
            &sink,
        );

        assert_eq!(
            ctx.find_installed("run_mode.rb"),
            Some(Path::new("lib/puppet/util/run_mode.rb"))
        );
        assert_eq!(ctx.find_installed("settings.rb"), None);
    }

    #[test]
    fn test_find_installed_reports_duplicates() {
        let sink = RecordingSink::default();
        let ctx = InstallContext::new(
            "puppet",
            "3.4.2",
            "/gems/puppet-3.4.2",
            vec![
                PathBuf::from("lib/puppet/util/run_mode.rb"),
                PathBuf::from("spec/fixtures/run_mode.rb"),
            ],
            &sink,
        );

        assert_eq!(
            ctx.find_installed("run_mode.rb"),
            Some(Path::new("lib/puppet/util/run_mode.rb"))
        );
        assert_eq!(sink.debug_messages().len(), 1);
    }

    #[test]
    fn test_collect_installed_files_is_sorted_and_relative() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib/puppet/util")).unwrap();
        fs::write(dir.path().join("lib/puppet/util/run_mode.rb"), "x").unwrap();
        fs::write(dir.path().join("README.md"), "x").unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();

        let files = collect_installed_files(dir.path()).unwrap();

        assert_eq!(
            files,
            vec![
                PathBuf::from("README.md"),
                PathBuf::from("lib/puppet/util/run_mode.rb"),
            ]
        );
    }
}
