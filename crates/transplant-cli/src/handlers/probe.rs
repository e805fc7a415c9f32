use std::path::Path;

use anyhow::{Context, Result};

use transplant_constants::{SOURCE_FILE_NAME, TARGET_PACKAGE};
use transplant_core::{
    InstallContext, InstalledPackage, collect_installed_files, supports_override_api,
};
use transplant_logger::ConsoleSink;

pub struct ProbeHandler;

impl ProbeHandler {
    pub fn handle(install_dir: &Path, debug: bool) -> Result<()> {
        let files = collect_installed_files(install_dir).with_context(|| {
            format!("Failed to list installed files in {}", install_dir.display())
        })?;

        let sink = ConsoleSink::new(debug);
        let ctx = InstallContext::new(TARGET_PACKAGE, "unknown", install_dir, files, &sink);

        match ctx.find_installed(SOURCE_FILE_NAME) {
            Some(source) => {
                transplant_logger::info(&format!("default paths defined in {}", source.display()));
            }
            None => {
                transplant_logger::warn(&format!(
                    "{SOURCE_FILE_NAME} not found under {}",
                    install_dir.display()
                ));
            }
        }

        let module = InstalledPackage::new(&ctx, SOURCE_FILE_NAME);
        if supports_override_api(&module, &sink) {
            transplant_logger::success("override path API available: override-files strategy");
        } else {
            transplant_logger::info("override path API unavailable: in-place strategy");
        }

        Ok(())
    }
}
