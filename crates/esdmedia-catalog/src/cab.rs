//! Cab decompression capability.
//!
//! The catalog ships as a Microsoft cabinet; decompression is delegated to
//! the host `cabextract` tool rather than reimplemented.

use crate::CatalogError;
use std::path::Path;
use std::process::Command;

/// Extract one named entry out of an archive into a destination file.
/// Fails when the entry is absent from the archive.
pub trait EntryExtractor {
    fn extract_named_entry(
        &self,
        archive: &Path,
        entry: &str,
        dest: &Path,
    ) -> Result<(), CatalogError>;
}

/// `cabextract`-backed extractor. Availability is checked lazily on first
/// use so the catalog command works without the tool as long as a decompressed
/// document is already present.
#[derive(Debug, Default)]
pub struct CabextractTool;

impl CabextractTool {
    pub fn new() -> Self {
        Self
    }

    pub fn available() -> bool {
        Command::new("which")
            .arg("cabextract")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl EntryExtractor for CabextractTool {
    fn extract_named_entry(
        &self,
        archive: &Path,
        entry: &str,
        dest: &Path,
    ) -> Result<(), CatalogError> {
        if !Self::available() {
            return Err(CatalogError::Archive(
                "cabextract not found (install: zypper install cabextract | apt install cabextract \
                 | dnf install cabextract | pacman -S cabextract)"
                    .to_owned(),
            ));
        }

        let staging_base = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let staging = tempfile::tempdir_in(staging_base)?;
        tracing::debug!("cabextract {} -F {entry}", archive.display());
        let output = Command::new("cabextract")
            .arg("-d")
            .arg(staging.path())
            .arg("-F")
            .arg(entry)
            .arg(archive)
            .output()
            .map_err(|e| CatalogError::Archive(format!("failed to run cabextract: {e}")))?;

        if !output.status.success() {
            return Err(CatalogError::Archive(format!(
                "cabextract failed on '{}': {}",
                archive.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // cabextract exits zero even when the filter matched nothing; the
        // entry's absence shows up as a missing staged file.
        let staged = staging.path().join(entry);
        if !staged.exists() {
            return Err(CatalogError::Archive(format!(
                "'{entry}' not found in {}",
                archive.display()
            )));
        }

        std::fs::rename(&staged, dest).or_else(|_| {
            std::fs::copy(&staged, dest).map(|_| ())
        })?;
        Ok(())
    }
}
