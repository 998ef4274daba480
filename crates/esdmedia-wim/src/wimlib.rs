//! [`WimBackend`] implementation driving the host `wimlib-imagex` tool.
//!
//! Sources are scanned once at open time with `wimlib-imagex info` and the
//! per-image metadata is kept for the handle's lifetime. Targets spool into
//! a temporary WIM file that accumulates `wimlib-imagex export` runs; the
//! terminal `write` moves the spool to its destination.

use crate::backend::{Compression, SourceId, TargetId, WimBackend};
use crate::WimError;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, MutexGuard};

const TOOL: &str = "wimlib-imagex";

/// Capability property paths mapped to the labels `wimlib-imagex info`
/// prints. Paths outside this table read as absent.
fn property_label(property: &str) -> Option<&'static str> {
    match property {
        "NAME" => Some("Name"),
        "DESCRIPTION" => Some("Description"),
        "WINDOWS/ARCH" => Some("Architecture"),
        "WINDOWS/PRODUCTNAME" => Some("Product Name"),
        "WINDOWS/EDITIONID" => Some("Edition ID"),
        "WINDOWS/INSTALLATIONTYPE" => Some("Installation Type"),
        _ => None,
    }
}

#[derive(Debug)]
struct ImageInfo {
    fields: HashMap<String, String>,
}

impl ImageInfo {
    fn name(&self) -> String {
        self.fields.get("Name").cloned().unwrap_or_default()
    }
}

#[derive(Debug)]
struct SourceState {
    path: PathBuf,
    images: Vec<ImageInfo>,
}

#[derive(Debug)]
struct TargetState {
    /// Keeps the spool directory alive; dropping the state deletes it.
    _dir: tempfile::TempDir,
    spool: PathBuf,
}

#[derive(Default)]
struct State {
    next_id: u64,
    sources: HashMap<u64, SourceState>,
    targets: HashMap<u64, TargetState>,
}

#[derive(Default)]
pub struct WimlibBackend {
    state: Mutex<State>,
}

impl WimlibBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, WimError> {
        self.state
            .lock()
            .map_err(|e| WimError::Tool(format!("backend state poisoned: {e}")))
    }

    fn run(args: &[&OsStr]) -> Result<std::process::Output, WimError> {
        tracing::debug!("{TOOL} {:?}", args);
        let output = Command::new(TOOL).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WimError::Unavailable(format!(
                    "'{TOOL}' not found on PATH (install the wimlib tools)"
                ))
            } else {
                WimError::Tool(format!("failed to run {TOOL}: {e}"))
            }
        })?;
        if !output.status.success() {
            return Err(WimError::Tool(format!(
                "{TOOL} {} failed: {}",
                args.first()
                    .map(|a| a.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output)
    }

    fn scan_images(path: &Path) -> Result<Vec<ImageInfo>, WimError> {
        let output = Self::run(&[OsStr::new("info"), path.as_os_str()])?;
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(parse_image_sections(&text))
    }

    fn source<'s>(state: &'s State, src: SourceId) -> Result<&'s SourceState, WimError> {
        state.sources.get(&src.0).ok_or(WimError::StaleHandle)
    }

    fn image<'s>(
        state: &'s State,
        src: SourceId,
        index: usize,
    ) -> Result<&'s ImageInfo, WimError> {
        let source = Self::source(state, src)?;
        index
            .checked_sub(1)
            .and_then(|i| source.images.get(i))
            .ok_or(WimError::ImageNotFound(index))
    }
}

/// Split `wimlib-imagex info` output into per-image field maps, in index
/// order. Image sections start at `Index:` lines; everything before the
/// first one is the container header and is skipped.
fn parse_image_sections(text: &str) -> Vec<ImageInfo> {
    let mut images = Vec::new();
    let mut current: Option<HashMap<String, String>> = None;

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key == "Index" {
            if let Some(fields) = current.take() {
                images.push(ImageInfo { fields });
            }
            current = Some(HashMap::new());
        }
        if let Some(ref mut fields) = current {
            fields.insert(key.to_owned(), value.to_owned());
        }
    }
    if let Some(fields) = current {
        images.push(ImageInfo { fields });
    }
    images
}

impl WimBackend for WimlibBackend {
    fn open(&self, path: &Path, check_integrity: bool) -> Result<SourceId, WimError> {
        if check_integrity {
            Self::run(&[OsStr::new("verify"), path.as_os_str()]).map_err(|e| match e {
                WimError::Unavailable(_) => e,
                other => WimError::Open {
                    path: path.display().to_string(),
                    reason: other.to_string(),
                },
            })?;
        }
        let images = Self::scan_images(path).map_err(|e| match e {
            WimError::Unavailable(_) => e,
            other => WimError::Open {
                path: path.display().to_string(),
                reason: other.to_string(),
            },
        })?;

        let mut state = self.lock()?;
        state.next_id += 1;
        let id = state.next_id;
        state.sources.insert(
            id,
            SourceState {
                path: path.to_path_buf(),
                images,
            },
        );
        Ok(SourceId(id))
    }

    fn image_count(&self, src: SourceId) -> Result<usize, WimError> {
        let state = self.lock()?;
        Ok(Self::source(&state, src)?.images.len())
    }

    fn image_name(&self, src: SourceId, index: usize) -> Result<String, WimError> {
        let state = self.lock()?;
        Ok(Self::image(&state, src, index)?.name())
    }

    fn image_property(
        &self,
        src: SourceId,
        index: usize,
        property: &str,
    ) -> Result<Option<String>, WimError> {
        let state = self.lock()?;
        let image = Self::image(&state, src, index)?;
        Ok(property_label(property).and_then(|label| image.fields.get(label).cloned()))
    }

    fn extract_image(&self, src: SourceId, index: usize, dest: &Path) -> Result<(), WimError> {
        let path = {
            let state = self.lock()?;
            Self::image(&state, src, index)?;
            Self::source(&state, src)?.path.clone()
        };
        Self::run(&[
            OsStr::new("apply"),
            path.as_os_str(),
            OsStr::new(&index.to_string()),
            dest.as_os_str(),
        ])?;
        Ok(())
    }

    fn create(&self, compression: Compression) -> Result<TargetId, WimError> {
        let dir = tempfile::tempdir()?;
        let spool = dir.path().join("spool.wim");

        // wimlib has no "new empty WIM" command: capture an empty tree with
        // the requested compression, then delete the image again, leaving a
        // zero-image container that export runs append to.
        let empty = dir.path().join("empty");
        std::fs::create_dir(&empty)?;
        Self::run(&[
            OsStr::new("capture"),
            empty.as_os_str(),
            spool.as_os_str(),
            OsStr::new(&format!("--compress={}", compression.as_str())),
        ])?;
        Self::run(&[OsStr::new("delete"), spool.as_os_str(), OsStr::new("1")])?;

        let mut state = self.lock()?;
        state.next_id += 1;
        let id = state.next_id;
        state.targets.insert(id, TargetState { _dir: dir, spool });
        Ok(TargetId(id))
    }

    fn export_image(
        &self,
        src: SourceId,
        index: usize,
        target: TargetId,
        bootable: bool,
    ) -> Result<(), WimError> {
        let (src_path, spool) = {
            let state = self.lock()?;
            Self::image(&state, src, index)?;
            let src_path = Self::source(&state, src)?.path.clone();
            let spool = state
                .targets
                .get(&target.0)
                .ok_or(WimError::StaleHandle)?
                .spool
                .clone();
            (src_path, spool)
        };

        let index_arg = index.to_string();
        let mut args = vec![
            OsStr::new("export"),
            src_path.as_os_str(),
            OsStr::new(&index_arg),
            spool.as_os_str(),
        ];
        if bootable {
            args.push(OsStr::new("--boot"));
        }
        Self::run(&args)?;
        Ok(())
    }

    fn write(&self, target: TargetId, dest: &Path) -> Result<(), WimError> {
        let spool = {
            let state = self.lock()?;
            state
                .targets
                .get(&target.0)
                .ok_or(WimError::StaleHandle)?
                .spool
                .clone()
        };
        // The spool may live on another filesystem than the destination.
        if std::fs::rename(&spool, dest).is_err() {
            std::fs::copy(&spool, dest)?;
            let _ = std::fs::remove_file(&spool);
        }
        Ok(())
    }

    fn close_source(&self, src: SourceId) {
        if let Ok(mut state) = self.state.lock() {
            state.sources.remove(&src.0);
        }
    }

    fn close_target(&self, target: TargetId) {
        if let Ok(mut state) = self.state.lock() {
            state.targets.remove(&target.0);
        }
    }
}
