//! In-memory [`WimBackend`] for tests.
//!
//! Containers are registered up front as named image lists. Extraction
//! writes the image's declared file tree so callers exercise real
//! filesystem paths; `write` persists a JSON manifest of the exported
//! images so tests can assert composition and boot flagging by reading
//! the output file.

use crate::backend::{Compression, SourceId, TargetId, WimBackend};
use crate::WimError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub struct MockImage {
    pub name: String,
    pub properties: HashMap<String, String>,
    /// Relative paths materialized by `extract_image`.
    pub files: Vec<String>,
}

impl MockImage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
            files: Vec::new(),
        }
    }

    pub fn with_property(mut self, path: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(path.into(), value.into());
        self
    }

    pub fn with_files(mut self, files: &[&str]) -> Self {
        self.files = files.iter().map(|f| (*f).to_owned()).collect();
        self
    }
}

/// What a mock `write` persists, for assertion by tests.
#[derive(Debug, Serialize, Deserialize)]
pub struct WrittenManifest {
    pub compression: String,
    pub images: Vec<WrittenImage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WrittenImage {
    pub name: String,
    pub bootable: bool,
}

#[derive(Debug)]
struct TargetState {
    compression: Compression,
    exports: Vec<WrittenImage>,
}

#[derive(Debug, Default)]
struct MockState {
    next_id: u64,
    containers: HashMap<PathBuf, Vec<MockImage>>,
    corrupt: HashSet<PathBuf>,
    sources: HashMap<u64, PathBuf>,
    targets: HashMap<u64, TargetState>,
    fail_export: bool,
    fail_extract: bool,
}

#[derive(Debug, Default)]
pub struct MockWimBackend {
    state: Mutex<MockState>,
}

impl MockWimBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a container fixture at `path`.
    pub fn register(&self, path: &Path, images: Vec<MockImage>) {
        self.lock().containers.insert(path.to_path_buf(), images);
    }

    /// Make integrity-checked opens of `path` fail.
    pub fn mark_corrupt(&self, path: &Path) {
        self.lock().corrupt.insert(path.to_path_buf());
    }

    /// Make every subsequent export fail, for release-on-error tests.
    pub fn fail_exports(&self) {
        self.lock().fail_export = true;
    }

    /// Make every subsequent extraction fail.
    pub fn fail_extractions(&self) {
        self.lock().fail_extract = true;
    }

    pub fn open_source_count(&self) -> usize {
        self.lock().sources.len()
    }

    pub fn open_target_count(&self) -> usize {
        self.lock().targets.len()
    }

    /// Read back a manifest persisted by `write`.
    pub fn read_manifest(&self, path: &Path) -> Result<WrittenManifest, WimError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| WimError::Parse(e.to_string()))
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }

    fn image<'s>(
        state: &'s MockState,
        src: SourceId,
        index: usize,
    ) -> Result<&'s MockImage, WimError> {
        let path = state.sources.get(&src.0).ok_or(WimError::StaleHandle)?;
        let images = state.containers.get(path).ok_or(WimError::StaleHandle)?;
        index
            .checked_sub(1)
            .and_then(|i| images.get(i))
            .ok_or(WimError::ImageNotFound(index))
    }
}

impl WimBackend for MockWimBackend {
    fn open(&self, path: &Path, check_integrity: bool) -> Result<SourceId, WimError> {
        let mut state = self.lock();
        if !state.containers.contains_key(path) {
            return Err(WimError::Open {
                path: path.display().to_string(),
                reason: "no such container".to_owned(),
            });
        }
        if check_integrity && state.corrupt.contains(path) {
            return Err(WimError::Open {
                path: path.display().to_string(),
                reason: "integrity check failed".to_owned(),
            });
        }
        state.next_id += 1;
        let id = state.next_id;
        state.sources.insert(id, path.to_path_buf());
        Ok(SourceId(id))
    }

    fn image_count(&self, src: SourceId) -> Result<usize, WimError> {
        let state = self.lock();
        let path = state.sources.get(&src.0).ok_or(WimError::StaleHandle)?;
        let images = state.containers.get(path).ok_or(WimError::StaleHandle)?;
        Ok(images.len())
    }

    fn image_name(&self, src: SourceId, index: usize) -> Result<String, WimError> {
        let state = self.lock();
        Ok(Self::image(&state, src, index)?.name.clone())
    }

    fn image_property(
        &self,
        src: SourceId,
        index: usize,
        property: &str,
    ) -> Result<Option<String>, WimError> {
        let state = self.lock();
        Ok(Self::image(&state, src, index)?.properties.get(property).cloned())
    }

    fn extract_image(&self, src: SourceId, index: usize, dest: &Path) -> Result<(), WimError> {
        let state = self.lock();
        if state.fail_extract {
            return Err(WimError::Tool("mock extraction failure".to_owned()));
        }
        let image = Self::image(&state, src, index)?;
        std::fs::create_dir_all(dest)?;
        for file in &image.files {
            let target = dest.join(file);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, format!("{}:{file}", image.name))?;
        }
        Ok(())
    }

    fn create(&self, compression: Compression) -> Result<TargetId, WimError> {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.targets.insert(
            id,
            TargetState {
                compression,
                exports: Vec::new(),
            },
        );
        Ok(TargetId(id))
    }

    fn export_image(
        &self,
        src: SourceId,
        index: usize,
        target: TargetId,
        bootable: bool,
    ) -> Result<(), WimError> {
        let mut state = self.lock();
        if state.fail_export {
            return Err(WimError::Tool("mock export failure".to_owned()));
        }
        let name = Self::image(&state, src, index)?.name.clone();
        let target_state = state.targets.get_mut(&target.0).ok_or(WimError::StaleHandle)?;
        target_state.exports.push(WrittenImage { name, bootable });
        Ok(())
    }

    fn write(&self, target: TargetId, dest: &Path) -> Result<(), WimError> {
        let state = self.lock();
        let target_state = state.targets.get(&target.0).ok_or(WimError::StaleHandle)?;
        let manifest = WrittenManifest {
            compression: target_state.compression.as_str().to_owned(),
            images: target_state
                .exports
                .iter()
                .map(|e| WrittenImage {
                    name: e.name.clone(),
                    bootable: e.bootable,
                })
                .collect(),
        };
        let content =
            serde_json::to_string_pretty(&manifest).map_err(|e| WimError::Parse(e.to_string()))?;
        std::fs::write(dest, content)?;
        Ok(())
    }

    fn close_source(&self, src: SourceId) {
        self.lock().sources.remove(&src.0);
    }

    fn close_target(&self, target: TargetId) {
        self.lock().targets.remove(&target.0);
    }
}
