//! Scoped container guards.
//!
//! The media workflow must release every container handle exactly once on
//! every exit path. These guards tie the release to `Drop`, so early
//! returns and error propagation cannot leak a handle or free it twice.

use crate::backend::{Compression, SourceId, TargetId, WimBackend};
use crate::WimError;
use std::path::Path;

/// An opened read-only source container, closed on drop.
pub struct SourceContainer<'a> {
    backend: &'a dyn WimBackend,
    id: SourceId,
}

impl<'a> SourceContainer<'a> {
    pub fn open(
        backend: &'a dyn WimBackend,
        path: &Path,
        check_integrity: bool,
    ) -> Result<Self, WimError> {
        let id = backend.open(path, check_integrity)?;
        Ok(Self { backend, id })
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn image_count(&self) -> Result<usize, WimError> {
        self.backend.image_count(self.id)
    }

    pub fn image_name(&self, index: usize) -> Result<String, WimError> {
        self.backend.image_name(self.id, index)
    }

    pub fn image_property(&self, index: usize, property: &str) -> Result<Option<String>, WimError> {
        self.backend.image_property(self.id, index, property)
    }

    pub fn extract_image(&self, index: usize, dest: &Path) -> Result<(), WimError> {
        self.backend.extract_image(self.id, index, dest)
    }
}

impl Drop for SourceContainer<'_> {
    fn drop(&mut self) {
        self.backend.close_source(self.id);
    }
}

/// A newly created write-only target container, closed on drop.
///
/// Exports accumulate in the backend until the single terminal [`write`]
/// call persists them. Dropping an unwritten target discards its state;
/// files already written stay on disk.
///
/// [`write`]: TargetContainer::write
pub struct TargetContainer<'a> {
    backend: &'a dyn WimBackend,
    id: TargetId,
}

impl<'a> TargetContainer<'a> {
    pub fn create(backend: &'a dyn WimBackend, compression: Compression) -> Result<Self, WimError> {
        let id = backend.create(compression)?;
        Ok(Self { backend, id })
    }

    /// Export an image from `src`, which must belong to the same backend.
    pub fn export_from(
        &self,
        src: &SourceContainer<'_>,
        index: usize,
        bootable: bool,
    ) -> Result<(), WimError> {
        self.backend.export_image(src.id(), index, self.id, bootable)
    }

    pub fn write(&self, dest: &Path) -> Result<(), WimError> {
        self.backend.write(self.id, dest)
    }
}

impl Drop for TargetContainer<'_> {
    fn drop(&mut self) {
        self.backend.close_target(self.id);
    }
}
