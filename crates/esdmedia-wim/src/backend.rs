use crate::WimError;
use std::path::Path;

/// Opaque handle to an opened read-only source container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub(crate) u64);

/// Opaque handle to a newly created write-only target container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub(crate) u64);

/// Compression kind for a new target container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Boot container compression.
    Lzx,
    /// Installation container compression.
    Lzms,
}

impl Compression {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lzx => "LZX",
            Self::Lzms => "LZMS",
        }
    }
}

/// Read/extract/export operations against multi-image WIM containers.
///
/// Image indices use the container's native numbering: contiguous and
/// 1-based. Handles returned by `open` and `create` stay valid until the
/// matching close call; the [`crate::SourceContainer`]/
/// [`crate::TargetContainer`] guards are the intended way to hold them.
pub trait WimBackend {
    /// Open an existing container read-only, optionally verifying its
    /// integrity data first.
    fn open(&self, path: &Path, check_integrity: bool) -> Result<SourceId, WimError>;

    fn image_count(&self, src: SourceId) -> Result<usize, WimError>;

    fn image_name(&self, src: SourceId, index: usize) -> Result<String, WimError>;

    /// Read a per-image property by slash-separated property path
    /// (e.g. `WINDOWS/INSTALLATIONTYPE`). Absent properties are `None`.
    fn image_property(
        &self,
        src: SourceId,
        index: usize,
        property: &str,
    ) -> Result<Option<String>, WimError>;

    /// Extract one image's full file tree into `dest`.
    fn extract_image(&self, src: SourceId, index: usize, dest: &Path) -> Result<(), WimError>;

    /// Create a new, empty target container.
    fn create(&self, compression: Compression) -> Result<TargetId, WimError>;

    /// Export one image from an open source into a target, optionally
    /// flagging it as the boot-selectable image.
    fn export_image(
        &self,
        src: SourceId,
        index: usize,
        target: TargetId,
        bootable: bool,
    ) -> Result<(), WimError>;

    /// Persist the accumulated target container to `dest`. A target with
    /// zero exported images is still written.
    fn write(&self, target: TargetId, dest: &Path) -> Result<(), WimError>;

    /// Release a source handle. Releasing an already-closed handle is a
    /// no-op.
    fn close_source(&self, src: SourceId);

    /// Release a target handle and discard any unwritten state.
    fn close_target(&self, target: TargetId);
}
