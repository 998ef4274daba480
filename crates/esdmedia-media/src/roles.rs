//! Role image resolution by name prefix.

use crate::MediaError;
use esdmedia_wim::{SourceContainer, WimError};

/// Name prefix of the image holding the on-disk setup media tree.
pub const SETUP_MEDIA_PREFIX: &str = "Windows Setup Media";
/// Name prefix of the preinstallation environment image.
pub const PE_PREFIX: &str = "Microsoft Windows PE";
/// Name prefix of the setup environment image (boot-flagged in boot.wim).
pub const SETUP_ENV_PREFIX: &str = "Microsoft Windows Setup";

/// Indices of the three role images every valid release carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleImages {
    pub setup_media: usize,
    pub pe: usize,
    pub setup_env: usize,
}

/// Scan all images and return the index of the first whose name starts
/// with `prefix` (case-sensitive), or `None` when no image matches.
pub fn find_by_role_prefix(
    src: &SourceContainer<'_>,
    prefix: &str,
) -> Result<Option<usize>, WimError> {
    for index in 1..=src.image_count()? {
        if src.image_name(index)?.starts_with(prefix) {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// Resolve all three role images. Any missing role makes the source an
/// invalid release; partial matches are not usable.
pub fn resolve_roles(src: &SourceContainer<'_>) -> Result<RoleImages, MediaError> {
    let setup_media = find_by_role_prefix(src, SETUP_MEDIA_PREFIX)?;
    let pe = find_by_role_prefix(src, PE_PREFIX)?;
    let setup_env = find_by_role_prefix(src, SETUP_ENV_PREFIX)?;

    match (setup_media, pe, setup_env) {
        (Some(setup_media), Some(pe), Some(setup_env)) => Ok(RoleImages {
            setup_media,
            pe,
            setup_env,
        }),
        _ => {
            tracing::debug!(
                "role resolution: media={setup_media:?} pe={pe:?} setup={setup_env:?}"
            );
            Err(MediaError::InvalidRelease)
        }
    }
}
