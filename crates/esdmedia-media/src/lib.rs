//! Stage B of the media workflow: turn a downloaded multi-image ESD
//! container into bootable installation media.
//!
//! The assembly is a linear sequence with no retry: create the target
//! directory, open the source with integrity checking, resolve the three
//! role images, extract the setup media tree, compose the boot container,
//! compose the installation container. Any failure is terminal; container
//! handles are released on every path by the guards in `esdmedia-wim`,
//! while files already written stay on disk.

pub mod assemble;
pub mod roles;
pub mod select;

pub use assemble::{assemble, BOOT_WIM_PATH, INSTALL_ESD_PATH};
pub use roles::{find_by_role_prefix, resolve_roles, RoleImages};
pub use select::by_installation_type;

use esdmedia_wim::WimError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("source container is not a valid Windows release")]
    InvalidRelease,
    #[error("cannot create target directory '{path}': {source}")]
    TargetDir {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Container(#[from] WimError),
}
