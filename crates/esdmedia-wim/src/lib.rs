//! WIM/ESD container access for the media workflow.
//!
//! The on-disk encoding is never touched here: all reads and writes go
//! through the [`WimBackend`] capability. `WimlibBackend` drives the host
//! `wimlib-imagex` tool; `MockWimBackend` is an in-memory stand-in that
//! keeps the orchestration layer testable. [`SourceContainer`] and
//! [`TargetContainer`] are scoped guards that release their backend handle
//! exactly once on every exit path.

pub mod backend;
pub mod container;
pub mod mock;
pub mod prereq;
pub mod wimlib;

pub use backend::{Compression, SourceId, TargetId, WimBackend};
pub use container::{SourceContainer, TargetContainer};
pub use mock::{MockImage, MockWimBackend};
pub use prereq::{check_media_prereqs, format_missing, MissingPrereq};
pub use wimlib::WimlibBackend;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WimError {
    #[error("container I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("wimlib-imagex is not available: {0}")]
    Unavailable(String),
    #[error("failed to open container '{path}': {reason}")]
    Open { path: String, reason: String },
    #[error("wimlib-imagex failed: {0}")]
    Tool(String),
    #[error("unexpected wimlib-imagex output: {0}")]
    Parse(String),
    #[error("container has no image with index {0}")]
    ImageNotFound(usize),
    #[error("container handle is closed or unknown")]
    StaleHandle,
}
