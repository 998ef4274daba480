//! Vendor catalog resolution for ESD installer packages.
//!
//! This crate implements stage A of the media workflow: fetch the compressed
//! catalog from the vendor endpoint, decompress the catalog document out of
//! it, parse the XML tree, extract per-package records, deduplicate them by
//! display name, and apply language/architecture/business filters.
//!
//! Network transfer and cab decompression are capabilities (`Transport`,
//! `EntryExtractor`) so the resolver stays testable without a network or
//! host tools.

pub mod cab;
pub mod fetch;
pub mod record;
pub mod resolver;
pub mod xml;

pub use cab::{CabextractTool, EntryExtractor};
pub use fetch::{HttpTransport, Transport};
pub use record::{CatalogList, CatalogRecord, RecordFilter};
pub use resolver::{ResolveRequest, Resolver, CATALOG_CAB, CATALOG_URL, CATALOG_XML};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("transfer failed for '{url}': {reason}")]
    Transfer { url: String, reason: String },
    #[error("archive error: {0}")]
    Archive(String),
    #[error("catalog parse error: {0}")]
    Parse(String),
    #[error("no catalog entries match the requested filters")]
    NoMatches,
}
