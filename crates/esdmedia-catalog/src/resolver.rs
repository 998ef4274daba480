//! Catalog resolution: ensure the document is present, parse it, and produce
//! the deduplicated, filtered record set.

use crate::cab::EntryExtractor;
use crate::fetch::Transport;
use crate::record::{CatalogList, CatalogRecord, RecordFilter};
use crate::{xml, CatalogError};
use std::path::{Path, PathBuf};

/// Fixed vendor endpoint publishing the compressed catalog.
pub const CATALOG_URL: &str = "https://go.microsoft.com/fwlink/?LinkId=841361";
/// Compressed intermediate, removed (best effort) after decompression.
pub const CATALOG_CAB: &str = "products.cab";
/// Working catalog document.
pub const CATALOG_XML: &str = "products.xml";

/// Element path from the document root down to the per-package `File` list.
const FILES_PATH: &str = "MCT/Catalogs/Catalog/PublishedMedia/Files";

/// One resolution run's configuration, threaded explicitly instead of
/// process-wide flags.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// Re-download the catalog even when a document is already present.
    pub refresh: bool,
    pub filter: RecordFilter,
    /// Directory holding `products.cab`/`products.xml`.
    pub work_dir: PathBuf,
    /// Catalog endpoint; overridable for mirrors and tests.
    pub endpoint: String,
}

impl Default for ResolveRequest {
    fn default() -> Self {
        Self {
            refresh: false,
            filter: RecordFilter::default(),
            work_dir: PathBuf::from("."),
            endpoint: CATALOG_URL.to_owned(),
        }
    }
}

pub struct Resolver<'a> {
    transport: &'a dyn Transport,
    extractor: &'a dyn EntryExtractor,
}

impl<'a> Resolver<'a> {
    pub fn new(transport: &'a dyn Transport, extractor: &'a dyn EntryExtractor) -> Self {
        Self {
            transport,
            extractor,
        }
    }

    /// Resolve the catalog into the filtered record sequence.
    ///
    /// Fetch/decompress/parse failures are fatal with no retry. An empty
    /// result after filtering is the distinct [`CatalogError::NoMatches`]
    /// condition so callers can tell "nothing matched" from "broken input".
    pub fn resolve(&self, request: &ResolveRequest) -> Result<Vec<CatalogRecord>, CatalogError> {
        let document = request.work_dir.join(CATALOG_XML);
        if request.refresh || !document.is_file() {
            self.refresh_document(request, &document)?;
        }

        let content = std::fs::read_to_string(&document)?;
        let doc = roxmltree::Document::parse(&content)
            .map_err(|e| CatalogError::Parse(format!("{}: {e}", document.display())))?;

        let files = xml::walk(doc.root_element(), FILES_PATH).ok_or_else(|| {
            CatalogError::Parse(format!("catalog document has no {FILES_PATH} element"))
        })?;

        let mut list: CatalogList = xml::extract_records(files).into_iter().collect();
        tracing::debug!("extracted {} records", list.len());
        list.dedup_by_name();

        let matched: Vec<CatalogRecord> = list
            .filter(&request.filter)
            .into_iter()
            .cloned()
            .collect();
        if matched.is_empty() {
            return Err(CatalogError::NoMatches);
        }
        Ok(matched)
    }

    fn refresh_document(
        &self,
        request: &ResolveRequest,
        document: &Path,
    ) -> Result<(), CatalogError> {
        let cab = request.work_dir.join(CATALOG_CAB);
        self.transport.fetch(&request.endpoint, &cab)?;
        self.extractor
            .extract_named_entry(&cab, CATALOG_XML, document)?;
        // Removal of the compressed intermediate is best effort.
        if let Err(e) = std::fs::remove_file(&cab) {
            tracing::warn!("could not remove {}: {e}", cab.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const TWO_LANGUAGES: &str = r#"
<MCT><Catalogs><Catalog><PublishedMedia><Files>
  <File>
    <FileName>client_en.esd</FileName>
    <FilePath>http://dl.example/X64FRE_EN-US.esd</FilePath>
    <LanguageCode>en-US</LanguageCode>
    <Architecture>x64</Architecture>
  </File>
  <File>
    <FileName>client_de.esd</FileName>
    <FilePath>http://dl.example/X64FRE_DE-DE.esd</FilePath>
    <LanguageCode>de-DE</LanguageCode>
    <Architecture>x64</Architecture>
  </File>
</Files></PublishedMedia></Catalog></Catalogs></MCT>"#;

    /// Transport serving a canned cab payload; counts fetches.
    struct CannedTransport<'a> {
        payload: &'a str,
        fetches: Cell<usize>,
    }

    impl<'a> CannedTransport<'a> {
        fn new(payload: &'a str) -> Self {
            Self {
                payload,
                fetches: Cell::new(0),
            }
        }
    }

    impl Transport for CannedTransport<'_> {
        fn fetch(&self, _url: &str, dest: &Path) -> Result<(), CatalogError> {
            self.fetches.set(self.fetches.get() + 1);
            std::fs::write(dest, self.payload)?;
            Ok(())
        }
    }

    /// Extractor treating the "cab" as the document itself.
    struct PassthroughExtractor;

    impl EntryExtractor for PassthroughExtractor {
        fn extract_named_entry(
            &self,
            archive: &Path,
            _entry: &str,
            dest: &Path,
        ) -> Result<(), CatalogError> {
            std::fs::copy(archive, dest)?;
            Ok(())
        }
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn fetch(&self, url: &str, _dest: &Path) -> Result<(), CatalogError> {
            Err(CatalogError::Transfer {
                url: url.to_owned(),
                reason: "connection refused".to_owned(),
            })
        }
    }

    fn request_in(dir: &Path) -> ResolveRequest {
        ResolveRequest {
            work_dir: dir.to_path_buf(),
            endpoint: "http://catalog.test/link".to_owned(),
            ..ResolveRequest::default()
        }
    }

    #[test]
    fn resolve_filters_by_language_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let transport = CannedTransport::new(TWO_LANGUAGES);
        let resolver = Resolver::new(&transport, &PassthroughExtractor);

        let mut request = request_in(dir.path());
        request.filter.language = Some("de-DE".to_owned());

        let records = resolver.resolve(&request).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].language, "de-DE");
        assert_eq!(records[0].url, "http://dl.example/X64FRE_DE-DE.esd");
    }

    #[test]
    fn resolve_skips_fetch_when_document_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CATALOG_XML), TWO_LANGUAGES).unwrap();
        let transport = CannedTransport::new("unused");
        let resolver = Resolver::new(&transport, &PassthroughExtractor);

        let records = resolver.resolve(&request_in(dir.path())).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(transport.fetches.get(), 0);
    }

    #[test]
    fn refresh_forces_fetch_and_discards_cab() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CATALOG_XML), "<MCT/>").unwrap();
        let transport = CannedTransport::new(TWO_LANGUAGES);
        let resolver = Resolver::new(&transport, &PassthroughExtractor);

        let mut request = request_in(dir.path());
        request.refresh = true;

        let records = resolver.resolve(&request).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(transport.fetches.get(), 1);
        assert!(
            !dir.path().join(CATALOG_CAB).exists(),
            "compressed intermediate must be removed after decompression"
        );
    }

    #[test]
    fn fetch_failure_is_fatal_and_distinct_from_no_matches() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = Resolver::new(&FailingTransport, &PassthroughExtractor);

        let err = resolver.resolve(&request_in(dir.path())).unwrap_err();
        assert!(matches!(err, CatalogError::Transfer { .. }), "{err}");
    }

    #[test]
    fn missing_files_path_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CATALOG_XML), "<MCT><Other/></MCT>").unwrap();
        let transport = CannedTransport::new("unused");
        let resolver = Resolver::new(&transport, &PassthroughExtractor);

        let err = resolver.resolve(&request_in(dir.path())).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)), "{err}");
    }

    #[test]
    fn unmatched_filter_reports_no_matches() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CATALOG_XML), TWO_LANGUAGES).unwrap();
        let transport = CannedTransport::new("unused");
        let resolver = Resolver::new(&transport, &PassthroughExtractor);

        let mut request = request_in(dir.path());
        request.filter.language = Some("fr-FR".to_owned());

        let err = resolver.resolve(&request).unwrap_err();
        assert!(matches!(err, CatalogError::NoMatches));
    }
}
