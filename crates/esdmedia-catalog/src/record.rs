//! Catalog record type and the ordered record list with dedup and filtering.

use serde::Serialize;
use std::collections::HashSet;

/// Marker substring in a download path identifying business-edition media.
/// Case-sensitive, matching the paths the vendor actually publishes.
pub const BUSINESS_MARKER: &str = "BUSINESS";

/// One downloadable installer package from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRecord {
    pub name: String,
    pub url: String,
    pub language: String,
    pub architecture: String,
    /// Derived from the download path; never set independently.
    pub business: bool,
}

impl CatalogRecord {
    /// Build a record from the four extracted fields. Returns `None` when any
    /// field is empty; such records never enter a [`CatalogList`].
    pub fn from_parts(
        name: impl Into<String>,
        url: impl Into<String>,
        language: impl Into<String>,
        architecture: impl Into<String>,
    ) -> Option<Self> {
        let (name, url, language, architecture) =
            (name.into(), url.into(), language.into(), architecture.into());
        if name.is_empty() || url.is_empty() || language.is_empty() || architecture.is_empty() {
            return None;
        }
        let business = url.contains(BUSINESS_MARKER);
        Some(Self {
            name,
            url,
            language,
            architecture,
            business,
        })
    }
}

/// Filter criteria for [`CatalogList::filter`]. An absent criterion imposes
/// no constraint; present criteria must all match.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub language: Option<String>,
    pub architecture: Option<String>,
    pub business_only: bool,
}

impl RecordFilter {
    pub fn matches(&self, record: &CatalogRecord) -> bool {
        if let Some(ref lang) = self.language {
            if record.language != *lang {
                return false;
            }
        }
        if let Some(ref arch) = self.architecture {
            if record.architecture != *arch {
                return false;
            }
        }
        if self.business_only && !record.business {
            return false;
        }
        true
    }
}

/// Insertion-ordered sequence of catalog records.
///
/// Built once per run from a freshly parsed document and consumed by
/// filtering and output.
#[derive(Debug, Default)]
pub struct CatalogList {
    records: Vec<CatalogRecord>,
}

impl CatalogList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: CatalogRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remove records whose `name` was already seen earlier in the list.
    /// The first occurrence in document order survives; relative order of
    /// survivors is preserved.
    pub fn dedup_by_name(&mut self) {
        let mut seen = HashSet::new();
        self.records.retain(|r| seen.insert(r.name.clone()));
    }

    /// Non-mutating filtered view in list order.
    pub fn filter(&self, filter: &RecordFilter) -> Vec<&CatalogRecord> {
        self.records.iter().filter(|r| filter.matches(r)).collect()
    }

    pub fn into_records(self) -> Vec<CatalogRecord> {
        self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogRecord> {
        self.records.iter()
    }
}

impl FromIterator<CatalogRecord> for CatalogList {
    fn from_iter<I: IntoIterator<Item = CatalogRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
