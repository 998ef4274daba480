//! HTTP transfer capability for the catalog download.

use crate::CatalogError;
use std::path::Path;
use tempfile::NamedTempFile;

/// Blocking download of a URL to a local file, overwriting the destination.
/// Implementations follow redirects; the catalog endpoint is a redirecting
/// link shortener.
pub trait Transport {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), CatalogError>;
}

/// `ureq`-backed transport. No timeout is imposed on the transfer; a stuck
/// download blocks indefinitely (known limitation of the workflow).
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), CatalogError> {
        tracing::debug!("GET {url} -> {}", dest.display());
        let resp = match self.agent.get(url).call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(code)) => {
                return Err(CatalogError::Transfer {
                    url: url.to_owned(),
                    reason: format!("HTTP {code}"),
                });
            }
            Err(e) => {
                return Err(CatalogError::Transfer {
                    url: url.to_owned(),
                    reason: e.to_string(),
                });
            }
        };

        let dir = dest.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = match dir {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }?;
        let mut reader = resp.into_body().into_reader();
        std::io::copy(&mut reader, &mut tmp).map_err(|e| CatalogError::Transfer {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        tmp.persist(dest).map_err(|e| CatalogError::Io(e.error))?;
        Ok(())
    }
}
