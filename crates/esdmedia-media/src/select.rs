//! Installation-type selection for the installation container.

use esdmedia_wim::{SourceContainer, WimError};

/// Property path classifying an image's installation class.
pub const INSTALLATION_TYPE_PROPERTY: &str = "WINDOWS/INSTALLATIONTYPE";

/// Installation-type prefix selecting the images exported into the
/// installation container.
pub const CLIENT_TYPE_PREFIX: &str = "Client";

/// Indices of all images whose installation-type property is present and
/// starts with `type_prefix`, in container image order. An empty result is
/// not an error here; the caller decides what an empty installation
/// container means.
pub fn by_installation_type(
    src: &SourceContainer<'_>,
    type_prefix: &str,
) -> Result<Vec<usize>, WimError> {
    let mut selected = Vec::new();
    for index in 1..=src.image_count()? {
        match src.image_property(index, INSTALLATION_TYPE_PROPERTY)? {
            Some(value) if value.starts_with(type_prefix) => selected.push(index),
            _ => {}
        }
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use esdmedia_wim::{MockImage, MockWimBackend};
    use std::path::Path;

    fn client(name: &str, install_type: &str) -> MockImage {
        MockImage::new(name).with_property(INSTALLATION_TYPE_PROPERTY, install_type)
    }

    #[test]
    fn prefix_selects_client_variants_and_excludes_server() {
        let backend = MockWimBackend::new();
        let path = Path::new("/fixtures/release.esd");
        backend.register(
            path,
            vec![
                client("Windows 11 Pro", "Client"),
                client("Windows 11 SE", "ClientCore"),
                client("Windows Server 2025", "Server"),
            ],
        );
        let src = SourceContainer::open(&backend, path, false).unwrap();

        let selected = by_installation_type(&src, CLIENT_TYPE_PREFIX).unwrap();
        assert_eq!(selected, vec![1, 2]);
    }

    #[test]
    fn images_without_the_property_are_skipped() {
        let backend = MockWimBackend::new();
        let path = Path::new("/fixtures/release.esd");
        backend.register(
            path,
            vec![
                MockImage::new("Windows Setup Media"),
                client("Windows 11 Home", "Client"),
            ],
        );
        let src = SourceContainer::open(&backend, path, false).unwrap();

        let selected = by_installation_type(&src, CLIENT_TYPE_PREFIX).unwrap();
        assert_eq!(selected, vec![2]);
    }

    #[test]
    fn no_matching_type_yields_empty_selection() {
        let backend = MockWimBackend::new();
        let path = Path::new("/fixtures/release.esd");
        backend.register(path, vec![client("Windows Server 2025", "Server")]);
        let src = SourceContainer::open(&backend, path, false).unwrap();

        let selected = by_installation_type(&src, CLIENT_TYPE_PREFIX).unwrap();
        assert!(selected.is_empty());
    }
}
