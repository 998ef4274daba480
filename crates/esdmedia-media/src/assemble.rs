//! Media assembly: extract the setup tree and compose the two containers.

use crate::roles::resolve_roles;
use crate::select::{by_installation_type, CLIENT_TYPE_PREFIX};
use crate::MediaError;
use esdmedia_wim::{Compression, SourceContainer, TargetContainer, WimBackend};
use std::path::Path;

/// Boot container location under the target directory.
pub const BOOT_WIM_PATH: &str = "sources/boot.wim";
/// Installation container location under the target directory.
pub const INSTALL_ESD_PATH: &str = "sources/install.esd";

/// Assemble installation media from `source` into `target`.
///
/// `target` must not pre-exist; creating it is the existence check. The
/// steps run in order and any failure is terminal. Partial output already
/// on disk is left in place; the container guards release every handle in
/// reverse acquisition order on both success and failure.
pub fn assemble(
    backend: &dyn WimBackend,
    source: &Path,
    target: &Path,
) -> Result<(), MediaError> {
    std::fs::create_dir(target).map_err(|e| MediaError::TargetDir {
        path: target.display().to_string(),
        source: e,
    })?;

    let src = SourceContainer::open(backend, source, true)?;
    let roles = resolve_roles(&src)?;
    tracing::debug!(
        "roles resolved: media={} pe={} setup={}",
        roles.setup_media,
        roles.pe,
        roles.setup_env
    );

    src.extract_image(roles.setup_media, target)?;

    let boot = TargetContainer::create(backend, Compression::Lzx)?;
    boot.export_from(&src, roles.pe, false)?;
    boot.export_from(&src, roles.setup_env, true)?;
    boot.write(&target.join(BOOT_WIM_PATH))?;

    let install = TargetContainer::create(backend, Compression::Lzms)?;
    let selected = by_installation_type(&src, CLIENT_TYPE_PREFIX)?;
    if selected.is_empty() {
        tracing::warn!("no images matched installation type '{CLIENT_TYPE_PREFIX}'");
    }
    for index in &selected {
        install.export_from(&src, *index, false)?;
    }
    install.write(&target.join(INSTALL_ESD_PATH))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::INSTALLATION_TYPE_PROPERTY;
    use esdmedia_wim::{MockImage, MockWimBackend};
    use std::path::PathBuf;

    fn release_fixture(backend: &MockWimBackend) -> PathBuf {
        let path = PathBuf::from("/fixtures/22631.esd");
        backend.register(
            &path,
            vec![
                MockImage::new("Windows Setup Media")
                    .with_files(&["setup.exe", "sources/compat.dll"]),
                MockImage::new("Microsoft Windows PE (x64)")
                    .with_property(INSTALLATION_TYPE_PROPERTY, "WindowsPE"),
                MockImage::new("Microsoft Windows Setup (x64)")
                    .with_property(INSTALLATION_TYPE_PROPERTY, "WindowsPE"),
                MockImage::new("Windows 11 Home")
                    .with_property(INSTALLATION_TYPE_PROPERTY, "Client"),
                MockImage::new("Windows 11 Pro")
                    .with_property(INSTALLATION_TYPE_PROPERTY, "Client"),
            ],
        );
        path
    }

    #[test]
    fn assemble_produces_media_tree_and_both_containers() {
        let backend = MockWimBackend::new();
        let source = release_fixture(&backend);
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("media");

        assemble(&backend, &source, &target).unwrap();

        // Setup media tree extracted into the target.
        assert!(target.join("setup.exe").is_file());

        // Boot container: PE plain, setup environment boot-flagged, LZX.
        let boot = backend.read_manifest(&target.join(BOOT_WIM_PATH)).unwrap();
        assert_eq!(boot.compression, "LZX");
        let boot_names: Vec<_> = boot.images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            boot_names,
            ["Microsoft Windows PE (x64)", "Microsoft Windows Setup (x64)"]
        );
        assert!(!boot.images[0].bootable);
        assert!(boot.images[1].bootable);

        // Installation container: every Client image, in image order, LZMS.
        let install = backend
            .read_manifest(&target.join(INSTALL_ESD_PATH))
            .unwrap();
        assert_eq!(install.compression, "LZMS");
        let install_names: Vec<_> = install.images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(install_names, ["Windows 11 Home", "Windows 11 Pro"]);
        assert!(install.images.iter().all(|i| !i.bootable));

        // Every handle released.
        assert_eq!(backend.open_source_count(), 0);
        assert_eq!(backend.open_target_count(), 0);
    }

    #[test]
    fn preexisting_target_directory_is_fatal() {
        let backend = MockWimBackend::new();
        let source = release_fixture(&backend);
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("media");
        std::fs::create_dir(&target).unwrap();

        let err = assemble(&backend, &source, &target).unwrap_err();
        assert!(matches!(err, MediaError::TargetDir { .. }), "{err}");
        assert_eq!(backend.open_source_count(), 0);
    }

    #[test]
    fn invalid_release_aborts_before_any_extraction() {
        let backend = MockWimBackend::new();
        let source = PathBuf::from("/fixtures/not-a-release.esd");
        backend.register(
            &source,
            vec![MockImage::new("Windows Setup Media").with_files(&["setup.exe"])],
        );
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("media");

        let err = assemble(&backend, &source, &target).unwrap_err();
        assert!(matches!(err, MediaError::InvalidRelease));
        assert!(
            !target.join("setup.exe").exists(),
            "nothing may be extracted for an invalid release"
        );
        assert_eq!(backend.open_source_count(), 0);
    }

    #[test]
    fn integrity_failure_on_open_is_fatal() {
        let backend = MockWimBackend::new();
        let source = release_fixture(&backend);
        backend.mark_corrupt(&source);
        let dir = tempfile::tempdir().unwrap();

        let err = assemble(&backend, &source, &dir.path().join("media")).unwrap_err();
        assert!(matches!(
            err,
            MediaError::Container(esdmedia_wim::WimError::Open { .. })
        ));
    }

    // Characterization, not endorsement: a release whose images all fall
    // outside the Client class still gets its installation container
    // written, with zero images inside.
    #[test]
    fn assemble_writes_empty_install_container_when_nothing_selected() {
        let backend = MockWimBackend::new();
        let source = PathBuf::from("/fixtures/server-only.esd");
        backend.register(
            &source,
            vec![
                MockImage::new("Windows Setup Media")
                    .with_files(&["setup.exe", "sources/compat.dll"]),
                MockImage::new("Microsoft Windows PE (x64)"),
                MockImage::new("Microsoft Windows Setup (x64)"),
                MockImage::new("Windows Server 2025")
                    .with_property(INSTALLATION_TYPE_PROPERTY, "Server"),
            ],
        );
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("media");

        assemble(&backend, &source, &target).unwrap();

        let install = backend
            .read_manifest(&target.join(INSTALL_ESD_PATH))
            .unwrap();
        assert!(install.images.is_empty());
    }

    #[test]
    fn export_failure_releases_every_handle_and_keeps_partial_output() {
        let backend = MockWimBackend::new();
        let source = release_fixture(&backend);
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("media");

        backend.fail_exports();
        let err = assemble(&backend, &source, &target).unwrap_err();
        assert!(matches!(err, MediaError::Container(_)), "{err}");

        // The extracted media tree stays on disk; handles do not leak.
        assert!(target.join("setup.exe").is_file());
        assert_eq!(backend.open_source_count(), 0);
        assert_eq!(backend.open_target_count(), 0);
    }
}
