use super::{spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use esdmedia_media::{assemble, BOOT_WIM_PATH, INSTALL_ESD_PATH};
use esdmedia_wim::WimlibBackend;
use std::path::Path;

pub fn run(source: &Path, target: &Path) -> Result<u8, String> {
    let backend = WimlibBackend::new();

    let pb = spinner("assembling installation media…");
    assemble(&backend, source, target).map_err(|e| {
        spin_fail(&pb, "media assembly failed");
        e.to_string()
    })?;
    spin_ok(&pb, "media assembled");

    println!("{}", target.join(BOOT_WIM_PATH).display());
    println!("{}", target.join(INSTALL_ESD_PATH).display());
    Ok(EXIT_SUCCESS)
}
