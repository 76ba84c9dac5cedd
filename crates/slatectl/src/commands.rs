//! Command handlers for slatectl.

use crate::interact::{SshConnector, TerminalInteraction};
use anyhow::{bail, Context, Result};
use owo_colors::OwoColorize;
use slate_common::{
    read_status, DeviceGeneration, FileCatalog, InstallOptions, Orchestrator, SystemScout,
    UpdateCatalog, VersionCatalog,
};
use std::path::{Path, PathBuf};

fn build_orchestrator(staging_root: &Path, auth: Option<String>) -> Orchestrator {
    Orchestrator::new(
        Box::new(FileCatalog::new(staging_root, VersionCatalog::builtin())),
        VersionCatalog::builtin(),
        Box::new(SystemScout),
        Box::new(SshConnector::new(auth)),
        Box::new(TerminalInteraction),
    )
}

/// Orchestrator for subcommands that only talk to the device and never
/// stage payloads.
fn device_orchestrator(auth: Option<String>) -> Orchestrator {
    Orchestrator::device_only(
        Box::new(SystemScout),
        Box::new(SshConnector::new(auth)),
        Box::new(TerminalInteraction),
    )
}

/// `slatectl install <version>`
pub async fn install(
    version: String,
    serve_folder: Option<PathBuf>,
    device: DeviceGeneration,
    auth: Option<String>,
) -> Result<()> {
    // Stage into the given folder, or a tempdir removed when we are done.
    let (staging_root, _tempdir) = match serve_folder {
        Some(folder) => {
            if !folder.is_dir() {
                bail!("serve folder {} does not exist", folder.display());
            }
            (folder, None)
        }
        None => {
            let dir = tempfile::tempdir().context("could not create staging directory")?;
            (dir.path().to_path_buf(), Some(dir))
        }
    };

    let orchestrator = build_orchestrator(&staging_root, auth);
    let installed = orchestrator
        .install(InstallOptions::new(version, device))
        .await?;

    println!(
        "{}  Installed {} on the {}. Restart the device to finish.",
        "+".bright_green(),
        installed.bright_white(),
        device
    );
    Ok(())
}

/// `slatectl restore`
pub async fn restore(auth: Option<String>) -> Result<()> {
    let orchestrator = device_orchestrator(auth);
    if !orchestrator.restore().await? {
        bail!("restore aborted");
    }
    println!(
        "{}  Partition swap done. Reboot the device to boot the previous firmware.",
        "+".bright_green()
    );
    Ok(())
}

/// `slatectl status`
pub async fn status(auth: Option<String>) -> Result<()> {
    let orchestrator = device_orchestrator(auth);
    let transport = orchestrator.device_transport()?;
    let status =
        tokio::task::spawn_blocking(move || read_status(transport.as_ref())).await??;

    println!(
        "You are running {} [{}]{}, previous version was {}",
        status.current.bright_white(),
        status.version_id,
        if status.beta { " [BETA]" } else { "" },
        status.previous
    );
    Ok(())
}

/// `slatectl download <version>`
pub async fn download(
    version: String,
    out: Option<PathBuf>,
    device: DeviceGeneration,
) -> Result<()> {
    let versions = VersionCatalog::builtin();
    let resolved = versions.resolve(&version, device)?;

    let dest = out
        .or_else(dirs::download_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    println!("Downloading {} to {}", resolved, dest.display());

    let catalog = FileCatalog::new(&dest, versions);
    let path = catalog.fetch(&resolved, device, &dest).await?;

    println!("{}  Done! ({})", "+".bright_green(), path.display());
    Ok(())
}

/// `slatectl list`
pub fn list() -> Result<()> {
    let versions = VersionCatalog::builtin();
    for device in [DeviceGeneration::Gen2, DeviceGeneration::Gen1] {
        println!("\n{}:", device.bright_white());
        for version in versions.versions(device) {
            println!("  {}", version);
        }
    }
    Ok(())
}
