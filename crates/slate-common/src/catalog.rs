//! Staged firmware payloads: scanning the local cache and fetching from the
//! vendor build server.
//!
//! Layout is one `updates/` directory under the staging root, holding files
//! named `{version}_{codename}-{build}.signed`. A fetch must be visible to a
//! subsequent scan; the orchestrator relies on download-then-rescan.

use crate::device::DeviceGeneration;
use crate::error::{DownloadFailure, SlateError};
use crate::version::VersionCatalog;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

const BUILD_URL_BASE: &str =
    "https://updates.cloud.remarkable.engineering/build/reMarkable%20Device";

pub const UPDATES_DIR: &str = "updates";

/// Source of staged firmware payloads.
#[async_trait]
pub trait UpdateCatalog: Send + Sync {
    /// Directory the payload server exposes (the staging root).
    fn staging_dir(&self) -> PathBuf;

    /// Versions currently staged, per generation.
    fn scan(&self) -> HashMap<DeviceGeneration, BTreeSet<String>>;

    /// Path of a staged payload, if present.
    fn staged_path(&self, version: &str, device: DeviceGeneration) -> Option<PathBuf>;

    /// Download a payload into `dest`, returning the file path.
    async fn fetch(
        &self,
        version: &str,
        device: DeviceGeneration,
        dest: &Path,
    ) -> Result<PathBuf, SlateError>;
}

/// Catalog over a staging directory on local disk, downloading from the
/// vendor build server when a version is not yet staged.
pub struct FileCatalog {
    root: PathBuf,
    versions: VersionCatalog,
}

impl FileCatalog {
    pub fn new(root: impl Into<PathBuf>, versions: VersionCatalog) -> Self {
        Self {
            root: root.into(),
            versions,
        }
    }

    fn updates_dir(&self) -> PathBuf {
        self.root.join(UPDATES_DIR)
    }

    fn payload_filename(&self, version: &str, device: DeviceGeneration) -> Option<String> {
        let build = self.versions.build_id(device, version)?;
        Some(format!("{}_{}-{}.signed", version, device.codename(), build))
    }

    fn download_url(&self, version: &str, device: DeviceGeneration) -> Option<String> {
        let filename = self.payload_filename(version, device)?;
        Some(format!(
            "{}/{}/{}/{}",
            BUILD_URL_BASE,
            device.codename(),
            version,
            filename
        ))
    }
}

/// Split `{version}_{codename}-{build}.signed` into (version, generation).
fn parse_payload_filename(name: &str) -> Option<(String, DeviceGeneration)> {
    let stem = name.strip_suffix(".signed")?;
    let (version, rest) = stem.split_once('_')?;
    let device = if rest.starts_with("reMarkable2-") {
        DeviceGeneration::Gen2
    } else if rest.starts_with("reMarkable-") {
        DeviceGeneration::Gen1
    } else {
        return None;
    };
    Some((version.to_string(), device))
}

#[async_trait]
impl UpdateCatalog for FileCatalog {
    fn staging_dir(&self) -> PathBuf {
        self.root.clone()
    }

    fn scan(&self) -> HashMap<DeviceGeneration, BTreeSet<String>> {
        let mut staged: HashMap<DeviceGeneration, BTreeSet<String>> = HashMap::new();
        let entries = match std::fs::read_dir(self.updates_dir()) {
            Ok(entries) => entries,
            Err(_) => return staged,
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some((version, device)) = parse_payload_filename(name) {
                debug!(%version, %device, "found staged payload");
                staged.entry(device).or_default().insert(version);
            }
        }
        staged
    }

    fn staged_path(&self, version: &str, device: DeviceGeneration) -> Option<PathBuf> {
        let path = self.updates_dir().join(self.payload_filename(version, device)?);
        path.is_file().then_some(path)
    }

    async fn fetch(
        &self,
        version: &str,
        device: DeviceGeneration,
        dest: &Path,
    ) -> Result<PathBuf, SlateError> {
        if !dest.is_dir() {
            return Err(SlateError::Download(DownloadFailure::DestinationMissing(
                dest.to_path_buf(),
            )));
        }

        let url = self.download_url(version, device).ok_or_else(|| {
            SlateError::Download(DownloadFailure::VersionUnknown(version.to_string()))
        })?;
        // payload_filename is Some whenever download_url is
        let filename = self.payload_filename(version, device).unwrap_or_default();
        let target = dest.join(&filename);

        debug!(%url, target = %target.display(), "downloading firmware payload");

        let response = reqwest::get(&url)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|err| SlateError::Download(DownloadFailure::Other(err.to_string())))?;

        let mut body = response;
        let mut file = tokio::fs::File::create(&target).await?;
        while let Some(chunk) = body
            .chunk()
            .await
            .map_err(|err| SlateError::Download(DownloadFailure::Other(err.to_string())))?
        {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gen2_payload_filename() {
        let (version, device) =
            parse_payload_filename("3.2.3.1595_reMarkable2-wVbHkgKisg.signed").unwrap();
        assert_eq!(version, "3.2.3.1595");
        assert_eq!(device, DeviceGeneration::Gen2);
    }

    #[test]
    fn parses_gen1_payload_filename() {
        let (version, device) =
            parse_payload_filename("2.15.1.1189_reMarkable-hFuQXCbbjW.signed").unwrap();
        assert_eq!(version, "2.15.1.1189");
        assert_eq!(device, DeviceGeneration::Gen1);
    }

    #[test]
    fn rejects_foreign_filenames() {
        assert!(parse_payload_filename("notes.txt").is_none());
        assert!(parse_payload_filename("3.2.3.1595_otherTablet-x.signed").is_none());
        assert!(parse_payload_filename("3.2.3.1595.signed").is_none());
    }

    #[test]
    fn scan_reports_staged_versions() {
        let dir = tempfile::tempdir().unwrap();
        let updates = dir.path().join(UPDATES_DIR);
        std::fs::create_dir(&updates).unwrap();
        std::fs::write(
            updates.join("3.2.3.1595_reMarkable2-wVbHkgKisg.signed"),
            b"payload",
        )
        .unwrap();
        std::fs::write(updates.join("README"), b"not a payload").unwrap();

        let catalog = FileCatalog::new(dir.path(), VersionCatalog::builtin());
        let staged = catalog.scan();
        assert!(staged[&DeviceGeneration::Gen2].contains("3.2.3.1595"));
        assert!(!staged.contains_key(&DeviceGeneration::Gen1));

        let path = catalog
            .staged_path("3.2.3.1595", DeviceGeneration::Gen2)
            .unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn scan_of_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FileCatalog::new(dir.path(), VersionCatalog::builtin());
        assert!(catalog.scan().is_empty());
        assert!(catalog
            .staged_path("3.2.3.1595", DeviceGeneration::Gen2)
            .is_none());
    }

    #[tokio::test]
    async fn fetch_into_missing_destination_fails() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FileCatalog::new(dir.path(), VersionCatalog::builtin());
        let missing = dir.path().join("nope");
        let err = catalog
            .fetch("3.2.3.1595", DeviceGeneration::Gen2, &missing)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SlateError::Download(DownloadFailure::DestinationMissing(_))
        ));
    }

    #[tokio::test]
    async fn fetch_of_unknown_version_fails() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FileCatalog::new(dir.path(), VersionCatalog::builtin());
        let err = catalog
            .fetch("9.9.9.9999", DeviceGeneration::Gen2, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SlateError::Download(DownloadFailure::VersionUnknown(_))
        ));
    }
}
