//! Error types for slatectl workflows.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlateError {
    #[error("unknown version '{token}' for {device}. Examples: latest, toltec, 3.2.3.1595, 2.15.0.1067")]
    VersionNotFound { token: String, device: String },

    #[error("firmware download failed: {0}")]
    Download(DownloadFailure),

    #[error("no usable network path to the device: {0}")]
    UnreachableNetwork(String),

    #[error("SSH authentication rejected by {host}")]
    Authentication { host: String },

    #[error("could not rewrite the update client config: {0}")]
    ConfigWrite(String),

    #[error("the update engine reported failure: {stderr}")]
    UpdateEngine { stderr: String },

    #[error("partition swap failed: {0}")]
    PartitionSwap(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a catalog fetch failed. The orchestrator reports these verbatim so the
/// operator can tell a missing folder apart from an unsupported version.
#[derive(Debug)]
pub enum DownloadFailure {
    DestinationMissing(PathBuf),
    VersionUnknown(String),
    Other(String),
}

impl std::fmt::Display for DownloadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DestinationMissing(dir) => {
                write!(f, "download folder {} does not exist", dir.display())
            }
            Self::VersionUnknown(version) => {
                write!(f, "version {} is not in the download list", version)
            }
            Self::Other(reason) => write!(f, "{}", reason),
        }
    }
}

impl From<ssh2::Error> for SlateError {
    fn from(err: ssh2::Error) -> Self {
        SlateError::Transport(format!("ssh: {}", err))
    }
}
