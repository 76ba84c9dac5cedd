//! Shared library for slatectl: firmware install and rollback orchestration
//! for reMarkable-class tablets.

pub mod catalog;
pub mod config;
pub mod device;
pub mod error;
pub mod orchestrator;
pub mod server;
pub mod status;
pub mod topology;
pub mod transport;
pub mod version;

pub use catalog::{FileCatalog, UpdateCatalog};
pub use config::{patch_update_conf, NetworkEndpoint, UPDATE_CONF_PATH};
pub use device::DeviceGeneration;
pub use error::{DownloadFailure, SlateError};
pub use orchestrator::{
    Connector, InstallOptions, Interaction, NetworkScout, Orchestrator, SystemScout,
};
pub use server::{UpdateServer, DEFAULT_UPDATE_PORT};
pub use status::{read_status, DeviceStatus};
pub use transport::{CmdOutput, Credential, LocalTransport, RemoteTransport, Transport};
pub use version::{VersionCatalog, TOLTEC_VERSION};
