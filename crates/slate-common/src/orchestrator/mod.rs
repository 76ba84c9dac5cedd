//! Install and restore workflows.
//!
//! The orchestrator composes the version catalog, staged-payload catalog,
//! transport, config patcher and payload server into two operator-driven
//! workflows. Collaborators that touch the outside world (network scout,
//! SSH connector, terminal prompts) sit behind traits so both workflows run
//! deterministically under test with fake implementations.

mod install;
mod restore;

pub use install::InstallOptions;
pub use restore::swap_target;

use crate::catalog::UpdateCatalog;
use crate::device;
use crate::error::SlateError;
use crate::topology::{self, Topology, DEVICE_USB_ADDR};
use crate::transport::{CmdOutput, LocalTransport, Transport};
use crate::version::VersionCatalog;
use std::io;
use std::sync::Arc;
use tracing::{debug, warn};

/// Operator interaction seam. The terminal implementation lives in the CLI
/// crate; tests script their answers.
pub trait Interaction: Send + Sync {
    fn confirm(&self, prompt: &str, default_yes: bool) -> io::Result<bool>;
    fn ask(&self, prompt: &str) -> io::Result<String>;
    /// One-way message to the operator, e.g. why a prompt is repeating.
    fn notify(&self, message: &str);
}

/// Builds the remote transport, including any credential retry loop.
pub trait Connector: Send + Sync {
    fn connect(&self, host: &str) -> Result<Arc<dyn Transport>, SlateError>;
}

/// Answers "where are we running and what addresses do we have".
pub trait NetworkScout: Send + Sync {
    fn on_device(&self) -> bool;
    fn host_candidates(&self) -> Vec<String>;
}

/// Scout backed by the real host: SoC identity file plus interface
/// enumeration.
#[derive(Debug, Default)]
pub struct SystemScout;

impl NetworkScout for SystemScout {
    fn on_device(&self) -> bool {
        device::running_on_device()
    }

    fn host_candidates(&self) -> Vec<String> {
        topology::host_candidates()
    }
}

pub struct Orchestrator {
    catalog: Option<Box<dyn UpdateCatalog>>,
    versions: VersionCatalog,
    scout: Box<dyn NetworkScout>,
    connector: Box<dyn Connector>,
    interaction: Box<dyn Interaction>,
}

impl Orchestrator {
    pub fn new(
        catalog: Box<dyn UpdateCatalog>,
        versions: VersionCatalog,
        scout: Box<dyn NetworkScout>,
        connector: Box<dyn Connector>,
        interaction: Box<dyn Interaction>,
    ) -> Self {
        Self {
            catalog: Some(catalog),
            versions,
            scout,
            connector,
            interaction,
        }
    }

    /// Orchestrator for workflows that never stage payloads (restore, the
    /// status command). [`Orchestrator::install`] fails without a catalog.
    pub fn device_only(
        scout: Box<dyn NetworkScout>,
        connector: Box<dyn Connector>,
        interaction: Box<dyn Interaction>,
    ) -> Self {
        Self {
            catalog: None,
            versions: VersionCatalog::builtin(),
            scout,
            connector,
            interaction,
        }
    }

    /// Resolve the topology and produce a bound transport, plus the host
    /// address the device should fetch from (None when running on-device).
    fn determine_topology(&self) -> Result<(Option<String>, Arc<dyn Transport>), SlateError> {
        let topology = topology::classify(self.scout.on_device(), self.scout.host_candidates())?;
        debug!(?topology, "topology determined");

        match topology {
            Topology::OnDevice => Ok((None, Arc::new(LocalTransport::new()))),
            Topology::UsbTether { host_addr } => {
                let transport = self.connector.connect(DEVICE_USB_ADDR)?;
                Ok((Some(host_addr), transport))
            }
            Topology::Lan { candidates } => {
                let host_addr = self.pick_host_address(&candidates)?;
                let device_addr = self.ask_device_address()?;
                let transport = self.connector.connect(&device_addr)?;
                Ok((Some(host_addr), transport))
            }
        }
    }

    /// Transport to the device without the serving-address half; used by the
    /// restore workflow and the status command.
    pub fn device_transport(&self) -> Result<Arc<dyn Transport>, SlateError> {
        let topology = topology::classify(self.scout.on_device(), self.scout.host_candidates())?;
        match topology {
            Topology::OnDevice => Ok(Arc::new(LocalTransport::new())),
            Topology::UsbTether { .. } => self.connector.connect(DEVICE_USB_ADDR),
            Topology::Lan { .. } => {
                let device_addr = self.ask_device_address()?;
                self.connector.connect(&device_addr)
            }
        }
    }

    fn pick_host_address(&self, candidates: &[String]) -> Result<String, SlateError> {
        loop {
            let answer = self.interaction.ask(&format!(
                "Your IP on the network the device is connected to [{}]",
                candidates.join(", ")
            ))?;
            if !candidates.iter().any(|c| c == &answer) {
                self.interaction.notify(&format!(
                    "{} is not one of this host's addresses",
                    answer
                ));
                continue;
            }
            if self.interaction.confirm("Are you sure?", true)? {
                return Ok(answer);
            }
        }
    }

    fn ask_device_address(&self) -> Result<String, SlateError> {
        loop {
            let addr = self.interaction.ask("IP of the device")?;
            if addr.is_empty() {
                continue;
            }
            if self.interaction.confirm("Are you sure?", true)? {
                return Ok(addr);
            }
        }
    }

    /// Best-effort power-off prompt shared by both workflows. Never turns a
    /// successful workflow into a failure.
    async fn optional_shutdown(&self, transport: &Arc<dyn Transport>) {
        match self
            .interaction
            .confirm("Done! Would you like to shut the device down?", false)
        {
            Ok(true) => {
                if let Err(err) = run_blocking(transport, "shutdown now".to_string()).await {
                    warn!(%err, "shutdown request failed");
                }
            }
            Ok(false) => {}
            Err(err) => warn!(%err, "shutdown prompt failed"),
        }
    }
}

/// Run a transport command on the blocking pool so the async workflow (and
/// the payload server sharing its runtime) stays responsive.
pub(crate) async fn run_blocking(
    transport: &Arc<dyn Transport>,
    command: String,
) -> Result<CmdOutput, SlateError> {
    let transport = Arc::clone(transport);
    tokio::task::spawn_blocking(move || transport.run(&command))
        .await
        .map_err(|err| SlateError::Transport(format!("blocking task failed: {}", err)))?
}
