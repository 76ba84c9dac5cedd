//! The install workflow.
//!
//! A fixed sequence of steps, each a hard boundary: any failure aborts the
//! remaining steps with a specific error kind and is never retried
//! automatically. The payload server is the only background task; it is
//! stopped on every exit path once started.

use super::{run_blocking, Orchestrator};
use crate::catalog::{UpdateCatalog, UPDATES_DIR};
use crate::config::{patch_update_conf, NetworkEndpoint, UPDATE_CONF_PATH};
use crate::device::DeviceGeneration;
use crate::error::{DownloadFailure, SlateError};
use crate::server::{UpdateServer, DEFAULT_UPDATE_PORT};
use crate::transport::Transport;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Bind address when serving; the device picks the route, we accept on all
/// interfaces.
const SERVER_BIND_HOST: &str = "0.0.0.0";

#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub version_token: String,
    pub device: DeviceGeneration,
    /// Port written into the device config and bound by the server.
    pub port: u16,
    /// Upper bound on the device-side update check. Elapsing stops waiting
    /// but cancels nothing: the check keeps running on the device and the
    /// blocking task awaiting it occupies a pool thread until the command
    /// returns.
    pub update_timeout: Duration,
}

impl InstallOptions {
    pub fn new(version_token: impl Into<String>, device: DeviceGeneration) -> Self {
        Self {
            version_token: version_token.into(),
            device,
            port: DEFAULT_UPDATE_PORT,
            update_timeout: Duration::from_secs(15 * 60),
        }
    }
}

impl Orchestrator {
    /// Drive a full firmware install. Returns the installed version.
    pub async fn install(&self, opts: InstallOptions) -> Result<String, SlateError> {
        // ResolveVersion
        let version = self.versions.resolve(&opts.version_token, opts.device)?;
        info!(%version, device = %opts.device, "version resolved");

        let catalog = self.catalog.as_deref().ok_or_else(|| {
            SlateError::Download(DownloadFailure::Other(
                "no staging catalog configured".to_string(),
            ))
        })?;

        // EnsureStaged
        let payload = self.ensure_staged(catalog, &version, opts.device).await?;
        info!(payload = %payload.display(), "payload staged");

        // DetermineTopology
        let (host_addr, transport) = self.determine_topology()?;
        let remote = host_addr.is_some();
        let endpoint = NetworkEndpoint::new(
            host_addr.unwrap_or_else(|| SERVER_BIND_HOST.to_string()),
            opts.port,
        );

        // PatchConfig
        self.patch_device_config(&transport, &endpoint).await?;
        info!(%endpoint, "device config now points at us");

        // StartServer; every later step depends on it staying alive, so its
        // handle scopes the rest of the workflow.
        let server =
            UpdateServer::start(&catalog.staging_dir(), SERVER_BIND_HOST, opts.port).await?;
        let outcome = self
            .drive_update(&transport, remote, &endpoint, opts.update_timeout)
            .await;
        server.stop().await;
        outcome?;

        // OptionalShutdown
        self.optional_shutdown(&transport).await;

        Ok(version)
    }

    async fn ensure_staged(
        &self,
        catalog: &dyn UpdateCatalog,
        version: &str,
        device: DeviceGeneration,
    ) -> Result<PathBuf, SlateError> {
        let staged = catalog.scan();
        debug!(?staged, "staged payload inventory");
        if let Some(path) = catalog.staged_path(version, device) {
            debug!(%version, "already staged");
            return Ok(path);
        }

        info!(%version, "not staged locally, downloading");
        let updates_dir = catalog.staging_dir().join(UPDATES_DIR);
        std::fs::create_dir_all(&updates_dir)?;
        catalog.fetch(version, device, &updates_dir).await?;

        // download-then-rescan: the fetch must be visible to scan()
        catalog.staged_path(version, device).ok_or_else(|| {
            SlateError::Download(DownloadFailure::Other(format!(
                "downloaded payload for {} did not appear in the staging directory",
                version
            )))
        })
    }

    async fn patch_device_config(
        &self,
        transport: &Arc<dyn Transport>,
        endpoint: &NetworkEndpoint,
    ) -> Result<(), SlateError> {
        let transport = Arc::clone(transport);
        let endpoint = endpoint.clone();
        tokio::task::spawn_blocking(move || {
            let raw = transport
                .read_file(UPDATE_CONF_PATH)
                .map_err(|err| SlateError::ConfigWrite(err.to_string()))?;
            let patched = patch_update_conf(&String::from_utf8_lossy(&raw), &endpoint);
            transport
                .write_file(UPDATE_CONF_PATH, patched.as_bytes())
                .map_err(|err| SlateError::ConfigWrite(err.to_string()))
        })
        .await
        .map_err(|err| SlateError::Transport(format!("blocking task failed: {}", err)))?
    }

    async fn drive_update(
        &self,
        transport: &Arc<dyn Transport>,
        remote: bool,
        endpoint: &NetworkEndpoint,
        timeout: Duration,
    ) -> Result<(), SlateError> {
        // ReachabilityProbe: fail fast on firewalls before the engine spends
        // minutes fetching nothing. Only meaningful when the device and the
        // server are different machines.
        if remote {
            let probe = format!("sleep 2 && echo | nc {} {}", endpoint.host, endpoint.port);
            let out = run_blocking(transport, probe).await?;
            if !out.success() {
                return Err(SlateError::UnreachableNetwork(format!(
                    "device cannot reach {}; is a firewall blocking connections?",
                    endpoint
                )));
            }
            debug!("reachability probe passed");
        }

        // TriggerUpdate
        info!("starting update engine");
        let out = run_blocking(transport, "systemctl start update-engine".to_string()).await?;
        if !out.success() {
            return Err(SlateError::UpdateEngine { stderr: out.stderr });
        }

        // AwaitCompletion: blocks for the whole device-side check, bounded.
        info!("triggering update check (this can take several minutes)");
        let check = run_blocking(transport, "update_engine_client -update".to_string());
        let out = tokio::time::timeout(timeout, check)
            .await
            .map_err(|_| SlateError::UpdateEngine {
                stderr: format!(
                    "timed out after {}s waiting for the update engine",
                    timeout.as_secs()
                ),
            })??;
        if !out.success() {
            return Err(SlateError::UpdateEngine { stderr: out.stderr });
        }

        info!("update engine reported success");
        Ok(())
    }
}
