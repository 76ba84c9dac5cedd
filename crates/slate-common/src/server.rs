//! Transient HTTP server exposing staged firmware payloads.
//!
//! The device's update engine is a plain HTTP client; it fetches payloads at
//! `/updates/<filename>` relative to the configured server URL. `start`
//! returns only after the listening socket is bound, so a caller may treat
//! "start returned Ok" as "the device can begin fetching". Serving happens on
//! a background task until [`UpdateServer::stop`].

use crate::error::SlateError;
use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub const DEFAULT_UPDATE_PORT: u16 = 8080;

/// Handle to the running payload server.
pub struct UpdateServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl UpdateServer {
    /// Bind `bind_host:port` and serve `staging_dir`. Port 0 picks a free
    /// port; see [`UpdateServer::local_addr`].
    pub async fn start(
        staging_dir: &Path,
        bind_host: &str,
        port: u16,
    ) -> Result<Self, SlateError> {
        let app = Router::new()
            .fallback_service(ServeDir::new(staging_dir))
            .layer(TraceLayer::new_for_http());

        let listener = tokio::net::TcpListener::bind((bind_host, port)).await?;
        let addr = listener.local_addr()?;
        info!(%addr, dir = %staging_dir.display(), "payload server listening");

        let (shutdown, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = rx.await;
            });
            if let Err(err) = serve.await {
                error!(%err, "payload server terminated");
            }
        });

        Ok(Self {
            addr,
            shutdown,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Shut down and wait for the serving task to finish. Safe to call
    /// whether or not any request was ever served.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
        info!("payload server stopped");
    }
}
