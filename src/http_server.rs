//! Supervisor's own HTTP listener.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::{Result, SupervisorError};
use crate::supervisor::GracefulStop;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: crate::clienv::server_port(),
            host: "0.0.0.0".to_string(),
        }
    }
}

pub struct HttpServer {
    config: HttpServerConfig,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig) -> Self {
        Self { config }
    }

    /// Bind and start serving `router` in a background task.
    pub async fn start(&self, router: Router) -> Result<HttpServerHandle> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| SupervisorError::Config(format!("invalid listen address: {}", e)))?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Starting server on port: {}", local_addr.port());

        let shutdown = CancellationToken::new();
        let done = CancellationToken::new();

        let task = {
            let shutdown = shutdown.clone();
            let done = done.clone();
            tokio::spawn(async move {
                let result = axum::serve(listener, router)
                    .with_graceful_shutdown(async move { shutdown.cancelled().await })
                    .await;
                if let Err(e) = &result {
                    error!("HTTP server error: {}", e);
                }
                done.cancel();
            })
        };

        Ok(HttpServerHandle {
            local_addr,
            shutdown,
            done,
            task,
        })
    }
}

/// Handle to a running HTTP server.
pub struct HttpServerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    done: CancellationToken,
    task: JoinHandle<()>,
}

impl HttpServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Resolves when the server stops, whether asked to or not.
    pub async fn finished(&self) {
        self.done.cancelled().await
    }
}

impl GracefulStop for HttpServerHandle {
    async fn stop_within(&self, timeout: Duration) -> Result<()> {
        self.shutdown.cancel();
        match tokio::time::timeout(timeout, self.done.cancelled()).await {
            Ok(()) => Ok(()),
            Err(_) => {
                self.task.abort();
                Err(SupervisorError::ShutdownTimeout(timeout))
            }
        }
    }
}
