use std::path::PathBuf;

use anyhow::Context;
use tracing::{error, info, warn};
use webrunner::config::ServicesConfig;
use webrunner::endpoints::{self, default_endpoints};
use webrunner::http_server::{HttpServer, HttpServerConfig};
use webrunner::os_signals::wait_for_shutdown_signal;
use webrunner::supervisor::{BuildCache, Builder, ServiceManager};

pub(crate) async fn cmd_run(
    config: ServicesConfig,
    port: u16,
    static_dir: PathBuf,
) -> anyhow::Result<()> {
    let builder = Builder::new(config.toolchain, BuildCache::from_env());
    let mut manager = ServiceManager::new(config.services, builder);

    if let Err(e) = manager.start_all().await {
        error!("Failed to start services: {}", e);
        return Err(e).context("Startup aborted");
    }

    let router = endpoints::build_router(&default_endpoints(), &static_dir);
    let server = HttpServer::new(HttpServerConfig {
        port,
        ..Default::default()
    });
    let coordinator = manager.shutdown_coordinator();

    let http = match server.start(router).await {
        Ok(http) => http,
        Err(e) => {
            error!("Failed to start driver HTTP server: {}", e);
            coordinator.stop_services().await;
            return Err(e).context("HTTP server failed to start");
        }
    };
    info!("Usage: localhost:{}/eps", http.local_addr().port());

    tokio::select! {
        signal = wait_for_shutdown_signal() => match signal {
            Ok(name) => info!("Received signal: {}. Initiating graceful shutdown...", name),
            Err(e) => error!("Failed to listen for shutdown signals: {}. Shutting down", e),
        },
        () = http.finished() => {
            warn!("HTTP server stopped unexpectedly. Initiating shutdown...");
        }
    }

    coordinator.run(&http).await;
    Ok(())
}
