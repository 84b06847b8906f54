use crate::error::Result;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

use super::builder::Builder;
use super::descriptor::{self, ServiceDescriptor};
use super::launcher::{launch, ServiceHandle};
use super::monitor::monitor;
use super::shutdown::ShutdownCoordinator;

/// Builds, launches and tracks every declared service.
///
/// Owns the shared execution context and the tracker that counts
/// outstanding lifecycle monitors.
pub struct ServiceManager {
    descriptors: Vec<ServiceDescriptor>,
    builder: Builder,
    running: Vec<ServiceHandle>,
    token: CancellationToken,
    monitors: TaskTracker,
}

impl ServiceManager {
    pub fn new(descriptors: Vec<ServiceDescriptor>, builder: Builder) -> Self {
        Self {
            descriptors,
            builder,
            running: Vec::new(),
            token: CancellationToken::new(),
            monitors: TaskTracker::new(),
        }
    }

    pub fn running(&self) -> &[ServiceHandle] {
        &self.running
    }

    /// The shared execution context; cancelling it kills every bound child.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Number of lifecycle monitors that have not finished yet.
    pub fn outstanding(&self) -> usize {
        self.monitors.len()
    }

    /// Build and launch every service, one at a time in declaration order.
    ///
    /// Any build or launch failure is fatal: services already started are
    /// torn down before the error is returned, so startup is all-or-nothing.
    pub async fn start_all(&mut self) -> Result<()> {
        descriptor::validate_all(&self.descriptors)?;
        self.builder.cache().prepare()?;

        for index in 0..self.descriptors.len() {
            if let Err(e) = self.start_service(index).await {
                error!(service = %self.descriptors[index].display_path(), "{}", e);
                if !self.running.is_empty() {
                    info!("Stopping {} already started service(s)", self.running.len());
                    self.shutdown_coordinator().stop_services().await;
                }
                return Err(e);
            }
        }

        info!(services = self.running.len(), "All services started");
        Ok(())
    }

    async fn start_service(&mut self, index: usize) -> Result<()> {
        let service = &self.descriptors[index];
        let artifact = self.builder.build(service).await?;
        let running = launch(service, self.builder.cache(), &self.token)?;

        self.running.push(running.handle());
        self.monitors.spawn(monitor(running));

        // The artifact is unlinked here, at scope exit; the child keeps running.
        drop(artifact);
        Ok(())
    }

    /// Coordinator over the services started so far, sharing this manager's
    /// context and monitor tracker.
    pub fn shutdown_coordinator(&self) -> ShutdownCoordinator {
        ShutdownCoordinator::new(
            self.running.clone(),
            self.token.clone(),
            self.monitors.clone(),
        )
    }
}
