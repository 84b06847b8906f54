//! Coordinated termination of the HTTP listener and every child service.
//!
//! ## Sequence
//! 1. Stop the HTTP listener within [`HTTP_STOP_TIMEOUT`] (a timeout is logged, not fatal)
//! 2. Cancel the shared execution context (force-kills every bound child)
//! 3. Send `SIGTERM` to each service's whole process group (reaches descendants)
//! 4. Wait for every lifecycle monitor to finish (no timeout)
//! 5. Log aggregate completion
//!
//! Steps 2 and 3 are independent. Either one alone terminates a plain child.
//! Step 3 uses the group recorded at launch, so descendants are reached even
//! when step 2 has already reaped the leader. An empty group is not an error.

use crate::error::{Result, SupervisorError};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::launcher::ServiceHandle;

pub const HTTP_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// A listener that can be asked to stop within a deadline.
pub trait GracefulStop {
    fn stop_within(&self, timeout: Duration) -> impl Future<Output = Result<()>> + Send;
}

/// Outcome of a shutdown run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// HTTP listener stopped before its deadline
    pub http_stopped: bool,
    /// Process groups that received SIGTERM
    pub signaled: usize,
    /// Process groups that were already empty
    pub exited: usize,
    /// Services whose group could not be resolved or signaled
    pub skipped: usize,
}

pub struct ShutdownCoordinator {
    services: Vec<ServiceHandle>,
    token: CancellationToken,
    monitors: TaskTracker,
    http_timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(services: Vec<ServiceHandle>, token: CancellationToken, monitors: TaskTracker) -> Self {
        Self {
            services,
            token,
            monitors,
            http_timeout: HTTP_STOP_TIMEOUT,
        }
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Number of lifecycle monitors still running.
    pub fn outstanding(&self) -> usize {
        self.monitors.len()
    }

    /// Full shutdown sequence.
    pub async fn run<H: GracefulStop>(&self, http: &H) -> ShutdownReport {
        let http_stopped = match http.stop_within(self.http_timeout).await {
            Ok(()) => {
                info!("HTTP server shutdown gracefully");
                true
            }
            Err(e) => {
                warn!("HTTP server shutdown error: {}", e);
                false
            }
        };

        let report = self.stop_services().await;
        info!(
            signaled = report.signaled,
            exited = report.exited,
            skipped = report.skipped,
            "All services stopped. Exiting."
        );

        ShutdownReport {
            http_stopped,
            ..report
        }
    }

    /// Steps 2-4: cancel, signal every process group, join all monitors.
    pub async fn stop_services(&self) -> ShutdownReport {
        self.token.cancel();

        let mut report = ShutdownReport::default();
        for service in &self.services {
            match signal_group(service) {
                Ok(true) => report.signaled += 1,
                Ok(false) => report.exited += 1,
                Err(e) => {
                    warn!(service = %service.descriptor.display_path(), "{}", e);
                    report.skipped += 1;
                }
            }
        }

        self.monitors.close();
        debug!(outstanding = self.monitors.len(), "Waiting for services to stop");
        self.monitors.wait().await;

        report
    }
}

/// `Ok(false)` when the group has no members left.
#[cfg(unix)]
fn signal_group(service: &ServiceHandle) -> Result<bool> {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let pgid = service.pgid.map_err(|source| SupervisorError::SignalResolution {
        path: service.descriptor.path.clone(),
        pid: service.pid,
        source,
    })?;

    match killpg(Pid::from_raw(pgid), Signal::SIGTERM) {
        Ok(()) => {
            debug!(service = %service.descriptor.display_path(), pgid, "Sent SIGTERM to process group");
            Ok(true)
        }
        Err(Errno::ESRCH) => {
            debug!(service = %service.descriptor.display_path(), pgid, "Process group already gone");
            Ok(false)
        }
        Err(source) => Err(SupervisorError::Signal {
            path: service.descriptor.path.clone(),
            pgid,
            source,
        }),
    }
}

#[cfg(not(unix))]
fn signal_group(service: &ServiceHandle) -> Result<bool> {
    debug!(
        service = %service.descriptor.display_path(),
        "Process groups unsupported on this platform; relying on context kill"
    );
    Ok(false)
}
