use std::path::PathBuf;
use tracing::{error, info};

use super::launcher::{ExitOutcome, RunningService};

/// What a monitor observed about its service.
#[derive(Debug)]
pub struct MonitorReport {
    pub path: PathBuf,
    pub outcome: ExitOutcome,
    /// True when the exit was logged as a runtime failure
    pub failed: bool,
}

/// Wait for one service to exit and log the outcome.
///
/// Failures are only reported while the execution context is live; exits
/// caused by shutdown are logged as normal stops. No restart is attempted.
/// Spawned on the supervisor's `TaskTracker`, whose count drops when this
/// future completes on any path.
pub async fn monitor(mut service: RunningService) -> MonitorReport {
    let outcome = service.wait().await;
    let descriptor = service.descriptor();

    let failure = if service.token().is_cancelled() {
        None
    } else {
        outcome.failure(descriptor)
    };

    match &failure {
        Some(err) => error!(service = %descriptor.display_path(), pid = service.pid(), "{}", err),
        None => info!(
            service = %descriptor.display_path(),
            "Service {} stopped",
            descriptor.display_path()
        ),
    }

    MonitorReport {
        path: descriptor.path.clone(),
        outcome,
        failed: failure.is_some(),
    }
}
