use crate::error::{Result, SupervisorError};
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::builder::BuildCache;
use super::descriptor::ServiceDescriptor;

/// How a child process ended.
#[derive(Debug)]
pub enum ExitOutcome {
    /// The process exited on its own (or from an external signal).
    Exited(ExitStatus),
    /// The process was force-killed because the execution context was cancelled.
    Killed(ExitStatus),
    /// Waiting on the process failed.
    WaitFailed(String),
}

impl ExitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitOutcome::Exited(status) if status.success())
    }

    /// The runtime error this outcome represents, if any.
    pub fn failure(&self, service: &ServiceDescriptor) -> Option<SupervisorError> {
        match self {
            ExitOutcome::Exited(status) if !status.success() => {
                Some(SupervisorError::runtime_exit(&service.path, *status))
            }
            ExitOutcome::WaitFailed(reason) => Some(SupervisorError::RuntimeExit {
                path: service.path.clone(),
                status: reason.clone(),
            }),
            _ => None,
        }
    }
}

/// Identity of a launched service, used only to signal its process group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHandle {
    pub descriptor: ServiceDescriptor,
    pub pid: u32,
    /// Process group resolved right after spawn, while the leader is still unreaped.
    #[cfg(unix)]
    pub pgid: std::result::Result<i32, nix::errno::Errno>,
}

/// A launched service. Owns its child process until the process exits.
#[derive(Debug)]
pub struct RunningService {
    descriptor: ServiceDescriptor,
    child: Child,
    pid: u32,
    #[cfg(unix)]
    pgid: std::result::Result<i32, nix::errno::Errno>,
    token: CancellationToken,
}

impl RunningService {
    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn handle(&self) -> ServiceHandle {
        ServiceHandle {
            descriptor: self.descriptor.clone(),
            pid: self.pid,
            #[cfg(unix)]
            pgid: self.pgid,
        }
    }

    /// Block until the child exits. Cancelling the bound token kills the child.
    pub async fn wait(&mut self) -> ExitOutcome {
        tokio::select! {
            status = self.child.wait() => match status {
                Ok(status) => ExitOutcome::Exited(status),
                Err(e) => ExitOutcome::WaitFailed(e.to_string()),
            },
            () = self.token.cancelled() => {
                // Fails only when the child was already reaped.
                if let Err(e) = self.child.start_kill() {
                    debug!(service = %self.descriptor.display_path(), "Kill skipped: {}", e);
                }
                match self.child.wait().await {
                    Ok(status) => ExitOutcome::Killed(status),
                    Err(e) => ExitOutcome::WaitFailed(e.to_string()),
                }
            }
        }
    }
}

/// Start a built service as the leader of a new process group.
///
/// The child inherits stdout/stderr and gets `PORT` plus the cache variables
/// added to the supervisor's environment. It is bound to `token`: cancelling
/// the token force-kills it while it is being waited on.
pub fn launch(
    service: &ServiceDescriptor,
    cache: &BuildCache,
    token: &CancellationToken,
) -> Result<RunningService> {
    let launch_err = |source| SupervisorError::Launch {
        path: service.path.clone(),
        source,
    };

    // Symlinks are resolved so the artifact can be unlinked as soon as we return.
    let program = std::fs::canonicalize(service.binary_path()).map_err(launch_err)?;

    let mut cmd = Command::new(&program);
    cmd.current_dir(&service.path)
        .env("PORT", &service.port)
        .envs(cache.env())
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    #[cfg(unix)]
    cmd.arg0(invocation_name(service)).process_group(0);

    let child = cmd.spawn().map_err(launch_err)?;
    let pid = child.id().ok_or_else(|| {
        launch_err(std::io::Error::other("spawned process has no pid"))
    })?;

    #[cfg(unix)]
    let pgid = resolve_group(service, pid);

    info!(
        service = %service.display_path(),
        pid = pid,
        "Started {} on port {}",
        service.display_path(),
        service.port
    );

    Ok(RunningService {
        descriptor: service.clone(),
        child,
        pid,
        #[cfg(unix)]
        pgid,
        token: token.clone(),
    })
}

/// `argv[0]` handed to the child: the binary name relative to its working directory.
#[cfg(unix)]
fn invocation_name(service: &ServiceDescriptor) -> String {
    format!("./{}", service.binary_name)
}

/// The child is not reaped before its monitor runs, so its group is still
/// resolvable here even if it has already exited.
#[cfg(unix)]
fn resolve_group(service: &ServiceDescriptor, pid: u32) -> std::result::Result<i32, nix::errno::Errno> {
    use nix::unistd::{getpgid, Pid};

    let pgid = getpgid(Some(Pid::from_raw(pid as i32))).map(|pgid| pgid.as_raw());
    if let Err(source) = pgid {
        let err = SupervisorError::SignalResolution {
            path: service.path.clone(),
            pid,
            source,
        };
        warn!(service = %service.display_path(), "{}", err);
    }
    pgid
}
