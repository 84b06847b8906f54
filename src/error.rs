use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    /// Compilation of a service failed; fatal for the whole startup.
    #[error("failed to build service {}: {status}\n{output}", path.display())]
    Build {
        path: PathBuf,
        status: String,
        output: String,
    },

    /// Process creation failed; fatal for the whole startup.
    #[error("failed to start service {}: {source}", path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("service {} exited with error: {status}", path.display())]
    RuntimeExit { path: PathBuf, status: String },

    #[cfg(unix)]
    #[error("failed to get pgid for service {} (pid {pid}): {source}", path.display())]
    SignalResolution {
        path: PathBuf,
        pid: u32,
        #[source]
        source: nix::Error,
    },

    #[cfg(unix)]
    #[error("failed to send SIGTERM to service {} (pgid {pgid}): {source}", path.display())]
    Signal {
        path: PathBuf,
        pgid: i32,
        #[source]
        source: nix::Error,
    },

    #[error("HTTP server did not stop within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("failed to create cache directory {}: {source}", path.display())]
    CacheSetup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SupervisorError {
    pub(crate) fn runtime_exit(path: impl Into<PathBuf>, status: ExitStatus) -> Self {
        Self::RuntimeExit {
            path: path.into(),
            status: status.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
