//! Service lifecycle manager
//!
//! Builds each declared service from source, starts it as the leader of its
//! own process group, watches it until it exits, and drives coordinated
//! termination on shutdown.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    ServiceManager                    │
//! ├──────────────────────────────────────────────────────┤
//! │ descriptors ─► Builder ─► launch ─► monitor (1/svc)  │
//! │                                        │             │
//! │ CancellationToken ──────────┐     TaskTracker        │
//! ├─────────────────────────────┴──────────┴─────────────┤
//! │                 ShutdownCoordinator                  │
//! │  http stop (5s) ► cancel ► SIGTERM groups ► join     │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Builds are sequential: service *k+1* is built only after service *k*
//! has been launched.

pub mod builder;
pub mod descriptor;
pub mod launcher;
pub mod monitor;
pub mod services;
pub mod shutdown;

pub use builder::{BuildCache, Builder, BuiltArtifact, Toolchain};
pub use descriptor::ServiceDescriptor;
pub use launcher::{launch, ExitOutcome, RunningService, ServiceHandle};
pub use monitor::{monitor, MonitorReport};
pub use services::ServiceManager;
pub use shutdown::{GracefulStop, ShutdownCoordinator, ShutdownReport, HTTP_STOP_TIMEOUT};
