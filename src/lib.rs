pub mod clienv;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod http_server;
pub mod os_signals;
pub mod supervisor;

pub use error::{Result, SupervisorError};
pub use supervisor::{ServiceDescriptor, ServiceManager, ShutdownCoordinator};
