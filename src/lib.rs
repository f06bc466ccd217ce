//! Core library for the `localshell` tool.
//!
//! The crate reconciles a desired VPC configuration with existing AWS
//! CloudShell environments, drives the chosen environment to the running
//! state, keeps it alive with heartbeats and hands the local terminal to the
//! Session Manager plugin.

pub mod backend;
pub mod cloudshell;
pub mod config;
pub mod connect;
pub mod environment;
pub mod keepalive;
pub mod lifecycle;
pub mod reconcile;
pub mod session;
pub mod signals;
pub mod test_support;

pub use backend::{Backend, BackendFuture};
pub use cloudshell::{CloudShellBackend, CloudShellBackendError};
pub use config::{CloudShellConfig, ConfigError, SessionConfig};
pub use connect::{ConnectError, ConnectOrchestrator};
pub use environment::{Environment, EnvironmentStatus, VpcConfig, VpcConfigError};
pub use keepalive::{KeepAlive, KeepAliveError, Shutdown};
pub use lifecycle::{LifecycleError, wait_until_running};
pub use reconcile::{DEFAULT_ENVIRONMENT_NAME, Decision, decide};
pub use session::{
    PluginLauncher, ProcessPluginLauncher, SessionDescriptor, SessionError, SessionHandoff,
    SessionOutcome,
};
pub use signals::SignalGuard;
