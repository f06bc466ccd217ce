//! Backend abstraction over the remote environment API.
//!
//! The orchestrator, lifecycle driver, and keep-alive worker only talk to the
//! provider through [`Backend`], so tests can substitute a scripted double.

use std::future::Future;
use std::pin::Pin;

use crate::environment::{Environment, EnvironmentStatus, VpcConfig};
use crate::session::SessionDescriptor;

/// Future returned by backend operations.
pub type BackendFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Minimal interface implemented by environment providers.
pub trait Backend {
    /// Provider specific error type returned by the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Lists every environment visible to the caller.
    fn list_environments(&self) -> BackendFuture<'_, Vec<Environment>, Self::Error>;

    /// Creates an environment named `name` placed in `vpc_config`.
    fn create_environment<'a>(
        &'a self,
        name: &'a str,
        vpc_config: &'a VpcConfig,
    ) -> BackendFuture<'a, Environment, Self::Error>;

    /// Deletes the environment identified by `environment_id`.
    fn delete_environment<'a>(
        &'a self,
        environment_id: &'a str,
    ) -> BackendFuture<'a, (), Self::Error>;

    /// Fetches the current provisioning status of an environment.
    fn environment_status<'a>(
        &'a self,
        environment_id: &'a str,
    ) -> BackendFuture<'a, EnvironmentStatus, Self::Error>;

    /// Requests that a suspended environment be started.
    fn start_environment<'a>(
        &'a self,
        environment_id: &'a str,
    ) -> BackendFuture<'a, (), Self::Error>;

    /// Creates an interactive session against a running environment.
    fn create_session<'a>(
        &'a self,
        environment_id: &'a str,
    ) -> BackendFuture<'a, SessionDescriptor, Self::Error>;

    /// Signals that the environment is still in use.
    fn send_heartbeat<'a>(&'a self, environment_id: &'a str)
    -> BackendFuture<'a, (), Self::Error>;
}
