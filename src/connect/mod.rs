//! Connects the local terminal to a running environment.
//!
//! The orchestrator reconciles the desired VPC configuration against the
//! environments that already exist, drives the chosen environment to the
//! running state, opens a session and hands the terminal to the session
//! plugin. A keep-alive worker sends heartbeats for as long as the plugin
//! runs and is stopped once the handoff returns, whatever the outcome.

use std::time::Duration;

use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{info, warn};

use crate::backend::Backend;
use crate::environment::{Environment, VpcConfig};
use crate::keepalive::{HEARTBEAT_INTERVAL, KeepAlive, SHUTDOWN_GRACE, Shutdown};
use crate::lifecycle::{LifecycleError, STATUS_POLL_INTERVAL, wait_until_running};
use crate::reconcile::{Decision, decide};
use crate::session::{PluginLauncher, SessionDescriptor, SessionError, SessionHandoff, SessionOutcome};

/// Errors surfaced while connecting to an environment.
#[derive(Debug, Error)]
pub enum ConnectError<BackendError>
where
    BackendError: std::error::Error + 'static,
{
    /// Raised when unrelated VPC environments already use every slot.
    #[error("There are already 2 Environments with a VPC Configuration. Aborting")]
    ReconciliationAbort {
        /// Number of unrelated environments carrying a VPC configuration.
        configured: usize,
    },
    /// Raised when existing environments cannot be listed.
    #[error("failed to list environments: {0}")]
    List(#[source] BackendError),
    /// Raised when a mismatched environment cannot be deleted.
    #[error("failed to delete environment {environment_id}: {source}")]
    Delete {
        /// Environment that was being replaced.
        environment_id: String,
        /// Provider-specific error.
        #[source]
        source: BackendError,
    },
    /// Raised when a new environment cannot be created.
    #[error("failed to create environment: {0}")]
    Create(#[source] BackendError),
    /// Raised when the environment does not reach the running state.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError<BackendError>),
    /// Raised when the session cannot be created.
    #[error("failed to create session: {0}")]
    CreateSession(#[source] BackendError),
    /// Raised when the session plugin cannot be run.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Executes the connect flow using the provided backend and handoff.
#[derive(Debug)]
pub struct ConnectOrchestrator<B, L: PluginLauncher> {
    backend: B,
    handoff: SessionHandoff<L>,
    environment_name: String,
    poll_interval: Duration,
    heartbeat_interval: Duration,
    shutdown_grace: Duration,
}

impl<B, L> ConnectOrchestrator<B, L>
where
    B: Backend + Clone + Send + Sync + 'static,
    B::Error: Send + Sync,
    L: PluginLauncher,
{
    /// Creates a new orchestrator managing environments named
    /// `environment_name`.
    #[must_use]
    pub fn new(backend: B, handoff: SessionHandoff<L>, environment_name: impl Into<String>) -> Self {
        Self {
            backend,
            handoff,
            environment_name: environment_name.into(),
            poll_interval: STATUS_POLL_INTERVAL,
            heartbeat_interval: HEARTBEAT_INTERVAL,
            shutdown_grace: SHUTDOWN_GRACE,
        }
    }

    /// Overrides the status polling interval.
    ///
    /// This is primarily used by tests to keep provisioning scenarios fast.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the delay between heartbeats.
    #[must_use]
    pub const fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Overrides how long the keep-alive worker may take to stop.
    #[must_use]
    pub const fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Returns an environment matching `desired`, deleting and creating
    /// environments as the reconciliation requires.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::ReconciliationAbort`] when no slot is free, and
    /// [`ConnectError::List`], [`ConnectError::Delete`] or
    /// [`ConnectError::Create`] when the backend fails.
    pub async fn provision(
        &self,
        desired: &VpcConfig,
    ) -> Result<Environment, ConnectError<B::Error>> {
        let existing = self
            .backend
            .list_environments()
            .await
            .map_err(ConnectError::List)?;

        let environment = match decide(desired, &existing, &self.environment_name) {
            Decision::UseExisting(environment) => environment,
            Decision::RecreateThenUse(stale) => {
                info!(
                    environment_id = %stale.environment_id,
                    "VPC configuration changed, recreating environment"
                );
                self.backend
                    .delete_environment(&stale.environment_id)
                    .await
                    .map_err(|source| ConnectError::Delete {
                        environment_id: stale.environment_id.clone(),
                        source,
                    })?;
                self.create(desired).await?
            }
            Decision::CreateNew => self.create(desired).await?,
            Decision::Abort { configured } => {
                return Err(ConnectError::ReconciliationAbort { configured });
            }
        };

        info!(
            "Using environment {} ({})",
            environment.name(),
            environment.environment_id
        );
        Ok(environment)
    }

    /// Provisions an environment, waits for it to run and hands the terminal
    /// to the session plugin until it exits.
    ///
    /// The keep-alive worker is stopped before this returns, including when
    /// the handoff fails.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError`] when provisioning, waiting, session creation
    /// or the handoff fail.
    pub async fn connect(
        &self,
        desired: &VpcConfig,
        region: &str,
    ) -> Result<SessionOutcome, ConnectError<B::Error>> {
        let environment = self.provision(desired).await?;
        let environment_id = environment.environment_id;

        wait_until_running(&self.backend, &environment_id, self.poll_interval).await?;

        let descriptor = self
            .backend
            .create_session(&environment_id)
            .await
            .map_err(ConnectError::CreateSession)?;
        info!(
            session_id = descriptor.session_id.as_deref().unwrap_or_default(),
            "created session"
        );
        descriptor
            .start_session_payload()
            .map_err(ConnectError::Session)?;

        let worker = KeepAlive::spawn(
            self.backend.clone(),
            environment_id.clone(),
            self.heartbeat_interval,
        );
        let outcome = self.hand_off(&descriptor, region);
        log_shutdown(&environment_id, &worker.shutdown(self.shutdown_grace).await);

        outcome.map_err(ConnectError::Session)
    }

    async fn create(&self, desired: &VpcConfig) -> Result<Environment, ConnectError<B::Error>> {
        self.backend
            .create_environment(&self.environment_name, desired)
            .await
            .map_err(ConnectError::Create)
    }

    fn hand_off(
        &self,
        descriptor: &SessionDescriptor,
        region: &str,
    ) -> Result<SessionOutcome, SessionError> {
        let run = || self.handoff.start_session(descriptor, region);
        let multi_thread = Handle::try_current()
            .is_ok_and(|handle| handle.runtime_flavor() == RuntimeFlavor::MultiThread);
        if multi_thread {
            tokio::task::block_in_place(run)
        } else {
            run()
        }
    }
}

fn log_shutdown(environment_id: &str, shutdown: &Shutdown) {
    match shutdown {
        Shutdown::Stopped => info!(environment_id, "keep-alive stopped"),
        Shutdown::Killed => warn!(environment_id, "keep-alive did not stop in time and was killed"),
        Shutdown::Failed(message) => warn!(environment_id, error = %message, "keep-alive failed"),
    }
}
