//! Drives an environment to the running state.
//!
//! The provider reports provisioning progress through a status value. The
//! driver waits while the environment is creating or resuming, starts it
//! when it is suspended, and returns once it is running. Any other status is
//! fatal. There is no overall deadline: the loop ends only on `RUNNING` or an
//! error.

use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::info;

use crate::backend::Backend;
use crate::environment::EnvironmentStatus;

/// Delay between status checks.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Errors raised while waiting for an environment.
#[derive(Debug, Error)]
pub enum LifecycleError<BackendError>
where
    BackendError: std::error::Error + 'static,
{
    /// Raised when the provider reports a status the driver cannot act on.
    #[error("environment {environment_id} has unexpected status {status}")]
    UnexpectedRemoteState {
        /// Environment being waited on.
        environment_id: String,
        /// Status reported by the provider.
        status: String,
    },
    /// Raised when the status query fails.
    #[error("failed to query environment status: {0}")]
    Status(#[source] BackendError),
    /// Raised when starting a suspended environment fails.
    #[error("failed to start environment: {0}")]
    Start(#[source] BackendError),
}

/// Polls `environment_id` every `poll_interval` until it is running.
///
/// A suspended environment is started, then polling continues after the same
/// delay.
///
/// # Errors
///
/// Returns [`LifecycleError::UnexpectedRemoteState`] for statuses other than
/// creating, resuming, suspended, or running, and wraps backend failures in
/// [`LifecycleError::Status`] or [`LifecycleError::Start`].
pub async fn wait_until_running<B: Backend>(
    backend: &B,
    environment_id: &str,
    poll_interval: Duration,
) -> Result<(), LifecycleError<B::Error>> {
    loop {
        let status = backend
            .environment_status(environment_id)
            .await
            .map_err(LifecycleError::Status)?;

        match &status {
            EnvironmentStatus::Running => return Ok(()),
            EnvironmentStatus::Suspended => {
                info!(environment_id, %status, "starting suspended environment");
                backend
                    .start_environment(environment_id)
                    .await
                    .map_err(LifecycleError::Start)?;
            }
            EnvironmentStatus::Creating | EnvironmentStatus::Resuming => {
                info!(environment_id, %status, "waiting for environment");
            }
            EnvironmentStatus::Other(other) => {
                return Err(LifecycleError::UnexpectedRemoteState {
                    environment_id: environment_id.to_owned(),
                    status: other.clone(),
                });
            }
        }

        sleep(poll_interval).await;
    }
}
