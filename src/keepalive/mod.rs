//! Background heartbeats that stop an environment from being suspended.
//!
//! The worker runs as its own tokio task with its own backend handle, so a
//! slow or hung heartbeat never blocks the foreground session. Its owner
//! stops it in two steps: a stop request observed between heartbeats, then
//! an abort once the grace period has passed.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::backend::Backend;

/// Delay between heartbeats.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(300);

/// Time a worker is given to exit before it is aborted.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Consecutive heartbeat failures after which the worker gives up.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Errors that end a worker early.
#[derive(Debug, Error)]
pub enum KeepAliveError<BackendError>
where
    BackendError: std::error::Error + 'static,
{
    /// Raised after [`MAX_CONSECUTIVE_FAILURES`] heartbeats failed in a row.
    #[error("heartbeat for environment {environment_id} failed {failures} times: {source}")]
    Heartbeat {
        /// Environment the heartbeats were sent for.
        environment_id: String,
        /// Number of consecutive failures.
        failures: u32,
        /// Last backend error.
        #[source]
        source: BackendError,
    },
}

/// How a worker ended when its owner shut it down.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Shutdown {
    /// The worker honoured the stop request.
    Stopped,
    /// The worker did not exit within the grace period and was aborted.
    Killed,
    /// The worker had already ended with an error or panicked.
    Failed(String),
}

/// Handle to a running keep-alive worker.
#[derive(Debug)]
pub struct KeepAlive<E>
where
    E: std::error::Error + Send + 'static,
{
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), KeepAliveError<E>>>,
}

impl<E> KeepAlive<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Spawns a worker sending a heartbeat for `environment_id` immediately
    /// and then every `interval`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use = "dropping the handle stops the worker after its current heartbeat"]
    pub fn spawn<B>(backend: B, environment_id: String, interval: Duration) -> Self
    where
        B: Backend<Error = E> + Send + Sync + 'static,
    {
        let (stop, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run(backend, environment_id, interval, stop_rx));
        Self {
            stop: Some(stop),
            task,
        }
    }

    /// Returns `true` once the worker task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Requests the worker to stop, waits up to `grace`, then aborts it.
    pub async fn shutdown(mut self, grace: Duration) -> Shutdown {
        if let Some(stop) = self.stop.take() {
            stop.send(()).ok();
        }

        match timeout(grace, &mut self.task).await {
            Ok(Ok(Ok(()))) => Shutdown::Stopped,
            Ok(Ok(Err(err))) => Shutdown::Failed(err.to_string()),
            Ok(Err(join_err)) => Shutdown::Failed(join_err.to_string()),
            Err(_) => {
                self.task.abort();
                Shutdown::Killed
            }
        }
    }
}

async fn run<B: Backend>(
    backend: B,
    environment_id: String,
    interval: Duration,
    mut stop: oneshot::Receiver<()>,
) -> Result<(), KeepAliveError<B::Error>> {
    let mut failures = 0;
    loop {
        match backend.send_heartbeat(&environment_id).await {
            Ok(()) => {
                failures = 0;
                debug!(environment_id, "heartbeat sent");
            }
            Err(err) => {
                failures += 1;
                warn!(environment_id, failures, error = %err, "heartbeat failed");
                if failures >= MAX_CONSECUTIVE_FAILURES {
                    return Err(KeepAliveError::Heartbeat {
                        environment_id,
                        failures,
                        source: err,
                    });
                }
            }
        }

        tokio::select! {
            _ = &mut stop => return Ok(()),
            () = sleep(interval) => {}
        }
    }
}
