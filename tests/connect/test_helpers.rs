//! Shared fixtures for connect BDD scenarios.

use std::sync::{Arc, Mutex, PoisonError};

use localshell::VpcConfig;
use localshell::test_support::{RecordingLauncher, ScriptedBackend, complete_session};
use rstest::fixture;

/// Name of the environment the workflow manages.
pub const MANAGED_NAME: &str = "cloudshell-local";

#[derive(Clone, Debug)]
pub struct ConnectContext {
    pub backend: ScriptedBackend,
    pub launcher: RecordingLauncher,
    pub desired: VpcConfig,
    pub outcome: Arc<Mutex<Option<ConnectResult>>>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConnectResult {
    Exited(Option<i32>),
    PluginMissing,
    Failure(String),
}

impl ConnectContext {
    pub fn record(&self, result: ConnectResult) {
        *self.outcome.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
    }

    pub fn result(&self) -> Option<ConnectResult> {
        self.outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[fixture]
pub fn connect_context() -> ConnectContext {
    let backend = ScriptedBackend::new();
    backend.set_session(complete_session());
    ConnectContext {
        backend,
        launcher: RecordingLauncher::new(),
        desired: VpcConfig::new("vpc-1", ["subnet-a", "subnet-b"], ["sg-1"]),
        outcome: Arc::new(Mutex::new(None)),
    }
}
