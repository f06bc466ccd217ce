//! Test support utilities shared across unit and integration tests.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;

use crate::backend::{Backend, BackendFuture};
use crate::environment::{Environment, EnvironmentStatus, VpcConfig};
use crate::session::{PluginLauncher, SessionDescriptor};

/// Identifier assigned to environments created through [`ScriptedBackend`].
pub const CREATED_ENVIRONMENT_ID: &str = "env-created";

/// Records a single call made through [`ScriptedBackend`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BackendCall {
    /// `list_environments`.
    List,
    /// `create_environment` with the requested name and configuration.
    Create {
        /// Requested environment name.
        name: String,
        /// Requested VPC configuration.
        vpc_config: VpcConfig,
    },
    /// `delete_environment` for the given id.
    Delete(String),
    /// `environment_status` for the given id.
    Status(String),
    /// `start_environment` for the given id.
    Start(String),
    /// `create_session` for the given id.
    CreateSession(String),
    /// `send_heartbeat` for the given id.
    Heartbeat(String),
}

/// Errors returned by [`ScriptedBackend`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScriptedBackendError {
    /// Raised when an operation was configured to fail.
    #[error("scripted {0} failure")]
    Injected(&'static str),
    /// Raised when no scripted status remains.
    #[error("no scripted status left for {0}")]
    StatusExhausted(String),
}

#[derive(Debug, Default)]
struct State {
    environments: Vec<Environment>,
    statuses: VecDeque<EnvironmentStatus>,
    session: SessionDescriptor,
    heartbeat_failures: u32,
    heartbeat_delay: Option<Duration>,
    fail_on_list: bool,
    fail_on_create: bool,
    fail_on_delete: bool,
    calls: Vec<BackendCall>,
}

/// In-memory [`Backend`] returning scripted responses and recording calls.
///
/// Clones share state, so a test can keep a handle while the code under test
/// owns another.
#[derive(Clone, Debug, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<State>>,
}

impl ScriptedBackend {
    /// Creates a backend with no environments and no scripted statuses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an environment to the listing.
    pub fn push_environment(&self, environment: Environment) {
        self.state().environments.push(environment);
    }

    /// Queues statuses returned by successive status queries.
    pub fn push_statuses<I>(&self, statuses: I)
    where
        I: IntoIterator,
        I::Item: Into<EnvironmentStatus>,
    {
        self.state()
            .statuses
            .extend(statuses.into_iter().map(Into::into));
    }

    /// Sets the descriptor returned by `create_session`.
    pub fn set_session(&self, session: SessionDescriptor) {
        self.state().session = session;
    }

    /// Makes the next `count` heartbeats fail.
    pub fn fail_heartbeats(&self, count: u32) {
        self.state().heartbeat_failures = count;
    }

    /// Delays every heartbeat, simulating a hung request.
    pub fn delay_heartbeats(&self, delay: Duration) {
        self.state().heartbeat_delay = Some(delay);
    }

    /// Makes `list_environments` fail.
    pub fn fail_on_list(&self) {
        self.state().fail_on_list = true;
    }

    /// Makes `create_environment` fail.
    pub fn fail_on_create(&self) {
        self.state().fail_on_create = true;
    }

    /// Makes `delete_environment` fail.
    pub fn fail_on_delete(&self) {
        self.state().fail_on_delete = true;
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state().calls.clone()
    }

    /// Counts recorded calls matching `predicate`.
    #[must_use]
    pub fn count_calls(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.state().calls.iter().filter(|call| predicate(call)).count()
    }

    /// Returns the current environment listing.
    #[must_use]
    pub fn environments(&self) -> Vec<Environment> {
        self.state().environments.clone()
    }

    fn record(&self, call: BackendCall) {
        self.state().calls.push(call);
    }
}

impl Backend for ScriptedBackend {
    type Error = ScriptedBackendError;

    fn list_environments(&self) -> BackendFuture<'_, Vec<Environment>, Self::Error> {
        Box::pin(async move {
            self.record(BackendCall::List);
            let state = self.state();
            if state.fail_on_list {
                return Err(ScriptedBackendError::Injected("list"));
            }
            Ok(state.environments.clone())
        })
    }

    fn create_environment<'a>(
        &'a self,
        name: &'a str,
        vpc_config: &'a VpcConfig,
    ) -> BackendFuture<'a, Environment, Self::Error> {
        Box::pin(async move {
            self.record(BackendCall::Create {
                name: name.to_owned(),
                vpc_config: vpc_config.clone(),
            });
            let mut state = self.state();
            if state.fail_on_create {
                return Err(ScriptedBackendError::Injected("create"));
            }
            let created = Environment {
                environment_id: CREATED_ENVIRONMENT_ID.to_owned(),
                environment_name: Some(name.to_owned()),
                vpc_config: Some(vpc_config.clone()),
            };
            state.environments.push(created.clone());
            Ok(created)
        })
    }

    fn delete_environment<'a>(
        &'a self,
        environment_id: &'a str,
    ) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.record(BackendCall::Delete(environment_id.to_owned()));
            let mut state = self.state();
            if state.fail_on_delete {
                return Err(ScriptedBackendError::Injected("delete"));
            }
            state
                .environments
                .retain(|env| env.environment_id != environment_id);
            Ok(())
        })
    }

    fn environment_status<'a>(
        &'a self,
        environment_id: &'a str,
    ) -> BackendFuture<'a, EnvironmentStatus, Self::Error> {
        Box::pin(async move {
            self.record(BackendCall::Status(environment_id.to_owned()));
            self.state()
                .statuses
                .pop_front()
                .ok_or_else(|| ScriptedBackendError::StatusExhausted(environment_id.to_owned()))
        })
    }

    fn start_environment<'a>(
        &'a self,
        environment_id: &'a str,
    ) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.record(BackendCall::Start(environment_id.to_owned()));
            Ok(())
        })
    }

    fn create_session<'a>(
        &'a self,
        environment_id: &'a str,
    ) -> BackendFuture<'a, SessionDescriptor, Self::Error> {
        Box::pin(async move {
            self.record(BackendCall::CreateSession(environment_id.to_owned()));
            Ok(self.state().session.clone())
        })
    }

    fn send_heartbeat<'a>(
        &'a self,
        environment_id: &'a str,
    ) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.record(BackendCall::Heartbeat(environment_id.to_owned()));
            let delay = self.state().heartbeat_delay;
            if let Some(duration) = delay {
                tokio::time::sleep(duration).await;
            }
            let mut state = self.state();
            if state.heartbeat_failures > 0 {
                state.heartbeat_failures -= 1;
                return Err(ScriptedBackendError::Injected("heartbeat"));
            }
            Ok(())
        })
    }
}

/// Returns a descriptor carrying every field the plugin needs.
#[must_use]
pub fn complete_session() -> SessionDescriptor {
    SessionDescriptor {
        session_id: Some(String::from("session-1")),
        token_value: Some(String::from("token-1")),
        stream_url: Some(String::from("wss://stream.example/session-1")),
    }
}

/// Records a single invocation made through [`RecordingLauncher`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LaunchInvocation {
    /// Program name as passed to the launcher.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
    /// Extra environment variables passed to the program.
    pub env: Vec<(OsString, OsString)>,
}

/// Plugin launcher that returns a scripted result instead of spawning.
#[derive(Clone, Debug)]
pub struct RecordingLauncher {
    result: Arc<Mutex<Result<Option<i32>, io::ErrorKind>>>,
    invocations: Arc<Mutex<Vec<LaunchInvocation>>>,
}

impl Default for RecordingLauncher {
    fn default() -> Self {
        Self {
            result: Arc::new(Mutex::new(Ok(Some(0)))),
            invocations: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl RecordingLauncher {
    /// Creates a launcher whose runs exit with status zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent launches report `code`.
    pub fn exit_with(&self, code: Option<i32>) {
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = Ok(code);
    }

    /// Makes subsequent launches fail with an error of `kind`.
    pub fn fail_with(&self, kind: io::ErrorKind) {
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = Err(kind);
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<LaunchInvocation> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PluginLauncher for RecordingLauncher {
    fn launch(
        &self,
        program: &str,
        args: &[OsString],
        env: &[(OsString, OsString)],
    ) -> io::Result<Option<i32>> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LaunchInvocation {
                program: program.to_owned(),
                args: args.to_vec(),
                env: env.to_vec(),
            });
        let result = *self.result.lock().unwrap_or_else(PoisonError::into_inner);
        result.map_err(io::Error::from)
    }
}
