//! Hands the terminal over to the AWS Session Manager plugin.
//!
//! The plugin receives the session credentials through an environment
//! variable (never argv) and owns the interactive session until it exits.
//! User-entered signals are ignored by this process for the duration of the
//! plugin run; see [`crate::signals`].

use std::ffi::OsString;
use std::io;
use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::signals::SignalGuard;

/// Default plugin executable, resolved through `PATH`.
pub const DEFAULT_PLUGIN_BIN: &str = "session-manager-plugin";

/// Environment variable carrying the serialised session parameters.
pub const SESSION_RESPONSE_ENV: &str = "AWS_SSM_START_SESSION_RESPONSE";

/// Action keyword passed to the plugin.
pub const START_SESSION_ACTION: &str = "StartSession";

/// Session details returned by the `createSession` call.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct SessionDescriptor {
    /// Identifier of the session.
    #[serde(rename = "SessionId", default)]
    pub session_id: Option<String>,
    /// Token authenticating the stream.
    #[serde(rename = "TokenValue", default)]
    pub token_value: Option<String>,
    /// Signed websocket URL of the stream.
    #[serde(rename = "StreamUrl", default)]
    pub stream_url: Option<String>,
}

#[derive(Serialize)]
struct StartSessionPayload<'a> {
    #[serde(rename = "SessionId")]
    session_id: &'a str,
    #[serde(rename = "TokenValue")]
    token_value: &'a str,
    #[serde(rename = "StreamUrl")]
    stream_url: &'a str,
}

fn required<'a>(value: Option<&'a String>, field: &str) -> Result<&'a str, SessionError> {
    value
        .map(String::as_str)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| SessionError::MissingSessionField {
            field: field.to_owned(),
        })
}

impl SessionDescriptor {
    /// Serialises the fields the plugin expects into its JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingSessionField`] when any of the session
    /// id, token or stream URL is absent.
    pub fn start_session_payload(&self) -> Result<String, SessionError> {
        let payload = StartSessionPayload {
            session_id: required(self.session_id.as_ref(), "SessionId")?,
            token_value: required(self.token_value.as_ref(), "TokenValue")?,
            stream_url: required(self.stream_url.as_ref(), "StreamUrl")?,
        };
        serde_json::to_string(&payload).map_err(|err| SessionError::Payload {
            message: err.to_string(),
        })
    }
}

/// How the plugin run ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionOutcome {
    /// The plugin ran and exited; `code` is `None` when killed by a signal.
    Exited {
        /// Exit code reported by the plugin process.
        code: Option<i32>,
    },
    /// The plugin executable could not be found.
    PluginNotFound,
}

impl SessionOutcome {
    /// Returns `true` when the plugin ran and exited with status zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Exited { code: Some(0) })
    }
}

/// Errors raised while handing off to the plugin.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SessionError {
    /// Raised when the session descriptor lacks a required field.
    #[error("session response is missing {field}")]
    MissingSessionField {
        /// Wire name of the missing field.
        field: String,
    },
    /// Raised when the payload cannot be serialised.
    #[error("failed to encode session payload: {message}")]
    Payload {
        /// Serialiser error message.
        message: String,
    },
    /// Raised when signal dispositions cannot be changed.
    #[error("failed to ignore terminal signals: {message}")]
    SignalSetup {
        /// OS error message.
        message: String,
    },
    /// Raised when the plugin exists but cannot be started.
    #[error("failed to launch {program}: {message}")]
    Launch {
        /// Program that failed to start.
        program: String,
        /// OS error message.
        message: String,
    },
}

/// Starts the plugin process and waits for it to exit.
pub trait PluginLauncher {
    /// Runs `program` with `args` and the extra `env` variables, inheriting
    /// stdio, and returns its exit code.
    ///
    /// # Errors
    ///
    /// Returns the [`io::Error`] raised when the process cannot be spawned or
    /// waited on.
    fn launch(
        &self,
        program: &str,
        args: &[OsString],
        env: &[(OsString, OsString)],
    ) -> io::Result<Option<i32>>;
}

/// Launcher that spawns a real child process.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessPluginLauncher;

impl PluginLauncher for ProcessPluginLauncher {
    fn launch(
        &self,
        program: &str,
        args: &[OsString],
        env: &[(OsString, OsString)],
    ) -> io::Result<Option<i32>> {
        let status = Command::new(program)
            .args(args)
            .envs(env.iter().map(|(key, value)| (key, value)))
            .status()?;
        Ok(status.code())
    }
}

/// Runs the session plugin for a created session.
#[derive(Clone, Debug)]
pub struct SessionHandoff<L: PluginLauncher> {
    plugin_bin: String,
    launcher: L,
}

impl SessionHandoff<ProcessPluginLauncher> {
    /// Creates a handoff wired to the real process launcher.
    #[must_use]
    pub fn with_process_launcher(plugin_bin: impl Into<String>) -> Self {
        Self::new(plugin_bin, ProcessPluginLauncher)
    }
}

impl<L: PluginLauncher> SessionHandoff<L> {
    /// Creates a handoff using the given plugin path and launcher.
    #[must_use]
    pub fn new(plugin_bin: impl Into<String>, launcher: L) -> Self {
        Self {
            plugin_bin: plugin_bin.into(),
            launcher,
        }
    }

    /// Returns the plugin executable this handoff runs.
    #[must_use]
    pub fn plugin_bin(&self) -> &str {
        &self.plugin_bin
    }

    /// Runs the plugin for `descriptor` in `region`, blocking until it exits.
    ///
    /// User-entered signals are ignored while the plugin runs and restored
    /// afterwards on every path. A missing plugin executable is reported as
    /// [`SessionOutcome::PluginNotFound`] rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingSessionField`] before launching when the
    /// descriptor is incomplete, [`SessionError::SignalSetup`] when signals
    /// cannot be ignored, and [`SessionError::Launch`] for any other spawn
    /// failure.
    pub fn start_session(
        &self,
        descriptor: &SessionDescriptor,
        region: &str,
    ) -> Result<SessionOutcome, SessionError> {
        let payload = descriptor.start_session_payload()?;
        let args = [SESSION_RESPONSE_ENV, region, START_SESSION_ACTION]
            .into_iter()
            .map(OsString::from)
            .collect::<Vec<_>>();
        let env = [(
            OsString::from(SESSION_RESPONSE_ENV),
            OsString::from(payload),
        )];

        debug!(plugin = %self.plugin_bin, region, "starting session plugin");
        let guard =
            SignalGuard::ignore_user_signals().map_err(|err| SessionError::SignalSetup {
                message: err.to_string(),
            })?;
        let result = self.launcher.launch(&self.plugin_bin, &args, &env);
        drop(guard);

        match result {
            Ok(code) => Ok(SessionOutcome::Exited { code }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(SessionOutcome::PluginNotFound),
            Err(err) => Err(SessionError::Launch {
                program: self.plugin_bin.clone(),
                message: err.to_string(),
            }),
        }
    }
}
