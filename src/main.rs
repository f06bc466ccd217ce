//! Binary entry point for the `localshell` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use dialoguer::Input;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use localshell::{
    CloudShellBackend, CloudShellBackendError, CloudShellConfig, ConnectError, ConnectOrchestrator,
    SessionConfig, SessionHandoff, SessionOutcome, VpcConfig,
};

mod cli;

use cli::Cli;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "LOCALSHELL_LOG";

/// Notice printed when the session plugin is not installed.
const MISSING_PLUGIN_MESSAGE: &str = "SessionManagerPlugin is not present";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("invalid input: {0}")]
    Input(String),
    #[error(transparent)]
    Connect(#[from] ConnectError<CloudShellBackendError>),
    #[error("session plugin exited with status {0}")]
    PluginExit(i32),
    #[error("session plugin was terminated by a signal")]
    PluginSignal,
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    let desired = desired_vpc_config(cli, prompt)?;

    let aws_config = CloudShellConfig::load_without_cli_args()
        .map_err(|err| CliError::Config(err.to_string()))?;
    let session_config =
        SessionConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    session_config
        .validate()
        .map_err(|err| CliError::Config(err.to_string()))?;

    let region = aws_config.region.clone();
    let backend = CloudShellBackend::new(aws_config).map_err(|err| match err {
        CloudShellBackendError::Config(message) => CliError::Config(message),
        other => CliError::Backend(other.to_string()),
    })?;
    let orchestrator = ConnectOrchestrator::new(
        backend,
        SessionHandoff::with_process_launcher(session_config.plugin_bin),
        session_config.environment_name,
    );

    let outcome = orchestrator.connect(&desired, &region).await?;
    exit_code_for(outcome, io::stderr())
}

/// Builds the desired configuration from flags, prompting for each value
/// that was not supplied.
fn desired_vpc_config(
    cli: Cli,
    mut ask: impl FnMut(&str) -> Result<String, CliError>,
) -> Result<VpcConfig, CliError> {
    let vpc_id = cli.vpc_id.map_or_else(|| ask("VpcId"), Ok)?;
    let subnet_ids = cli.subnet_ids.map_or_else(|| ask("SubnetIds"), Ok)?;
    let security_group_ids = cli
        .security_group_ids
        .map_or_else(|| ask("SecurityGroupIds"), Ok)?;

    VpcConfig::from_lists(&vpc_id, &subnet_ids, &security_group_ids)
        .map_err(|err| CliError::Input(err.to_string()))
}

fn prompt(label: &str) -> Result<String, CliError> {
    Input::<String>::new()
        .with_prompt(label)
        .interact_text()
        .map_err(|err| CliError::Input(format!("failed to read {label}: {err}")))
}

fn exit_code_for(outcome: SessionOutcome, mut stderr: impl Write) -> Result<i32, CliError> {
    match outcome {
        SessionOutcome::PluginNotFound => {
            writeln!(stderr, "{MISSING_PLUGIN_MESSAGE}").ok();
            Ok(0)
        }
        SessionOutcome::Exited { code: Some(0) } => Ok(0),
        SessionOutcome::Exited { code: Some(code) } => Err(CliError::PluginExit(code)),
        SessionOutcome::Exited { code: None } => Err(CliError::PluginSignal),
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
