//! BDD step definitions for the connect workflow.

use std::io;
use std::time::Duration;

use localshell::test_support::{BackendCall, complete_session};
use localshell::{ConnectOrchestrator, Environment, SessionHandoff, SessionOutcome, VpcConfig};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{ConnectContext, ConnectResult, MANAGED_NAME};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn environment(id: &str, name: &str, vpc_config: VpcConfig) -> Environment {
    Environment {
        environment_id: id.to_owned(),
        environment_name: Some(name.to_owned()),
        vpc_config: Some(vpc_config),
    }
}

#[given("a connect workflow for the desired VPC configuration")]
fn ready_workflow(connect_context: ConnectContext) -> ConnectContext {
    connect_context
}

#[given("an environment \"{id}\" named \"{name}\" with the desired configuration")]
fn matching_environment(connect_context: ConnectContext, id: String, name: String) -> ConnectContext {
    let desired = connect_context.desired.clone();
    connect_context
        .backend
        .push_environment(environment(&id, &name, desired));
    connect_context
}

#[given("an environment \"{id}\" named \"{name}\" in VPC \"{vpc}\"")]
fn other_environment(
    connect_context: ConnectContext,
    id: String,
    name: String,
    vpc: String,
) -> ConnectContext {
    let vpc_config = VpcConfig::new(vpc, ["subnet-other"], ["sg-other"]);
    connect_context
        .backend
        .push_environment(environment(&id, &name, vpc_config));
    connect_context
}

#[given("the environment reports statuses \"{statuses}\"")]
fn scripted_statuses(connect_context: ConnectContext, statuses: String) -> ConnectContext {
    connect_context
        .backend
        .push_statuses(statuses.split(',').map(str::trim));
    connect_context
}

#[given("the session plugin is not installed")]
fn plugin_missing(connect_context: ConnectContext) -> ConnectContext {
    connect_context.launcher.fail_with(io::ErrorKind::NotFound);
    connect_context
}

#[given("the session response lacks a stream URL")]
fn incomplete_session(connect_context: ConnectContext) -> ConnectContext {
    let mut session = complete_session();
    session.stream_url = None;
    connect_context.backend.set_session(session);
    connect_context
}

#[when("I connect in region \"{region}\"")]
fn connect(connect_context: ConnectContext, region: String) -> Result<ConnectContext, StepError> {
    let runtime = Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))?;
    let orchestrator = ConnectOrchestrator::new(
        connect_context.backend.clone(),
        SessionHandoff::new("session-manager-plugin", connect_context.launcher.clone()),
        MANAGED_NAME,
    )
    .with_poll_interval(Duration::from_millis(1))
    .with_shutdown_grace(Duration::from_secs(5));

    let desired = connect_context.desired.clone();
    let result =
        runtime.block_on(async move { orchestrator.connect(&desired, region.as_str()).await });
    connect_context.record(match result {
        Ok(SessionOutcome::Exited { code }) => ConnectResult::Exited(code),
        Ok(SessionOutcome::PluginNotFound) => ConnectResult::PluginMissing,
        Err(err) => ConnectResult::Failure(err.to_string()),
    });
    Ok(connect_context)
}

#[then("the session outcome is \"{outcome}\"")]
fn session_outcome(connect_context: &ConnectContext, outcome: String) -> Result<(), StepError> {
    let expected = match outcome.as_str() {
        "exited-0" => ConnectResult::Exited(Some(0)),
        "plugin-missing" => ConnectResult::PluginMissing,
        other => {
            return Err(StepError::Assertion(format!("unknown outcome: {other}")));
        }
    };
    match connect_context.result() {
        Some(actual) if actual == expected => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected {expected:?}, got {other:?}"
        ))),
    }
}

#[then("the connect error is \"{message}\"")]
fn connect_error(connect_context: &ConnectContext, message: String) -> Result<(), StepError> {
    match connect_context.result() {
        Some(ConnectResult::Failure(actual)) if actual.contains(&message) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected failure containing {message:?}, got {other:?}"
        ))),
    }
}

#[then("environment \"{id}\" is deleted")]
fn environment_deleted(connect_context: &ConnectContext, id: String) -> Result<(), StepError> {
    let deleted = connect_context
        .backend
        .count_calls(|call| *call == BackendCall::Delete(id.clone()));
    if deleted == 1 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected one delete of {id}, got {deleted}"
        )))
    }
}

#[then("an environment named \"{name}\" is created")]
fn environment_created(connect_context: &ConnectContext, name: String) -> Result<(), StepError> {
    let desired = connect_context.desired.clone();
    let created = connect_context.backend.count_calls(|call| {
        *call
            == BackendCall::Create {
                name: name.clone(),
                vpc_config: desired.clone(),
            }
    });
    if created == 1 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected one create named {name}, got {created}"
        )))
    }
}

#[then("no environment is created")]
fn nothing_created(connect_context: &ConnectContext) -> Result<(), StepError> {
    let created = connect_context
        .backend
        .count_calls(|call| matches!(call, BackendCall::Create { .. }));
    if created == 0 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no environment to be created, got {created}"
        )))
    }
}

#[then("the environment is started once")]
fn started_once(connect_context: &ConnectContext) -> Result<(), StepError> {
    let started = connect_context
        .backend
        .count_calls(|call| matches!(call, BackendCall::Start(_)));
    if started == 1 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected one start command, got {started}"
        )))
    }
}

#[then("the plugin is launched for region \"{region}\"")]
fn plugin_launched(connect_context: &ConnectContext, region: String) -> Result<(), StepError> {
    let invocations = connect_context.launcher.invocations();
    let [invocation] = invocations.as_slice() else {
        return Err(StepError::Assertion(format!(
            "expected one plugin launch, got {}",
            invocations.len()
        )));
    };
    if invocation.args.get(1).is_some_and(|arg| *arg == *region) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected region {region}, got args {:?}",
            invocation.args
        )))
    }
}

#[then("the plugin is not launched")]
fn plugin_not_launched(connect_context: &ConnectContext) -> Result<(), StepError> {
    let launched = connect_context.launcher.invocations().len();
    if launched == 0 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no plugin launch, got {launched}"
        )))
    }
}
