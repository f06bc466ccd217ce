//! BDD scenarios for the connect workflow.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ConnectContext, connect_context};

#[scenario(
    path = "tests/features/connect.feature",
    name = "Reuse an environment with the exact configuration"
)]
fn scenario_reuse_exact_match(connect_context: ConnectContext) {
    drop(connect_context);
}

#[scenario(
    path = "tests/features/connect.feature",
    name = "Recreate the managed environment when its configuration changed"
)]
fn scenario_recreate_managed(connect_context: ConnectContext) {
    drop(connect_context);
}

#[scenario(
    path = "tests/features/connect.feature",
    name = "Abort when two other VPC environments exist"
)]
fn scenario_abort_when_full(connect_context: ConnectContext) {
    drop(connect_context);
}

#[scenario(
    path = "tests/features/connect.feature",
    name = "Start a suspended environment before the session"
)]
fn scenario_start_suspended(connect_context: ConnectContext) {
    drop(connect_context);
}

#[scenario(
    path = "tests/features/connect.feature",
    name = "Fail on an unexpected environment status"
)]
fn scenario_unexpected_status(connect_context: ConnectContext) {
    drop(connect_context);
}

#[scenario(
    path = "tests/features/connect.feature",
    name = "Report a missing session plugin"
)]
fn scenario_missing_plugin(connect_context: ConnectContext) {
    drop(connect_context);
}

#[scenario(
    path = "tests/features/connect.feature",
    name = "Reject an incomplete session response"
)]
fn scenario_incomplete_session(connect_context: ConnectContext) {
    drop(connect_context);
}
