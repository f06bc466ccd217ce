//! Command-line interface definitions for the `localshell` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `localshell` binary.
///
/// Values left out on the command line are prompted for interactively.
#[derive(Debug, Parser)]
#[command(
    name = "localshell",
    version,
    about = "Open a CloudShell session inside your VPC from a local terminal"
)]
pub(crate) struct Cli {
    /// VPC that hosts the environment.
    #[arg(long, value_name = "VPC_ID")]
    pub(crate) vpc_id: Option<String>,
    /// Comma separated subnet ids for the environment.
    #[arg(long, value_name = "SUBNET_IDS")]
    pub(crate) subnet_ids: Option<String>,
    /// Comma separated security group ids for the environment.
    #[arg(long, value_name = "SECURITY_GROUP_IDS")]
    pub(crate) security_group_ids: Option<String>,
}
