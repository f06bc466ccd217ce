//! Value types describing CloudShell environments and their VPC placement.
//!
//! Both types are immutable snapshots: the desired [`VpcConfig`] is built
//! once from user input, and every [`Environment`] is decoded from a fresh
//! API response. Subnet and security-group identifiers are held in ordered
//! sets so equality ignores the order (and duplicates) of the input lists.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Desired network placement for an environment.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VpcConfig {
    /// Identifier of the VPC hosting the environment.
    #[serde(rename = "VpcId")]
    pub vpc_id: String,
    /// Subnets the environment may be placed in.
    #[serde(rename = "SubnetIds", default)]
    pub subnet_ids: BTreeSet<String>,
    /// Security groups attached to the environment's network interface.
    #[serde(rename = "SecurityGroupIds", default)]
    pub security_group_ids: BTreeSet<String>,
}

/// Errors raised when user input cannot form a [`VpcConfig`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum VpcConfigError {
    /// Raised when a required value is blank.
    #[error("missing or empty field: {0}")]
    Validation(String),
}

impl VpcConfig {
    /// Creates a configuration from already separated identifiers.
    #[must_use]
    pub fn new<S, G>(vpc_id: impl Into<String>, subnet_ids: S, security_group_ids: G) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        G: IntoIterator,
        G::Item: Into<String>,
    {
        Self {
            vpc_id: vpc_id.into(),
            subnet_ids: subnet_ids.into_iter().map(Into::into).collect(),
            security_group_ids: security_group_ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a configuration from CLI input where subnet and security group
    /// identifiers arrive as comma separated lists.
    ///
    /// Entries are trimmed and blank entries dropped.
    ///
    /// # Errors
    ///
    /// Returns [`VpcConfigError::Validation`] when the VPC id is blank or
    /// either list contains no identifiers.
    pub fn from_lists(
        vpc_id: &str,
        subnet_ids: &str,
        security_group_ids: &str,
    ) -> Result<Self, VpcConfigError> {
        let config = Self::new(
            vpc_id.trim(),
            split_ids(subnet_ids),
            split_ids(security_group_ids),
        );
        config.validate()?;
        Ok(config)
    }

    /// Checks that every field carries at least one identifier.
    ///
    /// # Errors
    ///
    /// Returns [`VpcConfigError::Validation`] naming the first empty field.
    pub fn validate(&self) -> Result<(), VpcConfigError> {
        if self.vpc_id.trim().is_empty() {
            return Err(VpcConfigError::Validation(String::from("vpc_id")));
        }
        if self.subnet_ids.is_empty() {
            return Err(VpcConfigError::Validation(String::from("subnet_ids")));
        }
        if self.security_group_ids.is_empty() {
            return Err(VpcConfigError::Validation(String::from(
                "security_group_ids",
            )));
        }
        Ok(())
    }
}

fn split_ids(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}

/// Snapshot of a remote environment as reported by the API.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Environment {
    /// Remote-assigned identifier.
    #[serde(rename = "EnvironmentId")]
    pub environment_id: String,
    /// Optional human readable name.
    #[serde(rename = "EnvironmentName", default)]
    pub environment_name: Option<String>,
    /// VPC placement, absent for environments on the public network.
    #[serde(rename = "VpcConfig", default)]
    pub vpc_config: Option<VpcConfig>,
}

impl Environment {
    /// Returns the environment name, or an empty string when unnamed.
    #[must_use]
    pub fn name(&self) -> &str {
        self.environment_name.as_deref().unwrap_or_default()
    }

    /// Returns `true` when the environment is named exactly `name`.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.environment_name.as_deref() == Some(name)
    }
}

/// Provisioning status reported for an environment.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(from = "String")]
pub enum EnvironmentStatus {
    /// The environment is being created.
    Creating,
    /// The environment is waking from suspension.
    Resuming,
    /// The environment is suspended and must be started.
    Suspended,
    /// The environment is ready for sessions.
    Running,
    /// Any status outside the states the lifecycle driver understands.
    Other(String),
}

impl EnvironmentStatus {
    /// Returns the wire representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "CREATING",
            Self::Resuming => "RESUMING",
            Self::Suspended => "SUSPENDED",
            Self::Running => "RUNNING",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl From<String> for EnvironmentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CREATING" => Self::Creating,
            "RESUMING" => Self::Resuming,
            "SUSPENDED" => Self::Suspended,
            "RUNNING" => Self::Running,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for EnvironmentStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl fmt::Display for EnvironmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn vpc_config_equality_ignores_order() {
        let lhs = VpcConfig::new("vpc-1", ["subnet-a", "subnet-b"], ["sg-x", "sg-y"]);
        let rhs = VpcConfig::new("vpc-1", ["subnet-b", "subnet-a"], ["sg-y", "sg-x"]);
        assert_eq!(lhs, rhs);
    }

    #[rstest]
    fn vpc_config_equality_ignores_duplicates() {
        let lhs = VpcConfig::new("vpc-1", ["subnet-a", "subnet-a"], ["sg-x"]);
        let rhs = VpcConfig::new("vpc-1", ["subnet-a"], ["sg-x"]);
        assert_eq!(lhs, rhs);
    }

    #[rstest]
    #[case(VpcConfig::new("vpc-2", ["subnet-a"], ["sg-x"]))]
    #[case(VpcConfig::new("vpc-1", ["subnet-b"], ["sg-x"]))]
    #[case(VpcConfig::new("vpc-1", ["subnet-a"], ["sg-x", "sg-y"]))]
    fn vpc_config_inequality_on_any_field(#[case] other: VpcConfig) {
        let base = VpcConfig::new("vpc-1", ["subnet-a"], ["sg-x"]);
        assert_ne!(base, other);
    }

    #[rstest]
    fn from_lists_trims_and_drops_blank_entries() {
        let config = VpcConfig::from_lists(" vpc-1 ", "subnet-a, subnet-b,,", "sg-x")
            .expect("input should be valid");
        assert_eq!(
            config,
            VpcConfig::new("vpc-1", ["subnet-a", "subnet-b"], ["sg-x"])
        );
    }

    #[rstest]
    #[case("", "subnet-a", "sg-x", "vpc_id")]
    #[case("vpc-1", " , ", "sg-x", "subnet_ids")]
    #[case("vpc-1", "subnet-a", "", "security_group_ids")]
    fn from_lists_rejects_blank_fields(
        #[case] vpc_id: &str,
        #[case] subnets: &str,
        #[case] groups: &str,
        #[case] field: &str,
    ) {
        let err = VpcConfig::from_lists(vpc_id, subnets, groups).expect_err("should reject");
        assert_eq!(err, VpcConfigError::Validation(field.to_owned()));
    }

    #[rstest]
    fn environment_decodes_without_vpc_config() {
        let env: Environment = serde_json::from_str(
            r#"{"EnvironmentId":"env-1","EnvironmentName":"default","Status":"RUNNING"}"#,
        )
        .expect("record should decode");
        assert_eq!(env.environment_id, "env-1");
        assert!(env.is_named("default"));
        assert!(env.vpc_config.is_none());
    }

    #[rstest]
    fn environment_decodes_vpc_config_with_missing_lists() {
        let env: Environment = serde_json::from_str(
            r#"{"EnvironmentId":"env-2","VpcConfig":{"VpcId":"vpc-1","SubnetIds":["s-b","s-a"]}}"#,
        )
        .expect("record should decode");
        let vpc = env.vpc_config.clone().expect("vpc config present");
        assert_eq!(vpc, VpcConfig::new("vpc-1", ["s-a", "s-b"], Vec::<String>::new()));
        assert_eq!(env.name(), "");
    }

    #[rstest]
    fn vpc_config_serialises_wire_shape() {
        let config = VpcConfig::new("vpc-1", ["subnet-b", "subnet-a"], ["sg-x"]);
        let json = serde_json::to_value(&config).expect("serialise");
        assert_eq!(
            json,
            serde_json::json!({
                "VpcId": "vpc-1",
                "SubnetIds": ["subnet-a", "subnet-b"],
                "SecurityGroupIds": ["sg-x"],
            })
        );
    }

    #[rstest]
    #[case("CREATING", EnvironmentStatus::Creating)]
    #[case("RESUMING", EnvironmentStatus::Resuming)]
    #[case("SUSPENDED", EnvironmentStatus::Suspended)]
    #[case("RUNNING", EnvironmentStatus::Running)]
    #[case("TERMINATED", EnvironmentStatus::Other(String::from("TERMINATED")))]
    fn status_parses_wire_values(#[case] raw: &str, #[case] expected: EnvironmentStatus) {
        let status = EnvironmentStatus::from(raw);
        assert_eq!(status, expected);
        assert_eq!(status.as_str(), raw);
    }
}
