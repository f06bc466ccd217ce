//! Wire shapes for CloudShell API requests and responses.

use serde::{Deserialize, Serialize};

use crate::environment::{Environment, EnvironmentStatus, VpcConfig};

/// Body for every operation addressed to a single environment.
#[derive(Serialize)]
pub(crate) struct EnvironmentIdRequest<'a> {
    #[serde(rename = "EnvironmentId")]
    pub(crate) environment_id: &'a str,
}

#[derive(Serialize)]
pub(crate) struct CreateEnvironmentRequest<'a> {
    #[serde(rename = "EnvironmentName")]
    pub(crate) environment_name: &'a str,
    #[serde(rename = "VpcConfig")]
    pub(crate) vpc_config: &'a VpcConfig,
}

#[derive(Serialize)]
pub(crate) struct EmptyRequest {}

#[derive(Deserialize)]
pub(crate) struct EmptyResponse {}

#[derive(Deserialize)]
pub(crate) struct DescribeEnvironmentsResponse {
    #[serde(rename = "Environments", default)]
    pub(crate) environments: Vec<Environment>,
}

#[derive(Deserialize)]
pub(crate) struct EnvironmentStatusResponse {
    #[serde(rename = "Status")]
    pub(crate) status: EnvironmentStatus,
}

/// Error body returned by REST-JSON services.
#[derive(Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(rename = "__type", default)]
    pub(crate) kind: Option<String>,
    #[serde(alias = "Message", default)]
    pub(crate) message: Option<String>,
}
