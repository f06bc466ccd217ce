//! AWS CloudShell implementation of the environment backend.
//!
//! CloudShell exposes a REST-JSON API where every operation is a signed
//! `POST /<operation>` against the regional endpoint.

mod client;
mod error;
mod sigv4;
mod types;

use tracing::info;

use crate::backend::{Backend, BackendFuture};
use crate::config::CloudShellConfig;
use crate::environment::{Environment, EnvironmentStatus, VpcConfig};
use crate::session::SessionDescriptor;
use types::{
    CreateEnvironmentRequest, DescribeEnvironmentsResponse, EmptyRequest, EmptyResponse,
    EnvironmentIdRequest, EnvironmentStatusResponse,
};

pub use error::CloudShellBackendError;

/// Backend that manages environments through the CloudShell API.
#[derive(Clone, Debug)]
pub struct CloudShellBackend {
    config: CloudShellConfig,
    endpoint: String,
    host: String,
}

impl CloudShellBackend {
    /// Constructs a new backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CloudShellBackendError::Config`] when the configuration fails
    /// validation, or when the endpoint has no host or carries a path.
    pub fn new(config: CloudShellConfig) -> Result<Self, CloudShellBackendError> {
        config.validate()?;
        let endpoint = config.endpoint_url();
        let host = client::endpoint_host(&endpoint)
            .ok_or_else(|| {
                CloudShellBackendError::Config(format!("endpoint {endpoint} has no host"))
            })?
            .to_owned();
        if client::endpoint_has_path(&endpoint) {
            return Err(CloudShellBackendError::Config(format!(
                "endpoint {endpoint} must not include a path"
            )));
        }
        Ok(Self {
            config,
            endpoint,
            host,
        })
    }

    /// Returns the region environments are managed in.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.config.region
    }

    /// Returns the endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn environment_call(
        &self,
        operation: &str,
        environment_id: &str,
    ) -> Result<(), CloudShellBackendError> {
        let _: EmptyResponse = self
            .call(operation, &EnvironmentIdRequest { environment_id })
            .await?;
        Ok(())
    }
}

impl Backend for CloudShellBackend {
    type Error = CloudShellBackendError;

    fn list_environments(&self) -> BackendFuture<'_, Vec<Environment>, Self::Error> {
        Box::pin(async move {
            let response: DescribeEnvironmentsResponse =
                self.call("describeEnvironments", &EmptyRequest {}).await?;
            Ok(response.environments)
        })
    }

    fn create_environment<'a>(
        &'a self,
        name: &'a str,
        vpc_config: &'a VpcConfig,
    ) -> BackendFuture<'a, Environment, Self::Error> {
        Box::pin(async move {
            info!(name, vpc_id = %vpc_config.vpc_id, "creating environment");
            self.call(
                "createEnvironment",
                &CreateEnvironmentRequest {
                    environment_name: name,
                    vpc_config,
                },
            )
            .await
        })
    }

    fn delete_environment<'a>(
        &'a self,
        environment_id: &'a str,
    ) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.environment_call("deleteEnvironment", environment_id)
                .await
        })
    }

    fn environment_status<'a>(
        &'a self,
        environment_id: &'a str,
    ) -> BackendFuture<'a, EnvironmentStatus, Self::Error> {
        Box::pin(async move {
            let response: EnvironmentStatusResponse = self
                .call(
                    "getEnvironmentStatus",
                    &EnvironmentIdRequest { environment_id },
                )
                .await?;
            Ok(response.status)
        })
    }

    fn start_environment<'a>(
        &'a self,
        environment_id: &'a str,
    ) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move { self.environment_call("startEnvironment", environment_id).await })
    }

    fn create_session<'a>(
        &'a self,
        environment_id: &'a str,
    ) -> BackendFuture<'a, SessionDescriptor, Self::Error> {
        Box::pin(async move {
            self.call("createSession", &EnvironmentIdRequest { environment_id })
                .await
        })
    }

    fn send_heartbeat<'a>(
        &'a self,
        environment_id: &'a str,
    ) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move { self.environment_call("sendHeartBeat", environment_id).await })
    }
}
