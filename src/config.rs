//! Configuration loading via `ortho-config`.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::reconcile::DEFAULT_ENVIRONMENT_NAME;
use crate::session::DEFAULT_PLUGIN_BIN;

/// AWS credentials and endpoint settings for the CloudShell API, derived
/// from environment variables and configuration files.
///
/// File values are read from top-level keys of `localshell.toml`, the same
/// file [`SessionConfig`] loads.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "AWS",
    discovery(
        app_name = "localshell",
        env_var = "LOCALSHELL_CONFIG_PATH",
        config_file_name = "localshell.toml",
        dotfile_name = ".localshell.toml",
        project_file_name = "localshell.toml"
    )
)]
pub struct CloudShellConfig {
    /// Access key id used to sign requests. This value is required.
    #[ortho_config(default = String::new())]
    pub access_key_id: String,
    /// Secret access key used to sign requests. This value is required.
    #[ortho_config(default = String::new())]
    pub secret_access_key: String,
    /// Session token for temporary credentials.
    pub session_token: Option<String>,
    /// Region hosting the environments. Defaults to `us-east-1`.
    #[ortho_config(default = "us-east-1".to_owned())]
    pub region: String,
    /// Overrides the regional `https://cloudshell.<region>.amazonaws.com`
    /// endpoint.
    pub endpoint: Option<String>,
}

/// Session handoff settings loaded via `ortho-config`.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "LOCALSHELL",
    discovery(
        app_name = "localshell",
        env_var = "LOCALSHELL_CONFIG_PATH",
        config_file_name = "localshell.toml",
        dotfile_name = ".localshell.toml",
        project_file_name = "localshell.toml"
    )
)]
pub struct SessionConfig {
    /// Path or name of the Session Manager plugin executable.
    #[ortho_config(default = DEFAULT_PLUGIN_BIN.to_owned())]
    pub plugin_bin: String,
    /// Name identifying the environment this tool manages across runs.
    #[ortho_config(default = DEFAULT_ENVIRONMENT_NAME.to_owned())]
    pub environment_name: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to localshell.toml",
            metadata.description, metadata.env_var, metadata.toml_key
        )));
    }
    Ok(())
}

impl CloudShellConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("localshell")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Returns the API endpoint, honouring any override.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map_or_else(
                || format!("https://cloudshell.{}.amazonaws.com", self.region.trim()),
                |url| url.trim_end_matches('/').to_owned(),
            )
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_field(
            &self.access_key_id,
            &FieldMetadata::new("AWS access key id", "AWS_ACCESS_KEY_ID", "access_key_id"),
        )?;
        require_field(
            &self.secret_access_key,
            &FieldMetadata::new(
                "AWS secret access key",
                "AWS_SECRET_ACCESS_KEY",
                "secret_access_key",
            ),
        )?;
        require_field(
            &self.region,
            &FieldMetadata::new("AWS region", "AWS_REGION", "region"),
        )?;
        Ok(())
    }
}

impl SessionConfig {
    /// Loads configuration without attempting to parse CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("localshell")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Rejects blank plugin paths and environment names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_field(
            &self.plugin_bin,
            &FieldMetadata::new(
                "Session Manager plugin",
                "LOCALSHELL_PLUGIN_BIN",
                "plugin_bin",
            ),
        )?;
        require_field(
            &self.environment_name,
            &FieldMetadata::new(
                "environment name",
                "LOCALSHELL_ENVIRONMENT_NAME",
                "environment_name",
            ),
        )?;
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
