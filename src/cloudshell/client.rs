//! Signed REST-JSON transport for the CloudShell API.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::sigv4::{SigningParams, sign_post};
use super::types::ApiErrorBody;
use super::{CloudShellBackend, CloudShellBackendError};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const SERVICE: &str = "cloudshell";
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

fn strip_scheme(endpoint: &str) -> &str {
    endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"))
        .unwrap_or(endpoint)
}

/// Extracts `host[:port]` from an endpoint URL.
pub(crate) fn endpoint_host(endpoint: &str) -> Option<&str> {
    strip_scheme(endpoint)
        .split('/')
        .next()
        .filter(|host| !host.is_empty())
}

/// Returns `true` when anything other than a trailing slash follows
/// `host[:port]`. Requests are signed over `/<operation>` only.
pub(crate) fn endpoint_has_path(endpoint: &str) -> bool {
    strip_scheme(endpoint)
        .split_once('/')
        .is_some_and(|(_, rest)| !rest.is_empty())
}

impl CloudShellBackend {
    /// Calls `operation` with `payload` and decodes the JSON response.
    pub(in crate::cloudshell) async fn call<T, R>(
        &self,
        operation: &str,
        payload: &T,
    ) -> Result<R, CloudShellBackendError>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        let body = serde_json::to_vec(payload).map_err(|err| CloudShellBackendError::Decode {
            operation: operation.to_owned(),
            message: err.to_string(),
        })?;
        let path = format!("/{operation}");
        let params = SigningParams {
            access_key_id: &self.config.access_key_id,
            secret_access_key: &self.config.secret_access_key,
            session_token: self.config.session_token.as_deref(),
            region: &self.config.region,
            service: SERVICE,
        };
        let signed = sign_post(&params, &self.host, &path, &body, Utc::now());

        let mut request = HTTP_CLIENT
            .post(format!("{}{path}", self.endpoint))
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in signed {
            request = request.header(name, value);
        }

        debug!(operation, "calling CloudShell API");
        let response = request
            .body(body)
            .send()
            .await
            .map_err(|err| CloudShellBackendError::Transport {
                operation: operation.to_owned(),
                message: err.to_string(),
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| CloudShellBackendError::Transport {
                operation: operation.to_owned(),
                message: err.to_string(),
            })?;

        if !status.is_success() {
            return Err(api_error(operation, status.as_u16(), &headers, &bytes));
        }

        let json: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };
        serde_json::from_slice(json).map_err(|err| CloudShellBackendError::Decode {
            operation: operation.to_owned(),
            message: err.to_string(),
        })
    }
}

fn api_error(
    operation: &str,
    status: u16,
    headers: &HeaderMap,
    body: &[u8],
) -> CloudShellBackendError {
    let parsed = serde_json::from_slice::<ApiErrorBody>(body).unwrap_or_default();
    let header_kind = headers
        .get(ERROR_TYPE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let kind = header_kind
        .or(parsed.kind)
        .map(|raw| short_error_kind(&raw).to_owned())
        .unwrap_or_else(|| String::from("unknown"));
    let message = parsed
        .message
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());

    CloudShellBackendError::Api {
        operation: operation.to_owned(),
        status,
        kind,
        message,
    }
}

/// Strips the `:http://…` suffix and `namespace#` prefix AWS may add.
fn short_error_kind(raw: &str) -> &str {
    let without_suffix = raw.split(':').next().unwrap_or(raw);
    without_suffix
        .rsplit('#')
        .next()
        .unwrap_or(without_suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://cloudshell.us-east-1.amazonaws.com", Some("cloudshell.us-east-1.amazonaws.com"))]
    #[case("http://127.0.0.1:8080/", Some("127.0.0.1:8080"))]
    #[case("localhost:9000", Some("localhost:9000"))]
    #[case("https://", None)]
    fn endpoint_host_strips_scheme_and_path(#[case] endpoint: &str, #[case] host: Option<&str>) {
        assert_eq!(endpoint_host(endpoint), host);
    }

    #[rstest]
    #[case("https://cloudshell.us-east-1.amazonaws.com", false)]
    #[case("http://127.0.0.1:8080/", false)]
    #[case("http://127.0.0.1:8080/prefix", true)]
    #[case("localhost:9000/cloudshell/", true)]
    fn endpoint_has_path_ignores_trailing_slash(#[case] endpoint: &str, #[case] expected: bool) {
        assert_eq!(endpoint_has_path(endpoint), expected);
    }

    #[rstest]
    #[case("ValidationException", "ValidationException")]
    #[case(
        "ServiceQuotaExceededException:http://internal.amazon.com/coral/com.amazonaws.cloudshell/",
        "ServiceQuotaExceededException"
    )]
    #[case("com.amazonaws.cloudshell#ResourceNotFoundException", "ResourceNotFoundException")]
    fn short_error_kind_normalises_type(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(short_error_kind(raw), expected);
    }

    #[rstest]
    fn api_error_falls_back_to_raw_body() {
        let err = api_error("createSession", 500, &HeaderMap::new(), b"upstream exploded");
        assert_eq!(
            err,
            CloudShellBackendError::Api {
                operation: String::from("createSession"),
                status: 500,
                kind: String::from("unknown"),
                message: String::from("upstream exploded"),
            }
        );
    }
}
