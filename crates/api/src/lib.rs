//! Job service client.
//!
//! A thin wrapper around `reqwest` for the validation job service: health and
//! file listing, job submission, status polling and result download.
//!
//! The primary entry point is [`JobClient`]. Build one from a base URL with
//! [`JobClient::new`] or from the environment with [`JobClient::from_env`].
//!
//! # Example
//!
//! ```ignore
//! use resultgrid_api::JobClient;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), resultgrid_api::ApiError> {
//! let client = JobClient::from_env(None)?;
//! let document = client.wait_for_result("7f3c2a", Duration::from_secs(2)).await?;
//! println!("{document:#}");
//! # Ok(())
//! # }
//! ```

use std::env;
use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, Method, RequestBuilder, StatusCode, header};
use resultgrid_types::{CreateJobPayload, FilesResponse, Job, JobStatus};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Environment variable overriding the configured service URL.
pub const API_BASE_ENV: &str = "RESULTGRID_API_BASE";
/// Service URL used when neither the environment nor the config names one.
pub const DEFAULT_API_BASE: &str = "http://localhost:8001";

/// Characters left unescaped in path segments, matching `encodeURIComponent`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    /// Non-2xx response; `message` is the most specific text the body offered.
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("job {id} failed")]
    JobFailed { id: String },
}

#[derive(Debug, Clone)]
pub struct JobClient {
    base_url: String,
    http: Client,
}

impl JobClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = validate_base_url(base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .default_headers(default_headers)
            .user_agent(format!("resultgrid/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS))
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self { base_url, http })
    }

    /// Resolves the base URL from `RESULTGRID_API_BASE`, then `configured`,
    /// then [`DEFAULT_API_BASE`].
    pub fn from_env(configured: Option<&str>) -> Result<Self, ApiError> {
        Self::new(&resolve_base_url(configured))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<Value, ApiError> {
        self.get("/health").await
    }

    pub async fn list_files(&self) -> Result<FilesResponse, ApiError> {
        self.get_as("/files").await
    }

    pub async fn create_job(&self, payload: &CreateJobPayload) -> Result<Job, ApiError> {
        let path = "/jobs";
        debug!(op = payload.op(), "submitting job");
        let value = self.send(self.request(Method::POST, path).json(payload), path).await?;
        decode(path, value)
    }

    pub async fn get_job(&self, id: &str) -> Result<Job, ApiError> {
        self.get_as(&job_path(id)).await
    }

    /// Downloads the result document of a finished job.
    pub async fn get_job_result(&self, id: &str) -> Result<Value, ApiError> {
        self.get(&format!("{}/result", job_path(id))).await
    }

    /// Polls until the job finishes, then fetches its result.
    pub async fn wait_for_result(&self, id: &str, interval: Duration) -> Result<Value, ApiError> {
        self.wait_for_result_with(id, interval, |_| {}).await
    }

    /// Like [`JobClient::wait_for_result`], reporting every observed status.
    ///
    /// Transport failures are retried on the next tick; HTTP errors end the wait.
    pub async fn wait_for_result_with<F>(&self, id: &str, interval: Duration, mut on_status: F) -> Result<Value, ApiError>
    where
        F: FnMut(&Job),
    {
        loop {
            match self.get_job(id).await {
                Ok(job) => {
                    on_status(&job);
                    match job.status {
                        JobStatus::Finished => return self.get_job_result(id).await,
                        JobStatus::Failed => return Err(ApiError::JobFailed { id: id.to_string() }),
                        ref status => debug!(id, %status, "job still pending"),
                    }
                }
                Err(ApiError::Transport(error)) => warn!(id, %error, "job status poll failed; retrying"),
                Err(error) => return Err(error),
            }
            tokio::time::sleep(interval).await;
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "building request");
        self.http.request(method, url)
    }

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.send(self.request(Method::GET, path), path).await
    }

    async fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self.get(path).await?;
        decode(path, value)
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Value, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: extract_error_message(path, status.as_u16(), &body),
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|content_type| content_type.to_ascii_lowercase().contains("application/json"));
        let body = response.text().await?;
        if !is_json {
            return Ok(Value::String(body));
        }
        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })
}

/// Picks the service URL: environment first, then configuration, then the default.
pub fn resolve_base_url(configured: Option<&str>) -> String {
    env::var(API_BASE_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| configured.map(str::to_string).filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}

/// Checks that `base` is an absolute http(s) URL with a host and returns it
/// without surrounding whitespace or a trailing slash.
pub fn validate_base_url(base: &str) -> Result<String, ApiError> {
    let trimmed = base.trim().trim_end_matches('/');
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        url: base.to_string(),
        reason,
    };

    let parsed = Url::parse(trimmed).map_err(|error| invalid(error.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Builds `/jobs/{id}` with the id escaped as a single path segment.
pub fn job_path(id: &str) -> String {
    format!("/jobs/{}", utf8_percent_encode(id, PATH_SEGMENT))
}

/// Chooses the message shown for a failed request.
///
/// A JSON body's `detail` or `message` string wins, then the raw body, then
/// `"<path> <status>"` when the body is empty.
pub fn extract_error_message(path: &str, status: u16, body: &str) -> String {
    if body.trim().is_empty() {
        return format!("{path} {status}");
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        let field = ["detail", "message"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|value| match value {
                Value::String(text) if !text.is_empty() => Some(text.clone()),
                Value::Null | Value::Bool(false) => None,
                Value::String(_) => None,
                other => Some(other.to_string()),
            });
        if let Some(message) = field {
            return message;
        }
    }
    body.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_detail_then_message() {
        assert_eq!(extract_error_message("/jobs", 422, r#"{"detail":"orc ausente"}"#), "orc ausente");
        assert_eq!(extract_error_message("/jobs", 500, r#"{"message":"boom"}"#), "boom");
        assert_eq!(
            extract_error_message("/jobs", 500, r#"{"detail":"", "message":"fallback"}"#),
            "fallback"
        );
    }

    #[test]
    fn error_message_falls_back_to_body_then_status() {
        assert_eq!(extract_error_message("/jobs", 502, "Bad gateway"), "Bad gateway");
        assert_eq!(extract_error_message("/jobs", 500, r#"{"error":"x"}"#), r#"{"error":"x"}"#);
        assert_eq!(extract_error_message("/jobs/1", 404, ""), "/jobs/1 404");
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let body = r#"{"detail":[{"loc":["body","orc"],"msg":"field required"}]}"#;
        assert_eq!(
            extract_error_message("/jobs", 422, body),
            r#"[{"loc":["body","orc"],"msg":"field required"}]"#
        );
    }

    #[test]
    fn job_ids_are_escaped_like_uri_components() {
        assert_eq!(job_path("abc-123"), "/jobs/abc-123");
        assert_eq!(job_path("a/b c"), "/jobs/a%2Fb%20c");
        assert_eq!(job_path("x?y#z"), "/jobs/x%3Fy%23z");
    }

    #[test]
    fn base_url_validation() {
        assert_eq!(validate_base_url("http://intranet:8001/").unwrap(), "http://intranet:8001");
        assert_eq!(validate_base_url(" https://jobs.example.com ").unwrap(), "https://jobs.example.com");
        assert!(matches!(validate_base_url("ftp://host"), Err(ApiError::InvalidBaseUrl { .. })));
        assert!(matches!(validate_base_url("not a url"), Err(ApiError::InvalidBaseUrl { .. })));
    }
}
