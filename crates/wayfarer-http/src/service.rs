use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, header};
use tracing::debug;
use url::Url;
use wayfarer_client::{AgentService, RunStatus, ServiceError, ServiceErrorKind};
use wayfarer_config::{ApiKey, ClientConfig, WorkflowDefinition};

use crate::error::BuildError;
use crate::response::{error_message, extract_id, extract_result, extract_status};

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-Asteroid-Agents-Api-Key";

/// [`AgentService`] backed by the hosted REST API.
#[derive(Debug, Clone)]
pub struct HttpAgentService {
  client: Client,
  base_url: Url,
  api_key: ApiKey,
}

impl HttpAgentService {
  /// Build a service from client configuration.
  pub fn new(config: &ClientConfig) -> Result<Self, BuildError> {
    Self::with_base_url(
      &config.base_url,
      config.api_key.clone(),
      Duration::from_millis(config.request_timeout_ms),
    )
  }

  /// Build a service for an explicit base URL.
  pub fn with_base_url(
    base_url: &str,
    api_key: ApiKey,
    timeout: Duration,
  ) -> Result<Self, BuildError> {
    let base_url = Url::parse(base_url).map_err(|e| BuildError::InvalidBaseUrl {
      url: base_url.to_string(),
      message: e.to_string(),
    })?;

    if base_url.cannot_be_a_base() {
      return Err(BuildError::InvalidBaseUrl {
        url: base_url.to_string(),
        message: "url cannot carry a path".to_string(),
      });
    }

    let client = Client::builder().timeout(timeout).build()?;

    Ok(Self {
      client,
      base_url,
      api_key,
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Append path segments to the base URL. Segments are percent-encoded.
  fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| ServiceError::new(ServiceErrorKind::Other, "base url cannot carry a path"))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  /// Send a request and return the decoded body of a 2xx response.
  ///
  /// Bodies that are not JSON come back as a JSON string.
  async fn send(
    &self,
    method: Method,
    url: Url,
    body: Option<&serde_json::Value>,
  ) -> Result<serde_json::Value, ServiceError> {
    debug!(method = %method, url = %url, "agent_api_request");

    let mut request = self
      .client
      .request(method, url.clone())
      .header(API_KEY_HEADER, self.api_key.expose())
      .header(header::ACCEPT, "application/json");

    if let Some(body) = body {
      request = request.json(body);
    }

    let response = request.send().await.map_err(request_error)?;
    let status = response.status();
    let text = response.text().await.map_err(request_error)?;

    debug!(url = %url, status = status.as_u16(), "agent_api_response");

    if !status.is_success() {
      return Err(status_error(status, &text));
    }

    if text.trim().is_empty() {
      return Ok(serde_json::Value::Null);
    }

    Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
  }
}

#[async_trait]
impl AgentService for HttpAgentService {
  async fn create_workflow(
    &self,
    agent_name: &str,
    definition: &WorkflowDefinition,
  ) -> Result<String, ServiceError> {
    let url = self.endpoint(&["workflow", agent_name, "create"])?;
    let body = serde_json::to_value(definition)
      .map_err(|e| ServiceError::new(ServiceErrorKind::Validation, e.to_string()))?;

    let response = self.send(Method::POST, url, Some(&body)).await?;
    extract_id(&response, &["id", "workflow_id"])
      .ok_or_else(|| decode_error("workflow id", &response))
  }

  async fn run_workflow(
    &self,
    workflow_id: &str,
    parameters: &serde_json::Value,
  ) -> Result<String, ServiceError> {
    let url = self.endpoint(&["workflow", workflow_id, "execute"])?;

    let response = self.send(Method::POST, url, Some(parameters)).await?;
    extract_id(&response, &["id", "execution_id", "run_id"])
      .ok_or_else(|| decode_error("run id", &response))
  }

  async fn get_run_status(&self, run_id: &str) -> Result<RunStatus, ServiceError> {
    let url = self.endpoint(&["execution", run_id, "status"])?;

    let response = self.send(Method::GET, url, None).await?;
    extract_status(&response).ok_or_else(|| decode_error("run status", &response))
  }

  async fn get_run_result(&self, run_id: &str) -> Result<serde_json::Value, ServiceError> {
    let url = self.endpoint(&["execution", run_id, "result"])?;

    let response = self.send(Method::GET, url, None).await?;
    Ok(extract_result(response))
  }
}

fn status_error(status: StatusCode, body: &str) -> ServiceError {
  let kind = match status {
    StatusCode::NOT_FOUND => ServiceErrorKind::NotFound,
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceErrorKind::Unauthorized,
    StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ServiceErrorKind::Validation,
    _ => ServiceErrorKind::Other,
  };
  let fallback = status.canonical_reason().unwrap_or("request failed");

  ServiceError::new(kind, error_message(body, fallback)).with_status(status.as_u16())
}

fn request_error(e: reqwest::Error) -> ServiceError {
  let kind = if e.is_decode() {
    ServiceErrorKind::Decode
  } else {
    ServiceErrorKind::Transport
  };
  ServiceError::new(kind, e.to_string())
}

fn decode_error(expected: &str, body: &serde_json::Value) -> ServiceError {
  ServiceError::new(
    ServiceErrorKind::Decode,
    format!("expected {} in response, got {}", expected, body),
  )
}
