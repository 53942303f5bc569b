//! Client and service error types.

use std::fmt;

use crate::types::RunStatus;

/// What went wrong on the service side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
  /// The addressed workflow or run does not exist (yet).
  NotFound,
  /// The API key was rejected.
  Unauthorized,
  /// The request was rejected as malformed.
  Validation,
  /// The request never produced a response (connect failure, timeout).
  Transport,
  /// The response could not be decoded.
  Decode,
  Other,
}

impl fmt::Display for ServiceErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::NotFound => "not found",
      Self::Unauthorized => "unauthorized",
      Self::Validation => "validation failed",
      Self::Transport => "transport error",
      Self::Decode => "decode error",
      Self::Other => "service error",
    };
    f.write_str(name)
  }
}

/// An error reported by an [`AgentService`](crate::AgentService).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
pub struct ServiceError {
  pub kind: ServiceErrorKind,
  /// HTTP status code, when the service answered.
  pub status: Option<u16>,
  pub message: String,
}

impl ServiceError {
  pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      status: None,
      message: message.into(),
    }
  }

  pub fn with_status(mut self, status: u16) -> Self {
    self.status = Some(status);
    self
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    Self::new(ServiceErrorKind::NotFound, message).with_status(404)
  }

  pub fn is_not_found(&self) -> bool {
    self.kind == ServiceErrorKind::NotFound
  }
}

/// A failed status query, classified by whether polling may continue.
#[derive(Debug, thiserror::Error)]
pub enum StatusQueryError {
  /// The run is not visible yet. Polling continues.
  #[error("run '{run_id}' not found, it may not have been created yet")]
  NotFoundTransient {
    run_id: String,
    #[source]
    source: ServiceError,
  },

  /// Any other failure. Polling stops.
  #[error("status query for run '{run_id}' failed (last status: {})", describe(.last_status))]
  Other {
    run_id: String,
    last_status: Option<RunStatus>,
    #[source]
    source: ServiceError,
  },
}

impl StatusQueryError {
  /// Sort a service error into the recoverable or fatal bucket.
  pub fn classify(run_id: &str, last_status: Option<RunStatus>, source: ServiceError) -> Self {
    if source.is_not_found() {
      Self::NotFoundTransient {
        run_id: run_id.to_string(),
        source,
      }
    } else {
      Self::Other {
        run_id: run_id.to_string(),
        last_status,
        source,
      }
    }
  }

  pub fn is_recoverable(&self) -> bool {
    matches!(self, Self::NotFoundTransient { .. })
  }
}

/// A result requested in the wrong state, or refused by the service.
#[derive(Debug, thiserror::Error)]
pub enum ResultFetchError {
  #[error("run '{run_id}' has not completed (last status: {})", describe(.status))]
  NotCompleted {
    run_id: String,
    status: Option<RunStatus>,
  },

  #[error("failed to fetch result for run '{run_id}'")]
  Service {
    run_id: String,
    #[source]
    source: ServiceError,
  },
}

/// Errors surfaced by [`WorkflowRunClient`](crate::WorkflowRunClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
  /// The workflow definition was rejected, locally or by the service.
  #[error("failed to create workflow '{name}': {message}")]
  Creation {
    name: String,
    message: String,
    #[source]
    source: Option<ServiceError>,
  },

  /// The run could not be started.
  #[error("failed to trigger workflow '{workflow_id}': {message}")]
  Trigger {
    workflow_id: String,
    message: String,
    #[source]
    source: Option<ServiceError>,
  },

  #[error(transparent)]
  StatusQuery(#[from] StatusQueryError),

  #[error(transparent)]
  ResultFetch(#[from] ResultFetchError),

  /// The caller cancelled polling.
  #[error("polling run '{run_id}' cancelled (last status: {})", describe(.last_status))]
  Cancelled {
    run_id: String,
    last_status: Option<RunStatus>,
  },

  /// The attempt limit was reached before a terminal state.
  #[error(
    "run '{run_id}' did not finish within {attempts} status queries (last status: {})",
    describe(.last_status)
  )]
  AttemptsExhausted {
    run_id: String,
    attempts: u32,
    last_status: Option<RunStatus>,
  },
}

impl ClientError {
  /// The last status observed before the error, for errors raised while
  /// polling.
  pub fn last_status(&self) -> Option<&RunStatus> {
    match self {
      Self::StatusQuery(StatusQueryError::Other { last_status, .. })
      | Self::Cancelled { last_status, .. }
      | Self::AttemptsExhausted { last_status, .. } => last_status.as_ref(),
      Self::ResultFetch(ResultFetchError::NotCompleted { status, .. }) => status.as_ref(),
      _ => None,
    }
  }
}

fn describe(status: &Option<RunStatus>) -> &str {
  status.as_ref().map_or("none", RunStatus::as_str)
}
