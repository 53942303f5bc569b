//! Handles, statuses and results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of a run as reported by the remote service.
///
/// Values the client does not recognise are kept verbatim in
/// [`RunStatus::Unknown`] and treated as non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
  Pending,
  Running,
  Completed,
  Failed,
  Unknown(String),
}

impl RunStatus {
  /// Parse a status string as sent by the service.
  pub fn parse(raw: &str) -> Self {
    match raw.trim().to_ascii_lowercase().as_str() {
      "pending" => Self::Pending,
      "running" => Self::Running,
      "completed" => Self::Completed,
      "failed" => Self::Failed,
      _ => Self::Unknown(raw.to_string()),
    }
  }

  pub fn as_str(&self) -> &str {
    match self {
      Self::Pending => "pending",
      Self::Running => "running",
      Self::Completed => "completed",
      Self::Failed => "failed",
      Self::Unknown(raw) => raw,
    }
  }

  /// Whether polling stops at this status.
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Completed | Self::Failed)
  }
}

impl fmt::Display for RunStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl From<String> for RunStatus {
  fn from(raw: String) -> Self {
    Self::parse(&raw)
  }
}

impl From<RunStatus> for String {
  fn from(status: RunStatus) -> Self {
    status.as_str().to_string()
  }
}

/// Identifier of a created workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkflowHandle {
  workflow_id: String,
}

impl WorkflowHandle {
  pub fn new(workflow_id: impl Into<String>) -> Self {
    Self {
      workflow_id: workflow_id.into(),
    }
  }

  pub fn id(&self) -> &str {
    &self.workflow_id
  }
}

impl fmt::Display for WorkflowHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.workflow_id)
  }
}

/// Identifier of one run, plus the last status observed for it.
///
/// The observed status is only ever written by the poll loop. It gates
/// [`fetch_result`](crate::WorkflowRunClient::fetch_result).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
  run_id: String,
  workflow_id: Option<String>,
  last_status: Option<RunStatus>,
}

impl RunHandle {
  /// Wrap an existing run id, e.g. one read back from a log.
  pub fn new(run_id: impl Into<String>) -> Self {
    Self {
      run_id: run_id.into(),
      workflow_id: None,
      last_status: None,
    }
  }

  pub(crate) fn triggered(run_id: String, workflow: &WorkflowHandle) -> Self {
    Self {
      run_id,
      workflow_id: Some(workflow.id().to_string()),
      last_status: None,
    }
  }

  pub fn id(&self) -> &str {
    &self.run_id
  }

  /// The workflow this run was triggered from, when known.
  pub fn workflow_id(&self) -> Option<&str> {
    self.workflow_id.as_deref()
  }

  /// The most recent status the poll loop saw.
  pub fn last_status(&self) -> Option<&RunStatus> {
    self.last_status.as_ref()
  }

  pub(crate) fn observe(&mut self, status: RunStatus) {
    self.last_status = Some(status);
  }
}

impl fmt::Display for RunHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.run_id)
  }
}

/// Output of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
  pub run_id: String,
  /// Opaque payload; its shape is defined by the service.
  pub payload: serde_json::Value,
}

/// Everything known about a run that reached a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
  pub run_id: String,
  pub status: RunStatus,
  /// Present only when `status` is `completed`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result: Option<RunResult>,
}
