//! The remote service contract.

use std::sync::Arc;

use async_trait::async_trait;
use wayfarer_config::WorkflowDefinition;

use crate::error::ServiceError;
use crate::types::RunStatus;

/// A remote workflow agent service.
///
/// Implementations own the transport. They report failures as a tagged
/// [`ServiceError`] so the client can tell a transient "not found" apart from
/// everything else without inspecting concrete error types.
#[async_trait]
pub trait AgentService: Send + Sync {
  /// Submit a workflow definition for an agent. Returns the workflow id.
  async fn create_workflow(
    &self,
    agent_name: &str,
    definition: &WorkflowDefinition,
  ) -> Result<String, ServiceError>;

  /// Start a run of a workflow. Returns the run id.
  async fn run_workflow(
    &self,
    workflow_id: &str,
    parameters: &serde_json::Value,
  ) -> Result<String, ServiceError>;

  /// Query the current status of a run.
  async fn get_run_status(&self, run_id: &str) -> Result<RunStatus, ServiceError>;

  /// Fetch the output of a run.
  async fn get_run_result(&self, run_id: &str) -> Result<serde_json::Value, ServiceError>;
}

#[async_trait]
impl<S: AgentService + ?Sized> AgentService for Arc<S> {
  async fn create_workflow(
    &self,
    agent_name: &str,
    definition: &WorkflowDefinition,
  ) -> Result<String, ServiceError> {
    (**self).create_workflow(agent_name, definition).await
  }

  async fn run_workflow(
    &self,
    workflow_id: &str,
    parameters: &serde_json::Value,
  ) -> Result<String, ServiceError> {
    (**self).run_workflow(workflow_id, parameters).await
  }

  async fn get_run_status(&self, run_id: &str) -> Result<RunStatus, ServiceError> {
    (**self).get_run_status(run_id).await
  }

  async fn get_run_result(&self, run_id: &str) -> Result<serde_json::Value, ServiceError> {
    (**self).get_run_result(run_id).await
  }
}
