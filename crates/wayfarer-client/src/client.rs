//! The workflow run client.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use wayfarer_config::{ClientConfig, WorkflowDefinition};

use crate::error::{ClientError, ResultFetchError, StatusQueryError};
use crate::poll::PollOptions;
use crate::service::AgentService;
use crate::types::{RunHandle, RunOutcome, RunResult, RunStatus, WorkflowHandle};

/// Drives workflow runs against an [`AgentService`].
///
/// The client holds no per-run state. Each run's observed status lives in
/// its [`RunHandle`], so independent runs can be polled concurrently from
/// one client.
pub struct WorkflowRunClient<S> {
  service: S,
  agent_name: String,
  poll: PollOptions,
}

impl<S: AgentService> WorkflowRunClient<S> {
  /// Create a client that creates workflows for `agent_name`.
  pub fn new(service: S, agent_name: impl Into<String>) -> Self {
    Self {
      service,
      agent_name: agent_name.into(),
      poll: PollOptions::default(),
    }
  }

  /// Create a client using the agent and poll settings from `config`.
  pub fn from_config(service: S, config: &ClientConfig) -> Self {
    Self::new(service, config.agent_name.clone()).with_poll_options(PollOptions::from_config(config))
  }

  /// Set the poll options used by [`run_to_completion`](Self::run_to_completion).
  pub fn with_poll_options(mut self, poll: PollOptions) -> Self {
    self.poll = poll;
    self
  }

  pub fn agent_name(&self) -> &str {
    &self.agent_name
  }

  pub fn poll_options(&self) -> &PollOptions {
    &self.poll
  }

  pub fn service(&self) -> &S {
    &self.service
  }

  /// Submit a workflow definition.
  ///
  /// Definitions without a name or without any non-blank prompt are rejected
  /// before the service is contacted. Service failures are not retried.
  #[instrument(
    name = "create_workflow",
    skip(self, definition),
    fields(agent = %self.agent_name, workflow_name = %definition.name)
  )]
  pub async fn create_workflow(
    &self,
    definition: &WorkflowDefinition,
  ) -> Result<WorkflowHandle, ClientError> {
    validate_definition(definition)?;

    match self
      .service
      .create_workflow(&self.agent_name, definition)
      .await
    {
      Ok(workflow_id) => {
        info!(workflow_id = %workflow_id, "workflow_created");
        Ok(WorkflowHandle::new(workflow_id))
      }
      Err(e) => {
        error!(error = %e, "workflow_create_failed");
        Err(ClientError::Creation {
          name: definition.name.clone(),
          message: e.to_string(),
          source: Some(e),
        })
      }
    }
  }

  /// Start a run of a created workflow.
  ///
  /// `input` must be a JSON object of run parameters.
  #[instrument(name = "trigger_run", skip(self, workflow, input), fields(workflow_id = %workflow))]
  pub async fn trigger_run(
    &self,
    workflow: &WorkflowHandle,
    input: serde_json::Value,
  ) -> Result<RunHandle, ClientError> {
    if workflow.id().trim().is_empty() {
      return Err(ClientError::Trigger {
        workflow_id: String::new(),
        message: "workflow id is empty".to_string(),
        source: None,
      });
    }

    if !input.is_object() {
      return Err(ClientError::Trigger {
        workflow_id: workflow.id().to_string(),
        message: format!("run parameters must be a JSON object, got {}", input),
        source: None,
      });
    }

    match self.service.run_workflow(workflow.id(), &input).await {
      Ok(run_id) => {
        info!(run_id = %run_id, "run_triggered");
        Ok(RunHandle::triggered(run_id, workflow))
      }
      Err(e) => {
        error!(error = %e, "run_trigger_failed");
        Err(ClientError::Trigger {
          workflow_id: workflow.id().to_string(),
          message: e.to_string(),
          source: Some(e),
        })
      }
    }
  }

  /// Poll a run until it reaches `completed` or `failed`.
  ///
  /// The first query is issued immediately and `options.interval` elapses
  /// between queries. A "not found" answer is logged and polling continues;
  /// any other query error ends the loop. Cancelling `cancel` stops the loop
  /// at the next poll boundary without issuing another query.
  ///
  /// Every observed status is recorded on `run`.
  #[instrument(
    name = "await_completion",
    skip(self, run, options, cancel),
    fields(run_id = %run.id())
  )]
  pub async fn await_completion(
    &self,
    run: &mut RunHandle,
    options: &PollOptions,
    cancel: &CancellationToken,
  ) -> Result<RunStatus, ClientError> {
    if let Some(status) = run.last_status().filter(|s| s.is_terminal()) {
      debug!(status = %status, "run_already_terminal");
      return Ok(status.clone());
    }

    let mut attempts: u32 = 0;

    // A zero limit allows no queries at all.
    if options.exhausted(attempts) {
      return Err(self.exhausted(run, attempts));
    }

    loop {
      if cancel.is_cancelled() {
        return Err(self.cancelled(run));
      }

      attempts += 1;
      match self.service.get_run_status(run.id()).await {
        Ok(status) => {
          info!(attempt = attempts, status = %status, "run_status");
          run.observe(status.clone());

          if status.is_terminal() {
            return Ok(status);
          }
        }
        Err(e) => {
          match StatusQueryError::classify(run.id(), run.last_status().cloned(), e) {
            StatusQueryError::NotFoundTransient { source, .. } => {
              warn!(
                attempt = attempts,
                error = %source,
                "run not found, it may not have been created yet"
              );
            }
            fatal => {
              error!(attempt = attempts, error = %fatal, "run_status_failed");
              return Err(fatal.into());
            }
          }
        }
      }

      if options.exhausted(attempts) {
        return Err(self.exhausted(run, attempts));
      }

      tokio::select! {
        biased;
        _ = cancel.cancelled() => {
          return Err(self.cancelled(run));
        }
        _ = tokio::time::sleep(options.interval) => {}
      }
    }
  }

  /// Fetch the result of a run that has been observed `completed`.
  ///
  /// Fails without contacting the service if the poll loop has not seen
  /// `completed` on this handle.
  #[instrument(name = "fetch_result", skip(self, run), fields(run_id = %run.id()))]
  pub async fn fetch_result(&self, run: &RunHandle) -> Result<RunResult, ClientError> {
    if run.last_status() != Some(&RunStatus::Completed) {
      return Err(
        ResultFetchError::NotCompleted {
          run_id: run.id().to_string(),
          status: run.last_status().cloned(),
        }
        .into(),
      );
    }

    match self.service.get_run_result(run.id()).await {
      Ok(payload) => {
        info!("run_result_fetched");
        Ok(RunResult {
          run_id: run.id().to_string(),
          payload,
        })
      }
      Err(e) => {
        error!(error = %e, "run_result_failed");
        Err(
          ResultFetchError::Service {
            run_id: run.id().to_string(),
            source: e,
          }
          .into(),
        )
      }
    }
  }

  /// Trigger a run, wait for it and fetch its result.
  ///
  /// Uses the client's own poll options. A run that ends `failed` yields an
  /// outcome without a result.
  pub async fn run_to_completion(
    &self,
    workflow: &WorkflowHandle,
    input: serde_json::Value,
    cancel: &CancellationToken,
  ) -> Result<RunOutcome, ClientError> {
    let mut run = self.trigger_run(workflow, input).await?;
    let status = self.await_completion(&mut run, &self.poll, cancel).await?;

    let result = match status {
      RunStatus::Completed => Some(self.fetch_result(&run).await?),
      _ => None,
    };

    Ok(RunOutcome {
      run_id: run.id().to_string(),
      status,
      result,
    })
  }

  fn exhausted(&self, run: &RunHandle, attempts: u32) -> ClientError {
    warn!(run_id = %run.id(), attempts, "poll_attempts_exhausted");
    ClientError::AttemptsExhausted {
      run_id: run.id().to_string(),
      attempts,
      last_status: run.last_status().cloned(),
    }
  }

  fn cancelled(&self, run: &RunHandle) -> ClientError {
    info!(run_id = %run.id(), "run_polling_cancelled");
    ClientError::Cancelled {
      run_id: run.id().to_string(),
      last_status: run.last_status().cloned(),
    }
  }
}

fn validate_definition(definition: &WorkflowDefinition) -> Result<(), ClientError> {
  let reject = |message: &str| ClientError::Creation {
    name: definition.name.clone(),
    message: message.to_string(),
    source: None,
  };

  if definition.name.trim().is_empty() {
    return Err(reject("workflow name is empty"));
  }

  if !definition.prompts.iter().any(|p| !p.trim().is_empty()) {
    return Err(reject("workflow has no prompts"));
  }

  Ok(())
}
