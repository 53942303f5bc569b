//! Poll loop and run lifecycle tests against a scripted in-memory service.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use wayfarer_client::{
  AgentService, ClientError, PollOptions, ResultFetchError, RunHandle, RunStatus, ServiceError,
  ServiceErrorKind, StatusQueryError, WorkflowHandle, WorkflowRunClient,
};
use wayfarer_config::{Provider, WorkflowDefinition};

type StatusReply = Result<RunStatus, ServiceError>;

/// Replays a fixed sequence of status replies and counts every call.
#[derive(Default)]
struct ScriptedService {
  statuses: Mutex<VecDeque<StatusReply>>,
  result: Option<serde_json::Value>,
  create_error: Option<ServiceError>,
  cancel_on_status_call: Option<(usize, CancellationToken)>,
  created: Mutex<Vec<(String, WorkflowDefinition)>>,
  triggered: Mutex<Vec<(String, serde_json::Value)>>,
  status_calls: AtomicUsize,
  result_calls: AtomicUsize,
}

impl ScriptedService {
  fn with_statuses(statuses: Vec<StatusReply>) -> Self {
    Self {
      statuses: Mutex::new(statuses.into()),
      result: Some(serde_json::json!({"summary": "three posts summarised"})),
      ..Default::default()
    }
  }

  fn status_calls(&self) -> usize {
    self.status_calls.load(Ordering::SeqCst)
  }

  fn result_calls(&self) -> usize {
    self.result_calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl AgentService for ScriptedService {
  async fn create_workflow(
    &self,
    agent_name: &str,
    definition: &WorkflowDefinition,
  ) -> Result<String, ServiceError> {
    if let Some(err) = &self.create_error {
      return Err(err.clone());
    }
    let mut created = self.created.lock().unwrap();
    created.push((agent_name.to_string(), definition.clone()));
    Ok(format!("wf-{}", created.len()))
  }

  async fn run_workflow(
    &self,
    workflow_id: &str,
    parameters: &serde_json::Value,
  ) -> Result<String, ServiceError> {
    let mut triggered = self.triggered.lock().unwrap();
    triggered.push((workflow_id.to_string(), parameters.clone()));
    Ok(format!("run-{}", triggered.len()))
  }

  async fn get_run_status(&self, _run_id: &str) -> Result<RunStatus, ServiceError> {
    let call = self.status_calls.fetch_add(1, Ordering::SeqCst) + 1;
    let reply = self
      .statuses
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| Err(ServiceError::new(ServiceErrorKind::Other, "script exhausted")));

    if let Some((at, cancel)) = &self.cancel_on_status_call
      && *at == call
    {
      cancel.cancel();
    }

    reply
  }

  async fn get_run_result(&self, run_id: &str) -> Result<serde_json::Value, ServiceError> {
    self.result_calls.fetch_add(1, Ordering::SeqCst);
    self
      .result
      .clone()
      .ok_or_else(|| ServiceError::not_found(format!("no result for {}", run_id)))
  }
}

fn definition() -> WorkflowDefinition {
  WorkflowDefinition::new("Reddit Summariser", Provider::Anthropic)
    .with_field("start_url", "https://www.google.com")
    .with_prompt("Go to reddit, find a post and summarize it")
}

fn not_found() -> StatusReply {
  Err(ServiceError::not_found("run not found"))
}

fn fatal() -> StatusReply {
  Err(ServiceError::new(ServiceErrorKind::Other, "internal error").with_status(500))
}

#[tokio::test(start_paused = true)]
async fn test_create_then_trigger_yields_pollable_run() {
  let service = Arc::new(ScriptedService::with_statuses(vec![Ok(RunStatus::Completed)]));
  let client = WorkflowRunClient::new(service.clone(), "ceres");

  let workflow = client.create_workflow(&definition()).await.unwrap();
  assert_eq!(workflow.id(), "wf-1");

  let mut run = client
    .trigger_run(&workflow, serde_json::json!({"name": "Alice"}))
    .await
    .unwrap();
  assert_eq!(run.id(), "run-1");
  assert_eq!(run.workflow_id(), Some("wf-1"));

  let status = client
    .await_completion(&mut run, &PollOptions::default(), &CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(status, RunStatus::Completed);

  let created = client.service().created.lock().unwrap();
  assert_eq!(created[0].0, client.agent_name());
  assert_eq!(created[0].0, "ceres");
  assert_eq!(created[0].1, definition());

  let triggered = service.triggered.lock().unwrap();
  assert_eq!(triggered[0].0, "wf-1");
  assert_eq!(triggered[0].1["name"], "Alice");
}

#[tokio::test(start_paused = true)]
async fn test_not_found_is_absorbed_until_completed() {
  let service = Arc::new(ScriptedService::with_statuses(vec![
    not_found(),
    not_found(),
    Ok(RunStatus::Pending),
    Ok(RunStatus::Running),
    Ok(RunStatus::Completed),
  ]));
  let client = WorkflowRunClient::new(service.clone(), "ceres");
  let mut run = RunHandle::new("run-1");

  let status = client
    .await_completion(&mut run, &PollOptions::default(), &CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(status, RunStatus::Completed);
  assert_eq!(service.status_calls(), 5);
  assert_eq!(service.result_calls(), 0);
  assert_eq!(run.last_status(), Some(&RunStatus::Completed));
}

#[tokio::test(start_paused = true)]
async fn test_fatal_query_error_stops_polling() {
  let service = Arc::new(ScriptedService::with_statuses(vec![
    Ok(RunStatus::Pending),
    fatal(),
    Ok(RunStatus::Completed),
  ]));
  let client = WorkflowRunClient::new(service.clone(), "ceres");
  let mut run = RunHandle::new("run-1");

  let err = client
    .await_completion(&mut run, &PollOptions::default(), &CancellationToken::new())
    .await
    .unwrap_err();

  match &err {
    ClientError::StatusQuery(StatusQueryError::Other {
      last_status,
      source,
      ..
    }) => {
      assert_eq!(last_status, &Some(RunStatus::Pending));
      assert_eq!(source.status, Some(500));
    }
    other => panic!("expected fatal status query error, got {:?}", other),
  }
  assert_eq!(service.status_calls(), 2);
  assert_eq!(service.result_calls(), 0);
  assert_eq!(run.last_status(), Some(&RunStatus::Pending));
}

#[tokio::test(start_paused = true)]
async fn test_failed_is_terminal() {
  let service = Arc::new(ScriptedService::with_statuses(vec![
    Ok(RunStatus::Running),
    Ok(RunStatus::Failed),
  ]));
  let client = WorkflowRunClient::new(service.clone(), "ceres");
  let mut run = RunHandle::new("run-1");

  let status = client
    .await_completion(&mut run, &PollOptions::default(), &CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(status, RunStatus::Failed);
  assert_eq!(service.status_calls(), 2);

  let err = client.fetch_result(&run).await.unwrap_err();
  assert!(matches!(
    err,
    ClientError::ResultFetch(ResultFetchError::NotCompleted {
      status: Some(RunStatus::Failed),
      ..
    })
  ));
  assert_eq!(service.result_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_result_while_pending_fails() {
  let service = Arc::new(ScriptedService::with_statuses(vec![Ok(RunStatus::Pending)]));
  let client = WorkflowRunClient::new(service.clone(), "ceres");
  let mut run = RunHandle::new("run-1");
  let options = PollOptions::default().with_max_attempts(1);

  let err = client
    .await_completion(&mut run, &options, &CancellationToken::new())
    .await
    .unwrap_err();
  assert!(matches!(err, ClientError::AttemptsExhausted { attempts: 1, .. }));

  let err = client.fetch_result(&run).await.unwrap_err();
  assert!(matches!(
    err,
    ClientError::ResultFetch(ResultFetchError::NotCompleted {
      status: Some(RunStatus::Pending),
      ..
    })
  ));
  assert_eq!(service.result_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_result_after_completed_calls_service_once() {
  let service = Arc::new(ScriptedService::with_statuses(vec![Ok(RunStatus::Completed)]));
  let client = WorkflowRunClient::new(service.clone(), "ceres");
  let mut run = RunHandle::new("run-1");

  client
    .await_completion(&mut run, &PollOptions::default(), &CancellationToken::new())
    .await
    .unwrap();

  let result = client.fetch_result(&run).await.unwrap();
  assert_eq!(result.run_id, "run-1");
  assert_eq!(result.payload["summary"], "three posts summarised");
  assert_eq!(service.result_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_result_service_error_is_result_fetch_error() {
  let mut service = ScriptedService::with_statuses(vec![Ok(RunStatus::Completed)]);
  service.result = None;
  let service = Arc::new(service);
  let client = WorkflowRunClient::new(service.clone(), "ceres");
  let mut run = RunHandle::new("run-1");

  client
    .await_completion(&mut run, &PollOptions::default(), &CancellationToken::new())
    .await
    .unwrap();

  let err = client.fetch_result(&run).await.unwrap_err();
  assert!(matches!(
    err,
    ClientError::ResultFetch(ResultFetchError::Service { .. })
  ));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_between_polls_prevents_next_poll() {
  let cancel = CancellationToken::new();
  let mut service = ScriptedService::with_statuses(vec![
    Ok(RunStatus::Pending),
    Ok(RunStatus::Running),
    Ok(RunStatus::Completed),
  ]);
  service.cancel_on_status_call = Some((2, cancel.clone()));
  let service = Arc::new(service);
  let client = WorkflowRunClient::new(service.clone(), "ceres");
  let mut run = RunHandle::new("run-1");

  let err = client
    .await_completion(&mut run, &PollOptions::default(), &cancel)
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    ClientError::Cancelled {
      last_status: Some(RunStatus::Running),
      ..
    }
  ));
  assert_eq!(service.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_sleep() {
  let service = Arc::new(ScriptedService::with_statuses(vec![
    Ok(RunStatus::Pending),
    Ok(RunStatus::Completed),
  ]));
  let client = WorkflowRunClient::new(service.clone(), "ceres");
  let mut run = RunHandle::new("run-1");
  let options = PollOptions::new(Duration::from_secs(60));

  let cancel = CancellationToken::new();
  let canceller = cancel.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_secs(1)).await;
    canceller.cancel();
  });

  let err = client
    .await_completion(&mut run, &options, &cancel)
    .await
    .unwrap_err();

  assert!(matches!(err, ClientError::Cancelled { .. }));
  assert_eq!(service.status_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_max_attempts_counts_not_found() {
  let service = Arc::new(ScriptedService::with_statuses(vec![
    not_found(),
    not_found(),
    not_found(),
    Ok(RunStatus::Completed),
  ]));
  let client = WorkflowRunClient::new(service.clone(), "ceres");
  let mut run = RunHandle::new("run-1");
  let options = PollOptions::default().with_max_attempts(3);

  let err = client
    .await_completion(&mut run, &options, &CancellationToken::new())
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    ClientError::AttemptsExhausted {
      attempts: 3,
      last_status: None,
      ..
    }
  ));
  assert_eq!(service.status_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_zero_max_attempts_sends_no_query() {
  let service = Arc::new(ScriptedService::with_statuses(vec![Ok(RunStatus::Pending)]));
  let client = WorkflowRunClient::new(service.clone(), "ceres");
  let mut run = RunHandle::new("run-1");
  let options = PollOptions::default().with_max_attempts(0);

  let err = client
    .await_completion(&mut run, &options, &CancellationToken::new())
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    ClientError::AttemptsExhausted {
      attempts: 0,
      last_status: None,
      ..
    }
  ));
  assert_eq!(service.status_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_polls_at_fixed_interval() {
  let service = Arc::new(ScriptedService::with_statuses(vec![
    Ok(RunStatus::Pending),
    Ok(RunStatus::Running),
    Ok(RunStatus::Running),
    Ok(RunStatus::Completed),
  ]));
  let client = WorkflowRunClient::new(service.clone(), "ceres");
  let mut run = RunHandle::new("run-1");
  let options = PollOptions::new(Duration::from_millis(250));

  let started = tokio::time::Instant::now();
  client
    .await_completion(&mut run, &options, &CancellationToken::new())
    .await
    .unwrap();

  // Four queries, three waits, no wait after the terminal one.
  assert_eq!(started.elapsed(), Duration::from_millis(750));
}

#[tokio::test(start_paused = true)]
async fn test_run_to_completion_fetches_result() {
  let service = Arc::new(ScriptedService::with_statuses(vec![
    not_found(),
    Ok(RunStatus::Running),
    Ok(RunStatus::Completed),
  ]));
  let client = WorkflowRunClient::new(service.clone(), "ceres");

  let outcome = client
    .run_to_completion(
      &WorkflowHandle::new("wf-9"),
      serde_json::json!({}),
      &CancellationToken::new(),
    )
    .await
    .unwrap();

  assert_eq!(outcome.status, RunStatus::Completed);
  assert_eq!(
    outcome.result.map(|r| r.payload["summary"].clone()),
    Some(serde_json::json!("three posts summarised"))
  );
  assert_eq!(service.result_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_run_to_completion_failed_has_no_result() {
  let service = Arc::new(ScriptedService::with_statuses(vec![Ok(RunStatus::Failed)]));
  let client = WorkflowRunClient::new(service.clone(), "ceres");

  let outcome = client
    .run_to_completion(
      &WorkflowHandle::new("wf-9"),
      serde_json::json!({}),
      &CancellationToken::new(),
    )
    .await
    .unwrap();

  assert_eq!(outcome.status, RunStatus::Failed);
  assert!(outcome.result.is_none());
  assert_eq!(service.result_calls(), 0);
}

#[tokio::test]
async fn test_creation_failure_surfaces_service_error() {
  let service = ScriptedService {
    create_error: Some(
      ServiceError::new(ServiceErrorKind::Unauthorized, "invalid api key").with_status(401),
    ),
    ..Default::default()
  };
  let client = WorkflowRunClient::new(service, "ceres");

  let err = client.create_workflow(&definition()).await.unwrap_err();
  match err {
    ClientError::Creation {
      source: Some(source),
      ..
    } => assert_eq!(source.kind, ServiceErrorKind::Unauthorized),
    other => panic!("expected creation error, got {:?}", other),
  }
}

#[tokio::test(start_paused = true)]
async fn test_independent_runs_poll_concurrently() {
  let first = Arc::new(ScriptedService::with_statuses(vec![
    Ok(RunStatus::Pending),
    Ok(RunStatus::Completed),
  ]));
  let second = Arc::new(ScriptedService::with_statuses(vec![
    Ok(RunStatus::Running),
    Ok(RunStatus::Running),
    Ok(RunStatus::Failed),
  ]));
  let first_client = WorkflowRunClient::new(first.clone(), "ceres");
  let second_client = WorkflowRunClient::new(second.clone(), "ceres");
  let mut first_run = RunHandle::new("run-a");
  let mut second_run = RunHandle::new("run-b");
  let options = PollOptions::default();
  let cancel = CancellationToken::new();

  let (a, b) = tokio::join!(
    first_client.await_completion(&mut first_run, &options, &cancel),
    second_client.await_completion(&mut second_run, &options, &cancel),
  );

  assert_eq!(a.unwrap(), RunStatus::Completed);
  assert_eq!(b.unwrap(), RunStatus::Failed);
  assert_eq!(first.status_calls(), 2);
  assert_eq!(second.status_calls(), 3);
}
