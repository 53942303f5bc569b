//! Wayfarer Client
//!
//! This crate drives a single workflow run on a remote agent service from
//! creation to result:
//!
//! ```text
//! create_workflow(definition) ──▶ WorkflowHandle
//!        trigger_run(handle)  ──▶ RunHandle
//!   await_completion(run)     ──▶ RunStatus   (fixed-interval poll loop)
//!       fetch_result(run)     ──▶ RunResult   (only after `completed`)
//! ```
//!
//! The remote service sits behind the [`AgentService`] trait. The client owns
//! the polling policy: transient "not found" responses are absorbed while the
//! run becomes visible, every other query error stops the loop.
//!
//! # Usage
//!
//! ```ignore
//! use wayfarer_client::{PollOptions, WorkflowRunClient};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = WorkflowRunClient::new(service, "ceres");
//! let workflow = client.create_workflow(&definition).await?;
//! let mut run = client.trigger_run(&workflow, serde_json::json!({"name": "Alice"})).await?;
//!
//! let cancel = CancellationToken::new();
//! let status = client.await_completion(&mut run, &PollOptions::default(), &cancel).await?;
//! let result = client.fetch_result(&run).await?;
//! ```

mod client;
mod error;
mod poll;
mod service;
mod types;

pub use client::WorkflowRunClient;
pub use error::{ClientError, ResultFetchError, ServiceError, ServiceErrorKind, StatusQueryError};
pub use poll::PollOptions;
pub use service::AgentService;
pub use types::{RunHandle, RunOutcome, RunResult, RunStatus, WorkflowHandle};
