//! Wayfarer Config
//!
//! This crate contains the serializable types that describe what gets sent to
//! the remote workflow agent service, and the configuration a client needs to
//! talk to it.
//!
//! Workflow definitions can be loaded from:
//! - JSON files (via the CLI with `wayfarer create workflow.json`)
//! - The built-in example catalog ([`example_workflows`])
//!
//! Client configuration is always passed explicitly. [`ClientConfig::from_env`]
//! reads the process environment once; nothing in this crate holds global state.

mod catalog;
mod config;
mod definition;

pub use catalog::example_workflows;
pub use config::{
  ApiKey, ClientConfig, ConfigError, DEFAULT_AGENT_NAME, DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL_MS,
  DEFAULT_REQUEST_TIMEOUT_MS,
};
pub use definition::{Provider, WorkflowDefinition};
