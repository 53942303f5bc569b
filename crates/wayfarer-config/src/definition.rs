use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// LLM provider the agent uses to execute a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
  Openai,
  Anthropic,
}

/// A named, reusable task template submitted to an agent.
///
/// Definitions are immutable once submitted; the service returns an opaque
/// workflow id that is used to trigger runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
  /// Display name of the workflow.
  pub name: String,

  /// Named fields passed to the agent, e.g. `start_url`.
  #[serde(default)]
  pub fields: BTreeMap<String, String>,

  /// Ordered prompts the agent works through.
  pub prompts: Vec<String>,

  pub provider: Provider,
}

impl WorkflowDefinition {
  /// Create a definition with no fields or prompts.
  pub fn new(name: impl Into<String>, provider: Provider) -> Self {
    Self {
      name: name.into(),
      fields: BTreeMap::new(),
      prompts: Vec::new(),
      provider,
    }
  }

  /// Add a named field.
  pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.fields.insert(key.into(), value.into());
    self
  }

  /// Append a prompt.
  pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
    self.prompts.push(prompt.into());
    self
  }
}
