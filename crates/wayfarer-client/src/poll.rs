use std::time::Duration;

use wayfarer_config::{ClientConfig, DEFAULT_POLL_INTERVAL_MS};

/// How a run is polled.
///
/// The interval is fixed; there is no backoff. Without `max_attempts` the loop
/// only ends on a terminal status, a fatal error, or cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
  pub interval: Duration,
  pub max_attempts: Option<u32>,
}

impl PollOptions {
  pub fn new(interval: Duration) -> Self {
    Self {
      interval,
      max_attempts: None,
    }
  }

  /// Stop after `attempts` status queries. A limit of 0 sends none.
  pub fn with_max_attempts(mut self, attempts: u32) -> Self {
    self.max_attempts = Some(attempts);
    self
  }

  pub fn from_config(config: &ClientConfig) -> Self {
    Self {
      interval: Duration::from_millis(config.poll_interval_ms),
      max_attempts: config.max_attempts,
    }
  }

  pub(crate) fn exhausted(&self, attempts: u32) -> bool {
    self.max_attempts.is_some_and(|max| attempts >= max)
  }
}

impl Default for PollOptions {
  fn default() -> Self {
    Self::new(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS))
  }
}
