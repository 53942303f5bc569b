use std::fmt;

/// Default base URL of the hosted agent API.
pub const DEFAULT_BASE_URL: &str = "https://odyssey.asteroid.ai/api/v1";

/// The browser-running agent workflows are created for.
pub const DEFAULT_AGENT_NAME: &str = "ceres";

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

const ENV_API_KEY: &str = "ASTEROID_API_KEY";
const ENV_BASE_URL: &str = "ASTEROID_BASE_URL";
const ENV_AGENT: &str = "WAYFARER_AGENT";
const ENV_POLL_INTERVAL_MS: &str = "WAYFARER_POLL_INTERVAL_MS";
const ENV_MAX_ATTEMPTS: &str = "WAYFARER_MAX_ATTEMPTS";

/// Errors that can occur while building client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// No API key was provided, or it was empty.
  #[error("missing API key: set ASTEROID_API_KEY")]
  MissingApiKey,

  /// A configuration value could not be parsed.
  #[error("invalid value for {name}: {message}")]
  InvalidValue { name: String, message: String },
}

/// A non-empty API key.
///
/// The key is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
  /// Wrap a key, rejecting empty or whitespace-only strings.
  pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
    let key = key.into();
    if key.trim().is_empty() {
      return Err(ConfigError::MissingApiKey);
    }
    Ok(Self(key))
  }

  /// The raw key, for use in request headers.
  pub fn expose(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for ApiKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("ApiKey(***)")
  }
}

/// Configuration for a wayfarer client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  pub api_key: ApiKey,

  /// Base URL of the agent API, without a trailing slash.
  pub base_url: String,

  /// Agent that workflows are created for.
  pub agent_name: String,

  /// Fixed interval between status queries.
  pub poll_interval_ms: u64,

  /// Give up after this many status queries. `None` polls until a terminal
  /// state is observed.
  pub max_attempts: Option<u32>,

  /// Per-request timeout for calls to the service.
  pub request_timeout_ms: u64,
}

impl ClientConfig {
  /// Create a configuration with defaults for everything but the key.
  pub fn new(api_key: ApiKey) -> Self {
    Self {
      api_key,
      base_url: DEFAULT_BASE_URL.to_string(),
      agent_name: DEFAULT_AGENT_NAME.to_string(),
      poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
      max_attempts: None,
      request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
    }
  }

  /// Read configuration from the process environment.
  ///
  /// An unset `ASTEROID_API_KEY` is treated as the empty string and rejected.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// Build configuration from an arbitrary variable lookup.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let api_key = ApiKey::new(lookup(ENV_API_KEY).unwrap_or_default())?;
    let mut config = Self::new(api_key);

    if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
      config.base_url = base_url.trim_end_matches('/').to_string();
    }

    if let Some(agent) = lookup(ENV_AGENT).filter(|v| !v.trim().is_empty()) {
      config.agent_name = agent;
    }

    if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
      config.poll_interval_ms = parse_number(ENV_POLL_INTERVAL_MS, &raw)?;
    }

    if let Some(raw) = lookup(ENV_MAX_ATTEMPTS) {
      let attempts: u32 = parse_number(ENV_MAX_ATTEMPTS, &raw)?;
      if attempts == 0 {
        return Err(ConfigError::InvalidValue {
          name: ENV_MAX_ATTEMPTS.to_string(),
          message: "must be at least 1".to_string(),
        });
      }
      config.max_attempts = Some(attempts);
    }

    Ok(config)
  }
}

fn parse_number<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
  T: std::str::FromStr,
  T::Err: fmt::Display,
{
  raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
    name: name.to_string(),
    message: e.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    move |name: &str| vars.get(name).cloned()
  }

  #[test]
  fn test_missing_api_key_is_config_error() {
    let result = ClientConfig::from_lookup(lookup_from(&[]));
    assert!(matches!(result, Err(ConfigError::MissingApiKey)));
  }

  #[test]
  fn test_empty_api_key_is_config_error() {
    let result = ClientConfig::from_lookup(lookup_from(&[(ENV_API_KEY, "  ")]));
    assert!(matches!(result, Err(ConfigError::MissingApiKey)));
  }

  #[test]
  fn test_defaults_applied() {
    let config = ClientConfig::from_lookup(lookup_from(&[(ENV_API_KEY, "key-123")])).unwrap();

    assert_eq!(config.api_key.expose(), "key-123");
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.agent_name, "ceres");
    assert_eq!(config.poll_interval_ms, 1000);
    assert_eq!(config.max_attempts, None);
  }

  #[test]
  fn test_overrides_applied() {
    let config = ClientConfig::from_lookup(lookup_from(&[
      (ENV_API_KEY, "key-123"),
      (ENV_BASE_URL, "http://localhost:8080/api/"),
      (ENV_AGENT, "vesta"),
      (ENV_POLL_INTERVAL_MS, "250"),
      (ENV_MAX_ATTEMPTS, "12"),
    ]))
    .unwrap();

    assert_eq!(config.base_url, "http://localhost:8080/api");
    assert_eq!(config.agent_name, "vesta");
    assert_eq!(config.poll_interval_ms, 250);
    assert_eq!(config.max_attempts, Some(12));
  }

  #[test]
  fn test_invalid_number_reports_variable() {
    let result = ClientConfig::from_lookup(lookup_from(&[
      (ENV_API_KEY, "key-123"),
      (ENV_POLL_INTERVAL_MS, "soon"),
    ]));

    match result {
      Err(ConfigError::InvalidValue { name, .. }) => assert_eq!(name, ENV_POLL_INTERVAL_MS),
      other => panic!("expected InvalidValue, got {:?}", other),
    }
  }

  #[test]
  fn test_zero_max_attempts_rejected() {
    let result = ClientConfig::from_lookup(lookup_from(&[
      (ENV_API_KEY, "key-123"),
      (ENV_MAX_ATTEMPTS, "0"),
    ]));
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
  }

  #[test]
  fn test_api_key_debug_is_redacted() {
    let key = ApiKey::new("secret").unwrap();
    assert_eq!(format!("{:?}", key), "ApiKey(***)");
  }
}
