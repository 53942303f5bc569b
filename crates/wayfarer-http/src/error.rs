use thiserror::Error;

/// Errors that can occur while constructing an [`HttpAgentService`](crate::HttpAgentService).
#[derive(Debug, Error)]
pub enum BuildError {
  /// The base URL could not be parsed or cannot carry a path.
  #[error("invalid base url '{url}': {message}")]
  InvalidBaseUrl { url: String, message: String },

  /// The HTTP client could not be built.
  #[error("http client error: {0}")]
  Client(#[from] reqwest::Error),
}
