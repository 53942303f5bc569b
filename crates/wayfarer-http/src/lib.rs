//! Wayfarer HTTP
//!
//! [`HttpAgentService`] implements [`wayfarer_client::AgentService`] against
//! the hosted agent REST API using `reqwest`. It translates HTTP failures into
//! tagged [`ServiceError`](wayfarer_client::ServiceError)s and carries no
//! retry or polling logic of its own.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | create    | `POST {base}/workflow/{agent}/create` |
//! | run       | `POST {base}/workflow/{workflow_id}/execute` |
//! | status    | `GET {base}/execution/{run_id}/status` |
//! | result    | `GET {base}/execution/{run_id}/result` |

mod error;
mod response;
mod service;

pub use error::BuildError;
pub use service::{API_KEY_HEADER, HttpAgentService};
