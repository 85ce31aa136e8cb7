//! Error type for `globalcart-client`.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
  /// The request never got a response.
  #[error("Backend not reachable at {base_url}. Start server with: make dev")]
  Unreachable {
    base_url: String,
    #[source]
    source:   reqwest::Error,
  },

  /// The server answered with a non-2xx status.
  #[error("{message}")]
  Rejected { status: u16, message: String },

  #[error("unexpected response from {path}: {source}")]
  Decode {
    path:   String,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to build HTTP client: {0}")]
  Build(#[source] reqwest::Error),

  /// Rejected locally before any request was made.
  #[error(transparent)]
  Core(#[from] globalcart_core::Error),
}

impl RequestError {
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Rejected { status, .. } => Some(*status),
      Self::Core(e) => e.status(),
      _ => None,
    }
  }
}

impl From<RequestError> for globalcart_core::Error {
  fn from(e: RequestError) -> Self {
    match e {
      RequestError::Rejected { status, message } => Self::Rejected { status, detail: message },
      RequestError::Decode { source, .. } => Self::Serialization(source),
      RequestError::Core(e) => e,
      e @ (RequestError::Unreachable { .. } | RequestError::Build(_)) => {
        Self::Unreachable(e.to_string())
      }
    }
  }
}

/// The user-facing message for a failed response: the body's `detail`
/// (verbatim if a string, else as JSON), else the raw body, else the status.
pub fn rejection_message(status: u16, body: &str) -> String {
  let body = body.trim();
  if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
    match map.get("detail") {
      Some(Value::String(s)) if !s.is_empty() => return s.clone(),
      Some(Value::Null) | Some(Value::String(_)) | None => {}
      Some(other) => return other.to_string(),
    }
  }
  if body.is_empty() {
    format!("Request failed: {status}")
  } else {
    body.to_owned()
  }
}

pub type Result<T, E = RequestError> = std::result::Result<T, E>;
