use reqwest::StatusCode;
use thiserror::Error;

/// Failure reported by a remote service. Carried inside `anyhow::Error`;
/// callers that care about the status can `downcast_ref::<ApiError>()`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{method} {url} failed {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: StatusCode,
        body: String,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Status { status, .. } => *status,
        }
    }
}
