use thiserror::Error;

/// Errors surfaced by remote-platform adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// The platform rejected the caller's credentials (HTTP 401).
    #[error("not authenticated")]
    Unauthenticated,

    #[error("not found")]
    NotFound,

    /// The platform refused the operation in its current state, e.g. a
    /// resubmission for an already-graded question (HTTP 409).
    #[error("conflict")]
    Conflict,

    #[error("request failed with status {0}")]
    Status(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("malformed response: {0}")]
    Decode(String),
}
