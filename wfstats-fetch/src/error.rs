use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use wfstats_core::ConfigError;

/// The remote API refused a request because a quota ran out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "rate limit exceeded for {resource} during {operation} ({remaining}/{limit} remaining, resets at {reset_at})"
)]
pub struct RateLimitError {
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
    pub retry_after: Duration,
    pub resource: String,
    pub operation: String,
}

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error(transparent)]
    RateLimited(#[from] RateLimitError),
    #[error("not found: {resource}")]
    NotFound { resource: String },
    #[error("api error {status} during {operation} on {resource}: {message}")]
    Api {
        status: u16,
        message: String,
        resource: String,
        operation: String,
        request_id: Option<String>,
    },
    #[error("connect/dns/tls error: {0}")]
    Network(String),
    #[error("timeout")]
    Timeout,
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("cancelled")]
    Cancelled,
    #[error("internal error: {0}")]
    System(String),
}

/// Coarse classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    RateLimit,
    NotFound,
    Transient,
    Cancelled,
    System,
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::RateLimited(_) => FetchErrorKind::RateLimit,
            FetchError::NotFound { .. } => FetchErrorKind::NotFound,
            FetchError::Api { .. }
            | FetchError::Network(_)
            | FetchError::Timeout
            | FetchError::Decode(_) => FetchErrorKind::Transient,
            FetchError::Cancelled => FetchErrorKind::Cancelled,
            FetchError::System(_) => FetchErrorKind::System,
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        self.kind() == FetchErrorKind::RateLimit
    }

    pub fn rate_limit(&self) -> Option<&RateLimitError> {
        match self {
            FetchError::RateLimited(rl) => Some(rl),
            _ => None,
        }
    }
}

/// Failure of a whole analysis.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
