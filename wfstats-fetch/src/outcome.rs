use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{FetchError, FetchErrorKind};

/// Everything an orchestrator gathered, plus the single error worth reporting.
#[derive(Debug, Clone)]
pub struct Partial<T> {
    pub items: Vec<T>,
    pub error: Option<FetchError>,
}

impl<T> Default for Partial<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            error: None,
        }
    }
}

impl<T> Partial<T> {
    pub fn new(items: Vec<T>, errors: Vec<FetchError>) -> Self {
        Self {
            items,
            error: pick_error(errors),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.error.as_ref().is_some_and(FetchError::is_rate_limit)
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Keeps gathered items; fails only when nothing was gathered and the
    /// error is not a rate limit.
    pub fn settle(self) -> Result<Self, FetchError> {
        match self.error {
            Some(ref e) if self.items.is_empty() && !e.is_rate_limit() => Err(e.clone()),
            _ => Ok(self),
        }
    }
}

/// Rate limits first, then cancellation, then the earliest other error.
pub fn pick_error(errors: Vec<FetchError>) -> Option<FetchError> {
    let rank = |e: &FetchError| match e.kind() {
        FetchErrorKind::RateLimit => 0,
        FetchErrorKind::Cancelled => 1,
        _ => 2,
    };
    let mut best: Option<FetchError> = None;
    for e in errors {
        if best.as_ref().map_or(true, |b| rank(&e) < rank(b)) {
            best = Some(e);
        }
    }
    best
}

/// Runs `fut` unless `cancel` fires first.
pub(crate) async fn until_cancelled<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        r = fut => r,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RateLimitError;

    fn rate_limited() -> FetchError {
        FetchError::RateLimited(RateLimitError {
            limit: 5000,
            remaining: 0,
            reset_at: chrono::Utc::now(),
            retry_after: std::time::Duration::from_secs(60),
            resource: "core".into(),
            operation: "list_runs".into(),
        })
    }

    #[test]
    fn rate_limit_wins_over_earlier_errors() {
        let picked = pick_error(vec![
            FetchError::Timeout,
            FetchError::Cancelled,
            rate_limited(),
            FetchError::Network("reset".into()),
        ]);
        assert!(picked.is_some_and(|e| e.is_rate_limit()));
    }

    #[test]
    fn first_plain_error_is_kept() {
        let picked = pick_error(vec![FetchError::Timeout, FetchError::Network("x".into())]);
        assert!(matches!(picked, Some(FetchError::Timeout)));
        assert!(pick_error(Vec::new()).is_none());
    }

    #[test]
    fn settle_fails_only_when_empty() {
        let empty: Partial<u8> = Partial::new(vec![], vec![FetchError::Timeout]);
        assert!(empty.settle().is_err());

        let limited: Partial<u8> = Partial::new(vec![], vec![rate_limited()]);
        assert!(limited.settle().is_ok_and(|p| p.is_rate_limited()));

        let some = Partial::new(vec![1u8], vec![FetchError::Timeout]);
        assert!(some.settle().is_ok());
    }
}
