use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use wfstats_core::{default_api_concurrency, default_fanout_concurrency};

use crate::error::FetchError;

/// Counting limiter on simultaneously outstanding work.
///
/// Slots are handed out as [`LimiterPermit`]s and come back when the permit
/// drops, so a slot can never be returned twice.
#[derive(Debug, Clone)]
pub struct Limiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl Limiter {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Conservative limiter for calls against the rate-limited API.
    pub fn for_api() -> Self {
        Self::new(default_api_concurrency())
    }

    pub fn for_fanout() -> Self {
        Self::new(default_fanout_concurrency())
    }

    /// Waits for a free slot, failing with [`FetchError::Cancelled`] once
    /// `cancel` fires. No slot is held after a failed acquire.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<LimiterPermit, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            permit = self.semaphore.clone().acquire_owned() => permit
                .map(|permit| LimiterPermit { _permit: permit })
                .map_err(|_| FetchError::Cancelled),
        }
    }

    pub fn try_acquire(&self) -> Option<LimiterPermit> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| LimiterPermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[derive(Debug)]
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
}

impl LimiterPermit {
    /// Same as dropping the permit.
    pub fn release(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let limiter = Limiter::new(0);
        assert_eq!(limiter.capacity(), 1);
        assert_eq!(limiter.available(), 1);
    }

    #[test]
    fn try_acquire_respects_capacity() {
        let limiter = Limiter::new(2);
        let a = limiter.try_acquire();
        let b = limiter.try_acquire();
        assert!(a.is_some() && b.is_some());
        assert!(limiter.try_acquire().is_none());
        assert_eq!(limiter.available(), 0);
        if let Some(a) = a {
            a.release();
        }
        assert_eq!(limiter.available(), 1);
    }
}
