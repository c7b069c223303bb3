/// Ceiling on stored run samples when nothing else is configured.
pub const DEFAULT_SAMPLE_LIMIT: usize = 10_000;

const MAX_FAILURE_URLS: usize = 100;

/// Append-only buffer that silently refuses items once full.
///
/// Items are never evicted or trimmed after insertion.
#[derive(Debug, Clone)]
pub struct SampleBuffer<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> SampleBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
        }
    }

    /// Returns whether the item was stored.
    pub fn push(&mut self, item: T) -> bool {
        if self.items.len() >= self.capacity {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

/// Per-level capacities derived from one memory ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLimits {
    pub ceiling: usize,
    pub run_samples: usize,
    pub run_durations: usize,
    pub job_durations: usize,
    pub step_durations: usize,
    pub failure_urls: usize,
}

impl SampleLimits {
    pub fn from_ceiling(ceiling: usize) -> Self {
        let ceiling = ceiling.max(1);
        Self {
            ceiling,
            run_samples: ceiling,
            run_durations: ceiling,
            job_durations: (ceiling / 10).max(1),
            step_durations: (ceiling / 50).max(1),
            failure_urls: MAX_FAILURE_URLS,
        }
    }
}

impl Default for SampleLimits {
    fn default() -> Self {
        Self::from_ceiling(DEFAULT_SAMPLE_LIMIT)
    }
}

/// Snapshot of how much each reducer is currently holding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SampleUsage {
    pub ceiling: usize,
    pub run_samples: usize,
    pub run_durations: usize,
    pub job_groups: usize,
    pub job_durations: usize,
    pub step_groups: usize,
    pub step_durations: usize,
    pub failure_urls: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_items_beyond_capacity() {
        let mut buf = SampleBuffer::new(2);
        assert!(buf.push(1));
        assert!(buf.push(2));
        assert!(!buf.push(3));
        assert_eq!(buf.as_slice(), &[1, 2]);
        assert!(buf.is_full());
    }

    #[test]
    fn small_ceilings_keep_every_level_usable() {
        let limits = SampleLimits::from_ceiling(5);
        assert_eq!(limits.job_durations, 1);
        assert_eq!(limits.step_durations, 1);
        assert_eq!(SampleLimits::from_ceiling(0).run_samples, 1);

        let limits = SampleLimits::default();
        assert_eq!(limits.job_durations, 1_000);
        assert_eq!(limits.step_durations, 200);
        assert_eq!(limits.failure_urls, 100);
    }
}
