use std::collections::BTreeMap;

use crate::reduce::sample::{SampleBuffer, SampleLimits, SampleUsage};
use crate::statistics;
use crate::types::{Conclusion, ConclusionSummary, RunRecord, RunStats, RunSummary};

/// Incremental run-level reduction.
#[derive(Debug, Clone)]
pub struct RunReducer {
    limits: SampleLimits,
    name: Option<String>,
    total: usize,
    counts: BTreeMap<Conclusion, usize>,
    samples: BTreeMap<Conclusion, SampleBuffer<RunSummary>>,
    success_durations: SampleBuffer<f64>,
}

impl RunReducer {
    pub fn new(limits: SampleLimits) -> Self {
        Self {
            limits,
            name: None,
            total: 0,
            counts: crate::types::empty_counts(),
            samples: Conclusion::ALL
                .into_iter()
                .map(|c| (c, SampleBuffer::new(limits.run_samples)))
                .collect(),
            success_durations: SampleBuffer::new(limits.run_durations),
        }
    }

    pub fn record(&mut self, run: &RunRecord) {
        if self.name.is_none() {
            self.name = run.name.clone();
        }
        self.total += 1;

        let class = run.conclusion_class();
        *self.counts.entry(class).or_insert(0) += 1;
        if let Some(bucket) = self.samples.get_mut(&class) {
            if !bucket.is_full() {
                bucket.push(RunSummary::from(run));
            }
        }

        if class == Conclusion::Success && run.is_completed() {
            let duration = run.duration_seconds();
            if duration > 0.0 {
                self.success_durations.push(duration);
            }
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Computes the current statistics without consuming the reducer.
    pub fn finish(&self) -> RunStats {
        let mut stats = RunStats::empty();
        stats.total_count = self.total;
        stats.name = self.name.clone().unwrap_or_default();
        stats.rate = statistics::rates(&self.counts, self.total);
        stats.execution_stats = statistics::execution_stats(self.success_durations.as_slice());
        for class in Conclusion::ALL {
            stats.conclusions.insert(
                class,
                ConclusionSummary {
                    count: self.counts.get(&class).copied().unwrap_or(0),
                    runs: self
                        .samples
                        .get(&class)
                        .map(|b| b.as_slice().to_vec())
                        .unwrap_or_default(),
                },
            );
        }
        stats
    }

    pub fn fill_usage(&self, usage: &mut SampleUsage) {
        usage.ceiling = self.limits.ceiling;
        usage.run_samples = self.samples.values().map(SampleBuffer::len).sum();
        usage.run_durations = self.success_durations.len();
    }
}

impl Default for RunReducer {
    fn default() -> Self {
        Self::new(SampleLimits::default())
    }
}
