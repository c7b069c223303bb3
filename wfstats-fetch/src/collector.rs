use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use wfstats_core::reduce::{JobReducer, RunReducer, SampleLimits, SampleUsage};
use wfstats_core::{JobRecord, JobStats, RunRecord, RunStats};

use crate::error::FetchError;

#[derive(Debug)]
struct RunState {
    reducer: RunReducer,
    finished: Option<RunStats>,
}

#[derive(Debug)]
struct JobState {
    reducer: JobReducer,
    finished: Option<Vec<JobStats>>,
}

/// Shared streaming aggregator; run and job paths are locked separately.
#[derive(Clone)]
pub struct StatsCollector {
    limits: SampleLimits,
    runs: Arc<Mutex<RunState>>,
    jobs: Arc<Mutex<JobState>>,
}

impl StatsCollector {
    pub fn new(limits: SampleLimits) -> Self {
        Self {
            limits,
            runs: Arc::new(Mutex::new(RunState {
                reducer: RunReducer::new(limits),
                finished: None,
            })),
            jobs: Arc::new(Mutex::new(JobState {
                reducer: JobReducer::new(limits),
                finished: None,
            })),
        }
    }

    pub fn limits(&self) -> SampleLimits {
        self.limits
    }

    pub async fn record_run(&self, run: &RunRecord) {
        let mut state = self.runs.lock().await;
        state.reducer.record(run);
        state.finished = None;
    }

    pub async fn record_job(&self, job: &JobRecord) {
        let mut state = self.jobs.lock().await;
        state.reducer.record(job);
        state.finished = None;
    }

    /// Feeds whole slices, stopping with [`FetchError::Cancelled`] between
    /// records once `cancel` fires. Records already fed stay counted.
    pub async fn ingest_batch(
        &self,
        runs: &[RunRecord],
        jobs: &[JobRecord],
        cancel: &CancellationToken,
    ) -> Result<(), FetchError> {
        if !runs.is_empty() {
            let mut state = self.runs.lock().await;
            state.finished = None;
            for run in runs {
                if cancel.is_cancelled() {
                    return Err(FetchError::Cancelled);
                }
                state.reducer.record(run);
            }
        }
        if !jobs.is_empty() {
            let mut state = self.jobs.lock().await;
            state.finished = None;
            for job in jobs {
                if cancel.is_cancelled() {
                    return Err(FetchError::Cancelled);
                }
                state.reducer.record(job);
            }
        }
        tracing::debug!(runs = runs.len(), jobs = jobs.len(), "ingested batch");
        Ok(())
    }

    pub async fn run_stats(&self) -> RunStats {
        let mut state = self.runs.lock().await;
        if let Some(stats) = &state.finished {
            return stats.clone();
        }
        let stats = state.reducer.finish();
        state.finished = Some(stats.clone());
        stats
    }

    pub async fn job_stats(&self) -> Vec<JobStats> {
        let mut state = self.jobs.lock().await;
        if let Some(stats) = &state.finished {
            return stats.clone();
        }
        let stats = state.reducer.finish();
        state.finished = Some(stats.clone());
        stats
    }

    /// Finalizes both paths. Repeated calls return the same result.
    pub async fn finish(&self) -> (RunStats, Vec<JobStats>) {
        (self.run_stats().await, self.job_stats().await)
    }

    pub async fn usage(&self) -> SampleUsage {
        let mut usage = SampleUsage::default();
        self.runs.lock().await.reducer.fill_usage(&mut usage);
        self.jobs.lock().await.reducer.fill_usage(&mut usage);
        usage
    }
}
