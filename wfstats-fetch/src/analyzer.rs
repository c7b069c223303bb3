use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use wfstats_core::reduce::{SampleLimits, SampleUsage};
use wfstats_core::{AnalysisConfig, JobStats, RunStats};

use crate::client::RemoteClient;
use crate::collector::StatsCollector;
use crate::error::{AnalyzeError, FetchError, FetchErrorKind};
use crate::jobs::JobFetcher;
use crate::limiter::Limiter;
use crate::runs::{filter_by_status, RunFetcher};

#[derive(Debug, Clone, serde::Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    /// Runs and attempts fetched before the status filter.
    pub total_fetched: usize,
    pub total_filtered: usize,
    pub rate_limited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_reset_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub sample_usage: SampleUsage,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct WorkflowReport {
    pub run_stats: RunStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub job_stats: Vec<JobStats>,
    pub metadata: ReportMetadata,
}

impl WorkflowReport {
    pub fn is_partial(&self) -> bool {
        self.metadata.rate_limited
    }
}

/// Wires the orchestrators and the aggregator into one analysis pass.
pub struct Analyzer {
    client: Arc<dyn RemoteClient>,
}

impl Analyzer {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self { client }
    }

    pub async fn analyze(
        &self,
        config: &AnalysisConfig,
        cancel: &CancellationToken,
    ) -> Result<WorkflowReport, AnalyzeError> {
        config.validate()?;

        let limiter = Limiter::new(config.limits.api_concurrency);
        let collector = StatsCollector::new(SampleLimits::from_ceiling(config.limits.sample_limit));
        let mut notes = Notes::default();

        let fetched = RunFetcher::new(self.client.clone(), limiter.clone(), config.limits.per_page)
            .fetch_unfiltered(&config.workflow, &config.options, cancel)
            .await?;
        let total_fetched = fetched.items.len();
        notes.absorb(fetched.error)?;

        let mut runs = fetched.items;
        filter_by_status(&mut runs, &config.options.statuses);
        let total_filtered = runs.len();
        tracing::info!(total_fetched, total_filtered, "workflow runs ready");

        let jobs = if config.include_jobs && !runs.is_empty() {
            let fetched = JobFetcher::new(self.client.clone(), limiter)
                .fetch(&config.workflow, &runs, cancel)
                .await?;
            notes.absorb(fetched.error)?;
            fetched.items
        } else {
            Vec::new()
        };

        collector.ingest_batch(&runs, &jobs, cancel).await?;
        let (run_stats, job_stats) = collector.finish().await;

        Ok(WorkflowReport {
            run_stats,
            job_stats,
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                total_fetched,
                total_filtered,
                rate_limited: notes.reset_at.is_some(),
                rate_limit_reset_at: notes.reset_at,
                warnings: notes.warnings,
                sample_usage: collector.usage().await,
            },
        })
    }
}

#[derive(Default)]
struct Notes {
    reset_at: Option<DateTime<Utc>>,
    warnings: Vec<String>,
}

impl Notes {
    /// Turns a partial-result error into report flags. Cancellation aborts.
    fn absorb(&mut self, error: Option<FetchError>) -> Result<(), FetchError> {
        let Some(error) = error else {
            return Ok(());
        };
        match error.kind() {
            FetchErrorKind::RateLimit => {
                tracing::warn!(error = %error, "results are partial due to rate limiting");
                let reset_at = error.rate_limit().map(|rl| rl.reset_at);
                self.reset_at = self.reset_at.max(reset_at);
            }
            FetchErrorKind::Cancelled => return Err(error),
            FetchErrorKind::NotFound | FetchErrorKind::Transient | FetchErrorKind::System => {
                tracing::warn!(error = %error, "continuing with partial results");
                self.warnings.push(error.to_string());
            }
        }
        Ok(())
    }
}
