//! Per-attempt job acquisition.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wfstats_core::{JobRecord, RunRecord, WorkflowConfig};

use crate::client::RemoteClient;
use crate::error::FetchError;
use crate::limiter::Limiter;
use crate::outcome::{until_cancelled, Partial};

/// Fetches the jobs of resolved run attempts, one bounded task per attempt.
#[derive(Clone)]
pub struct JobFetcher {
    client: Arc<dyn RemoteClient>,
    limiter: Limiter,
}

impl JobFetcher {
    pub fn new(client: Arc<dyn RemoteClient>, limiter: Limiter) -> Self {
        Self { client, limiter }
    }

    /// Every task runs to completion even after a rate limit; errors are
    /// reported together with whatever jobs were collected.
    pub async fn fetch(
        &self,
        workflow: &WorkflowConfig,
        runs: &[RunRecord],
        cancel: &CancellationToken,
    ) -> Result<Partial<JobRecord>, FetchError> {
        let attempts: BTreeSet<(u64, u32)> = runs.iter().map(|r| (r.id, r.run_attempt)).collect();
        if attempts.is_empty() {
            return Ok(Partial::default());
        }

        let handles = self.spawn_attempts(workflow, attempts, cancel);
        let mut jobs = Vec::new();
        let mut errors = Vec::new();
        for ((run_id, attempt), handle) in handles {
            match handle.await {
                Ok(Ok(mut found)) => jobs.append(&mut found),
                Ok(Err(e)) => {
                    if e.is_rate_limit() {
                        tracing::warn!(run_id, attempt, error = %e, "rate limited while fetching jobs");
                    } else {
                        tracing::error!(run_id, attempt, error = %e, "failed to fetch jobs");
                    }
                    errors.push(e);
                }
                Err(e) => errors.push(FetchError::System(format!(
                    "jobs task for run {run_id} attempt {attempt} failed: {e}"
                ))),
            }
        }

        tracing::info!(jobs = jobs.len(), failed = errors.len(), "fetched workflow jobs");
        Partial::new(jobs, errors).settle()
    }

    fn spawn_attempts(
        &self,
        workflow: &WorkflowConfig,
        attempts: BTreeSet<(u64, u32)>,
        cancel: &CancellationToken,
    ) -> Vec<((u64, u32), JoinHandle<Result<Vec<JobRecord>, FetchError>>)> {
        let workflow = Arc::new(workflow.clone());
        attempts
            .into_iter()
            .map(|(run_id, attempt)| {
                let client = self.client.clone();
                let limiter = self.limiter.clone();
                let workflow = workflow.clone();
                let cancel = cancel.clone();
                let handle = tokio::spawn(async move {
                    let permit = limiter.acquire(&cancel).await?;
                    let result = until_cancelled(
                        &cancel,
                        client.list_jobs_for_attempt(&workflow, run_id, attempt),
                    )
                    .await;
                    drop(permit);
                    match result {
                        Err(FetchError::NotFound { .. }) => {
                            tracing::debug!(run_id, attempt, "no jobs for run attempt, skipping");
                            Ok(Vec::new())
                        }
                        other => other,
                    }
                });
                ((run_id, attempt), handle)
            })
            .collect()
    }
}
