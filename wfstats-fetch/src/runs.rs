//! Paginated run acquisition with attempt resolution.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wfstats_core::{FetchOptions, RunRecord, WorkflowConfig};

use crate::client::{RemoteClient, RunPage};
use crate::error::FetchError;
use crate::limiter::{Limiter, LimiterPermit};
use crate::outcome::{until_cancelled, Partial};

type PageResult = (Vec<RunRecord>, Vec<FetchError>);

/// Fetches every run of a workflow, including earlier attempts of retried runs.
#[derive(Clone)]
pub struct RunFetcher {
    client: Arc<dyn RemoteClient>,
    limiter: Limiter,
    per_page: u32,
}

impl RunFetcher {
    pub fn new(client: Arc<dyn RemoteClient>, limiter: Limiter, per_page: u32) -> Self {
        Self {
            client,
            limiter,
            per_page,
        }
    }

    /// Fetches runs and keeps those matching `options.statuses`.
    pub async fn fetch(
        &self,
        workflow: &WorkflowConfig,
        options: &FetchOptions,
        cancel: &CancellationToken,
    ) -> Result<Partial<RunRecord>, FetchError> {
        let mut fetched = self.fetch_unfiltered(workflow, options, cancel).await?;
        filter_by_status(&mut fetched.items, &options.statuses);
        Ok(fetched)
    }

    /// Fetches runs and resolved attempts without applying the status filter.
    ///
    /// A rate limit anywhere stops further requests of this fetch; everything
    /// gathered so far is returned alongside it.
    pub async fn fetch_unfiltered(
        &self,
        workflow: &WorkflowConfig,
        options: &FetchOptions,
        cancel: &CancellationToken,
    ) -> Result<Partial<RunRecord>, FetchError> {
        let stop = cancel.child_token();

        let permit = self.limiter.acquire(cancel).await?;
        let first = until_cancelled(
            cancel,
            self.client.list_runs(workflow, options, 1, self.per_page),
        )
        .await;
        permit.release();

        let first = match first {
            Ok(page) => page,
            Err(e @ FetchError::RateLimited(_)) => {
                tracing::warn!(error = %e, "rate limited on first page of workflow runs");
                return Ok(Partial::new(Vec::new(), vec![e]));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch first page of workflow runs");
                return Err(e);
            }
        };
        let RunPage {
            runs,
            total_count,
            first_page,
            last_page,
        } = first;
        tracing::debug!(total_count, first_page, last_page, runs = runs.len(), "fetched first page");

        let (mut all, mut errors) = resolve_attempts(
            self.client.as_ref(),
            &self.limiter,
            workflow,
            runs,
            options.exclude_pull_requests,
            &stop,
            cancel,
        )
        .await;

        if options.all_pages && last_page > first_page {
            let handles = self.spawn_pages(workflow, options, first_page + 1..=last_page, &stop, cancel);
            collect_pages(handles, &mut all, &mut errors).await;
        }

        let partial = Partial::new(all, errors);
        match &partial.error {
            Some(e) if e.is_rate_limit() => {
                tracing::warn!(runs = partial.items.len(), error = %e, "returning partial workflow runs")
            }
            Some(e) => tracing::warn!(runs = partial.items.len(), error = %e, "some workflow run requests failed"),
            None => tracing::info!(runs = partial.items.len(), "fetched workflow runs"),
        }
        partial.settle()
    }

    fn spawn_pages(
        &self,
        workflow: &WorkflowConfig,
        options: &FetchOptions,
        pages: std::ops::RangeInclusive<u32>,
        stop: &CancellationToken,
        cancel: &CancellationToken,
    ) -> Vec<(u32, JoinHandle<PageResult>)> {
        let workflow = Arc::new(workflow.clone());
        let options = Arc::new(options.clone());

        pages
            .map(|page| {
                let fetcher = self.clone();
                let workflow = workflow.clone();
                let options = options.clone();
                let stop = stop.clone();
                let cancel = cancel.clone();
                let handle = tokio::spawn(async move {
                    fetcher.fetch_page(&workflow, &options, page, &stop, &cancel).await
                });
                (page, handle)
            })
            .collect()
    }

    async fn fetch_page(
        &self,
        workflow: &WorkflowConfig,
        options: &FetchOptions,
        page: u32,
        stop: &CancellationToken,
        cancel: &CancellationToken,
    ) -> PageResult {
        let permit = match acquire_unless_stopped(&self.limiter, stop, cancel).await {
            Ok(Some(permit)) => permit,
            Ok(None) => {
                tracing::debug!(page, "skipping page after rate limit");
                return (Vec::new(), Vec::new());
            }
            Err(e) => return (Vec::new(), vec![e]),
        };
        let listed = until_cancelled(
            cancel,
            self.client.list_runs(workflow, options, page, self.per_page),
        )
        .await;
        // attempts take their own slots; holding this one could starve them
        permit.release();

        match listed {
            Ok(listed) => {
                resolve_attempts(
                    self.client.as_ref(),
                    &self.limiter,
                    workflow,
                    listed.runs,
                    options.exclude_pull_requests,
                    stop,
                    cancel,
                )
                .await
            }
            Err(e) => {
                if e.is_rate_limit() {
                    stop.cancel();
                    tracing::warn!(page, error = %e, "rate limited while fetching workflow runs");
                } else {
                    tracing::error!(page, error = %e, "failed to fetch workflow runs page");
                }
                (Vec::new(), vec![e])
            }
        }
    }
}

/// Adds earlier attempts of every retried run to `runs`.
///
/// Each run's attempts come back in attempt order, followed by the latest
/// attempt that was already listed. Nothing is resolved when pull requests
/// are excluded.
pub async fn resolve_attempts(
    client: &dyn RemoteClient,
    limiter: &Limiter,
    workflow: &WorkflowConfig,
    runs: Vec<RunRecord>,
    exclude_pull_requests: bool,
    stop: &CancellationToken,
    cancel: &CancellationToken,
) -> PageResult {
    if exclude_pull_requests || runs.iter().all(|r| r.run_attempt <= 1) {
        return (runs, Vec::new());
    }

    let requests = runs.iter().flat_map(move |run| {
        (1..run.run_attempt).map(move |attempt| {
            fetch_attempt(client, limiter, workflow, run.id, attempt, stop, cancel)
        })
    });
    let mut fetched = join_all(requests).await.into_iter();

    let mut out = Vec::with_capacity(runs.len());
    let mut errors = Vec::new();
    for run in runs {
        for _ in 1..run.run_attempt {
            match fetched.next() {
                Some(Ok(Some(attempt))) => out.push(attempt),
                Some(Ok(None)) | None => {}
                Some(Err(e)) => errors.push(e),
            }
        }
        out.push(run);
    }
    (out, errors)
}

async fn fetch_attempt(
    client: &dyn RemoteClient,
    limiter: &Limiter,
    workflow: &WorkflowConfig,
    run_id: u64,
    attempt: u32,
    stop: &CancellationToken,
    cancel: &CancellationToken,
) -> Result<Option<RunRecord>, FetchError> {
    let Some(permit) = acquire_unless_stopped(limiter, stop, cancel).await? else {
        return Ok(None);
    };
    let result = until_cancelled(cancel, client.get_run_attempt(workflow, run_id, attempt, false)).await;
    drop(permit);

    match result {
        Ok(run) => Ok(Some(run)),
        Err(FetchError::NotFound { .. }) => {
            tracing::debug!(run_id, attempt, "workflow run attempt not found, skipping");
            Ok(None)
        }
        Err(e) => {
            if e.is_rate_limit() {
                stop.cancel();
                tracing::warn!(run_id, attempt, error = %e, "rate limited while resolving attempts");
            }
            Err(e)
        }
    }
}

/// `Ok(None)` when `stop` fired without the caller's token being cancelled.
async fn acquire_unless_stopped(
    limiter: &Limiter,
    stop: &CancellationToken,
    cancel: &CancellationToken,
) -> Result<Option<LimiterPermit>, FetchError> {
    match limiter.acquire(stop).await {
        Ok(permit) => Ok(Some(permit)),
        Err(_) if cancel.is_cancelled() => Err(FetchError::Cancelled),
        Err(_) => Ok(None),
    }
}

async fn collect_pages(
    handles: Vec<(u32, JoinHandle<PageResult>)>,
    runs: &mut Vec<RunRecord>,
    errors: &mut Vec<FetchError>,
) {
    for (page, handle) in handles {
        match handle.await {
            Ok((mut page_runs, mut page_errors)) => {
                tracing::debug!(page, runs = page_runs.len(), "page complete");
                runs.append(&mut page_runs);
                errors.append(&mut page_errors);
            }
            Err(e) => errors.push(FetchError::System(format!("page {page} task failed: {e}"))),
        }
    }
}

/// Keeps runs whose status or conclusion is listed. An empty list keeps all.
pub fn filter_by_status(runs: &mut Vec<RunRecord>, statuses: &[String]) {
    if statuses.is_empty() {
        return;
    }
    runs.retain(|r| r.matches_status(statuses));
}
