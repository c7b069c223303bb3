#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use wfstats_core::{
    FetchOptions, JobRecord, RunRecord, StepRecord, WorkflowConfig, WorkflowRef,
};
use wfstats_fetch::{FetchError, RateLimitError, RemoteClient, RunPage};

pub fn workflow() -> WorkflowConfig {
    WorkflowConfig {
        host: "github.com".to_string(),
        org: "octo".to_string(),
        repo: "hello".to_string(),
        workflow: WorkflowRef::FileName("ci.yaml".to_string()),
    }
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs)
}

pub fn run(id: u64, attempt: u32, conclusion: &str) -> RunRecord {
    RunRecord {
        id,
        name: Some("CI".to_string()),
        workflow_id: Some(1),
        status: "completed".to_string(),
        conclusion: Some(conclusion.to_string()),
        actor: Some("octocat".to_string()),
        run_attempt: attempt,
        event: Some("push".to_string()),
        head_branch: Some("main".to_string()),
        head_sha: None,
        html_url: format!("https://github.com/octo/hello/actions/runs/{id}"),
        jobs_url: None,
        logs_url: None,
        created_at: Some(at(0)),
        run_started_at: Some(at(0)),
        updated_at: Some(at(120)),
        completed_at: Some(at(120)),
    }
}

pub fn job(id: u64, run_id: u64, attempt: u32, name: &str, conclusion: &str) -> JobRecord {
    JobRecord {
        id,
        run_id,
        run_attempt: attempt,
        name: name.to_string(),
        status: "completed".to_string(),
        conclusion: Some(conclusion.to_string()),
        started_at: Some(at(0)),
        completed_at: Some(at(60)),
        html_url: format!("https://github.com/octo/hello/actions/runs/{run_id}/job/{id}"),
        steps: vec![StepRecord {
            name: "Run tests".to_string(),
            number: 1,
            status: "completed".to_string(),
            conclusion: Some(conclusion.to_string()),
            started_at: Some(at(0)),
            completed_at: Some(at(50)),
        }],
    }
}

pub fn rate_limited(operation: &str) -> FetchError {
    FetchError::RateLimited(RateLimitError {
        limit: 5000,
        remaining: 0,
        reset_at: at(3600),
        retry_after: Duration::from_secs(60),
        resource: "core".to_string(),
        operation: operation.to_string(),
    })
}

/// In-memory API. Missing attempts and jobs answer 404.
#[derive(Default)]
pub struct MockClient {
    pub pages: BTreeMap<u32, Result<Vec<RunRecord>, FetchError>>,
    pub attempts: BTreeMap<(u64, u32), Result<RunRecord, FetchError>>,
    pub jobs: BTreeMap<(u64, u32), Result<Vec<JobRecord>, FetchError>>,
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockClient {
    pub fn with_pages(pages: Vec<Result<Vec<RunRecord>, FetchError>>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .enumerate()
                .map(|(i, p)| (i as u32 + 1, p))
                .collect(),
            ..Self::default()
        }
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn peak(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, call: String) {
        self.calls.lock().unwrap().push(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteClient for MockClient {
    async fn list_runs(
        &self,
        _workflow: &WorkflowConfig,
        _options: &FetchOptions,
        page: u32,
        _per_page: u32,
    ) -> Result<RunPage, FetchError> {
        self.enter(format!("list_runs:{page}")).await;
        let last_page = self.pages.len() as u32;
        let runs = self
            .pages
            .get(&page)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))?;
        let total_count = self
            .pages
            .values()
            .map(|p| p.as_ref().map_or(0, Vec::len) as u64)
            .sum();
        Ok(RunPage {
            runs,
            total_count,
            first_page: page,
            last_page: last_page.max(page),
        })
    }

    async fn get_run_attempt(
        &self,
        _workflow: &WorkflowConfig,
        run_id: u64,
        attempt: u32,
        _exclude_pull_requests: bool,
    ) -> Result<RunRecord, FetchError> {
        self.enter(format!("get_run_attempt:{run_id}:{attempt}")).await;
        self.attempts
            .get(&(run_id, attempt))
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::NotFound {
                    resource: format!("runs/{run_id}/attempts/{attempt}"),
                })
            })
    }

    async fn list_jobs_for_attempt(
        &self,
        _workflow: &WorkflowConfig,
        run_id: u64,
        attempt: u32,
    ) -> Result<Vec<JobRecord>, FetchError> {
        self.enter(format!("list_jobs:{run_id}:{attempt}")).await;
        self.jobs
            .get(&(run_id, attempt))
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::NotFound {
                    resource: format!("runs/{run_id}/attempts/{attempt}/jobs"),
                })
            })
    }
}
