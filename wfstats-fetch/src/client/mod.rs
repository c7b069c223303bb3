//! The remote API contract and its GitHub REST implementation.

mod github;
pub mod ratelimit;

use async_trait::async_trait;
use wfstats_core::{FetchOptions, JobRecord, RunRecord, WorkflowConfig};

use crate::error::FetchError;

pub use github::{api_base_for_host, GithubClient};

/// One page of workflow runs.
#[derive(Debug, Clone, Default)]
pub struct RunPage {
    pub runs: Vec<RunRecord>,
    pub total_count: u64,
    pub first_page: u32,
    pub last_page: u32,
}

#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Lists one page of runs. The API's status filter is never used here.
    async fn list_runs(
        &self,
        workflow: &WorkflowConfig,
        options: &FetchOptions,
        page: u32,
        per_page: u32,
    ) -> Result<RunPage, FetchError>;

    /// Fetches one attempt of a run. A missing attempt is [`FetchError::NotFound`].
    async fn get_run_attempt(
        &self,
        workflow: &WorkflowConfig,
        run_id: u64,
        attempt: u32,
        exclude_pull_requests: bool,
    ) -> Result<RunRecord, FetchError>;

    async fn list_jobs_for_attempt(
        &self,
        workflow: &WorkflowConfig,
        run_id: u64,
        attempt: u32,
    ) -> Result<Vec<JobRecord>, FetchError>;
}
