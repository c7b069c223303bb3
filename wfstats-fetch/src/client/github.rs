use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;
use wfstats_core::types::STATUS_COMPLETED;
use wfstats_core::{FetchOptions, JobRecord, RunRecord, StepRecord, WorkflowConfig};

use crate::client::ratelimit::{get_header_ci, rate_limit_from_headers};
use crate::client::{RemoteClient, RunPage};
use crate::error::FetchError;

const PUBLIC_HOST: &str = "github.com";
const API_VERSION: &str = "2022-11-28";
const JOBS_PER_PAGE: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// REST base for a host: the public API for github.com, `/api/v3/` otherwise.
pub fn api_base_for_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() || host.eq_ignore_ascii_case(PUBLIC_HOST) {
        "https://api.github.com/".to_string()
    } else {
        format!("https://{host}/api/v3/")
    }
}

/// [`RemoteClient`] backed by the GitHub Actions REST API.
pub struct GithubClient {
    http: reqwest::Client,
    base: Url,
    token: Option<SecretString>,
}

impl GithubClient {
    pub fn new(host: &str, token: Option<SecretString>) -> Result<Self, FetchError> {
        Self::with_base_url(&api_base_for_host(host), token)
    }

    pub fn with_base_url(base: &str, token: Option<SecretString>) -> Result<Self, FetchError> {
        let base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base = Url::parse(&base).map_err(|e| FetchError::System(format!("invalid api base url: {e}")))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("workflow-stats/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FetchError::System(format!("failed to create http client: {e}")))?;
        Ok(Self { http, base, token })
    }

    fn repo_path(workflow: &WorkflowConfig) -> String {
        format!(
            "repos/{}/{}",
            urlencoding::encode(&workflow.org),
            urlencoding::encode(&workflow.repo)
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        operation: &str,
    ) -> Result<(T, BTreeMap<String, String>), FetchError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| FetchError::System(format!("invalid request path {path}: {e}")))?;

        let mut rb = self
            .http
            .get(url)
            .query(query)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.token {
            rb = rb.bearer_auth(token.expose_secret());
        }

        tracing::debug!(operation, path, "sending request");
        let resp = rb.send().await.map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();

        let mut headers = BTreeMap::new();
        for (k, v) in resp.headers().iter() {
            if let Ok(s) = v.to_str() {
                headers.insert(k.to_string(), s.to_string());
            }
        }
        let body = resp.bytes().await.map_err(map_reqwest_error)?;

        if !(200..300).contains(&status) {
            return Err(status_error(status, &headers, &body, path, operation));
        }
        let value = serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok((value, headers))
    }
}

#[async_trait]
impl RemoteClient for GithubClient {
    async fn list_runs(
        &self,
        workflow: &WorkflowConfig,
        options: &FetchOptions,
        page: u32,
        per_page: u32,
    ) -> Result<RunPage, FetchError> {
        let path = format!(
            "{}/actions/workflows/{}/runs",
            Self::repo_path(workflow),
            urlencoding::encode(&workflow.workflow.to_string())
        );

        let mut query = vec![("per_page", per_page.to_string()), ("page", page.to_string())];
        let filters = [
            ("actor", &options.actor),
            ("branch", &options.branch),
            ("event", &options.event),
            ("created", &options.created),
            ("head_sha", &options.head_sha),
        ];
        for (key, value) in filters {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                query.push((key, v.to_string()));
            }
        }
        if options.exclude_pull_requests {
            query.push(("exclude_pull_requests", "true".to_string()));
        }
        if let Some(id) = options.check_suite_id {
            query.push(("check_suite_id", id.to_string()));
        }

        let (list, headers): (WireRunList, _) = self.get_json(&path, &query, "list_runs").await?;
        let last_page = get_header_ci(&headers, "link")
            .and_then(last_page_from_link)
            .unwrap_or(page)
            .max(page);

        Ok(RunPage {
            runs: list.workflow_runs.into_iter().map(RunRecord::from).collect(),
            total_count: list.total_count,
            first_page: page,
            last_page,
        })
    }

    async fn get_run_attempt(
        &self,
        workflow: &WorkflowConfig,
        run_id: u64,
        attempt: u32,
        exclude_pull_requests: bool,
    ) -> Result<RunRecord, FetchError> {
        let path = format!("{}/actions/runs/{run_id}/attempts/{attempt}", Self::repo_path(workflow));
        let query = [("exclude_pull_requests", exclude_pull_requests.to_string())];
        let (run, _): (WireRun, _) = self.get_json(&path, &query, "get_run_attempt").await?;
        Ok(run.into())
    }

    async fn list_jobs_for_attempt(
        &self,
        workflow: &WorkflowConfig,
        run_id: u64,
        attempt: u32,
    ) -> Result<Vec<JobRecord>, FetchError> {
        let path = format!(
            "{}/actions/runs/{run_id}/attempts/{attempt}/jobs",
            Self::repo_path(workflow)
        );
        let query = [("per_page", JOBS_PER_PAGE.to_string())];
        let (list, _): (WireJobList, _) = self.get_json(&path, &query, "list_jobs_for_attempt").await?;
        Ok(list
            .jobs
            .into_iter()
            .map(|job| job.into_record(run_id, attempt))
            .collect())
    }
}

fn status_error(
    status: u16,
    headers: &BTreeMap<String, String>,
    body: &[u8],
    resource: &str,
    operation: &str,
) -> FetchError {
    if status == 404 {
        return FetchError::NotFound {
            resource: resource.to_string(),
        };
    }
    if let Some(rl) = rate_limit_from_headers(status, headers, operation, SystemTime::now()) {
        return FetchError::RateLimited(rl);
    }

    let message = serde_json::from_slice::<WireMessage>(body)
        .map(|m| m.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).chars().take(200).collect());
    FetchError::Api {
        status,
        message,
        resource: resource.to_string(),
        operation: operation.to_string(),
        request_id: get_header_ci(headers, "x-github-request-id").map(str::to_string),
    }
}

fn map_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        return FetchError::Timeout;
    }
    if e.is_decode() {
        return FetchError::Decode(e.to_string());
    }
    FetchError::Network(e.to_string())
}

/// Page number of the `rel="last"` entry of a `Link` header.
fn last_page_from_link(link: &str) -> Option<u32> {
    let page = Regex::new(r"[?&]page=(\d+)").ok()?;
    link.split(',')
        .find(|part| part.contains(r#"rel="last""#))
        .and_then(|part| page.captures(part))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[derive(Deserialize)]
struct WireMessage {
    message: String,
}

#[derive(Deserialize)]
struct WireRunList {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    workflow_runs: Vec<WireRun>,
}

#[derive(Deserialize)]
struct WireActor {
    login: String,
}

#[derive(Deserialize)]
struct WireRun {
    id: u64,
    name: Option<String>,
    workflow_id: Option<u64>,
    status: Option<String>,
    conclusion: Option<String>,
    actor: Option<WireActor>,
    run_attempt: Option<u32>,
    event: Option<String>,
    head_branch: Option<String>,
    head_sha: Option<String>,
    #[serde(default)]
    html_url: String,
    jobs_url: Option<String>,
    logs_url: Option<String>,
    created_at: Option<DateTime<Utc>>,
    run_started_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<WireRun> for RunRecord {
    fn from(w: WireRun) -> Self {
        let status = w.status.unwrap_or_default();
        // runs expose no completion time; the last update of a finished run stands in
        let completed_at = if status == STATUS_COMPLETED { w.updated_at } else { None };
        RunRecord {
            id: w.id,
            name: w.name,
            workflow_id: w.workflow_id,
            status,
            conclusion: w.conclusion,
            actor: w.actor.map(|a| a.login),
            run_attempt: w.run_attempt.unwrap_or(1).max(1),
            event: w.event,
            head_branch: w.head_branch,
            head_sha: w.head_sha,
            html_url: w.html_url,
            jobs_url: w.jobs_url,
            logs_url: w.logs_url,
            created_at: w.created_at,
            run_started_at: w.run_started_at,
            updated_at: w.updated_at,
            completed_at,
        }
    }
}

#[derive(Deserialize)]
struct WireJobList {
    #[serde(default)]
    jobs: Vec<WireJob>,
}

#[derive(Deserialize)]
struct WireJob {
    id: u64,
    run_id: Option<u64>,
    run_attempt: Option<u32>,
    name: String,
    status: Option<String>,
    conclusion: Option<String>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    html_url: Option<String>,
    #[serde(default)]
    steps: Vec<WireStep>,
}

#[derive(Deserialize)]
struct WireStep {
    name: String,
    number: u32,
    status: Option<String>,
    conclusion: Option<String>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl WireJob {
    fn into_record(self, run_id: u64, attempt: u32) -> JobRecord {
        JobRecord {
            id: self.id,
            run_id: self.run_id.unwrap_or(run_id),
            run_attempt: self.run_attempt.unwrap_or(attempt),
            name: self.name,
            status: self.status.unwrap_or_default(),
            conclusion: self.conclusion,
            started_at: self.started_at,
            completed_at: self.completed_at,
            html_url: self.html_url.unwrap_or_default(),
            steps: self
                .steps
                .into_iter()
                .map(|s| StepRecord {
                    name: s.name,
                    number: s.number,
                    status: s.status.unwrap_or_default(),
                    conclusion: s.conclusion,
                    started_at: s.started_at,
                    completed_at: s.completed_at,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enterprise_hosts_use_api_v3() {
        assert_eq!(api_base_for_host("github.com"), "https://api.github.com/");
        assert_eq!(api_base_for_host(""), "https://api.github.com/");
        assert_eq!(api_base_for_host("ghe.example.com"), "https://ghe.example.com/api/v3/");
    }

    #[test]
    fn last_page_comes_from_rel_last() {
        let link = r#"<https://api.github.com/repositories/1/actions/workflows/ci.yaml/runs?per_page=100&page=2>; rel="next", <https://api.github.com/repositories/1/actions/workflows/ci.yaml/runs?per_page=100&page=7>; rel="last""#;
        assert_eq!(last_page_from_link(link), Some(7));
        assert_eq!(last_page_from_link(r#"<https://x/?page=1>; rel="prev""#), None);
    }
}
