use std::fmt;

use crate::error::ConfigError;
use crate::reduce::DEFAULT_SAMPLE_LIMIT;

pub const DEFAULT_HOST: &str = "github.com";
pub const DEFAULT_PER_PAGE: u32 = 100;
pub const MAX_PER_PAGE: u32 = 100;
pub const DEFAULT_TOP_JOBS: usize = 3;

const API_CONCURRENCY_CAP: usize = 5;
const FANOUT_CONCURRENCY_CAP: usize = 10;

fn cpus() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Slots for requests against the rate-limited API: `min(cpus, 5)`.
pub fn default_api_concurrency() -> usize {
    cpus().min(API_CONCURRENCY_CAP)
}

/// Slots for local fan-out work: `min(cpus * 2, 10)`.
pub fn default_fanout_concurrency() -> usize {
    (cpus() * 2).min(FANOUT_CONCURRENCY_CAP)
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowRef {
    FileName(String),
    Id(u64),
}

impl WorkflowRef {
    /// A file name wins when both are supplied.
    pub fn from_parts(file: Option<String>, id: Option<u64>) -> Result<Self, ConfigError> {
        match (file.filter(|f| !f.trim().is_empty()), id) {
            (Some(file), _) => Ok(WorkflowRef::FileName(file)),
            (None, Some(id)) if id > 0 => Ok(WorkflowRef::Id(id)),
            _ => Err(ConfigError::MissingWorkflow),
        }
    }
}

impl fmt::Display for WorkflowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowRef::FileName(name) => f.write_str(name),
            WorkflowRef::Id(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WorkflowConfig {
    pub host: String,
    pub org: String,
    pub repo: String,
    pub workflow: WorkflowRef,
}

/// Filters forwarded to the run listing, plus the client-side status filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FetchOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_sha: Option<String>,

    #[serde(default)]
    pub exclude_pull_requests: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_suite_id: Option<u64>,

    #[serde(default)]
    pub all_pages: bool,

    /// Matched against run status or conclusion after attempts are resolved.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LimitsConfig {
    pub api_concurrency: usize,
    pub per_page: u32,
    pub sample_limit: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            api_concurrency: default_api_concurrency(),
            per_page: DEFAULT_PER_PAGE,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisConfig {
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub options: FetchOptions,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub include_jobs: bool,

    #[serde(default = "default_top_jobs")]
    pub top_jobs: usize,
}

fn default_top_jobs() -> usize {
    DEFAULT_TOP_JOBS
}

impl AnalysisConfig {
    pub fn new(workflow: WorkflowConfig) -> Self {
        Self {
            workflow,
            options: FetchOptions::default(),
            limits: LimitsConfig::default(),
            include_jobs: false,
            top_jobs: DEFAULT_TOP_JOBS,
        }
    }

    /// Rejects configurations that cannot produce a meaningful fetch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workflow.org.trim().is_empty() || self.workflow.repo.trim().is_empty() {
            return Err(ConfigError::MissingOrgRepo);
        }
        match &self.workflow.workflow {
            WorkflowRef::FileName(name) if name.trim().is_empty() => {
                return Err(ConfigError::MissingWorkflow)
            }
            WorkflowRef::Id(0) => return Err(ConfigError::MissingWorkflow),
            _ => {}
        }
        if self.top_jobs == 0 {
            return Err(ConfigError::InvalidJobCount(self.top_jobs));
        }
        if self.limits.api_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(self.limits.api_concurrency));
        }
        if self.limits.sample_limit == 0 {
            return Err(ConfigError::InvalidSampleLimit(self.limits.sample_limit));
        }
        if self.limits.per_page == 0 || self.limits.per_page > MAX_PER_PAGE {
            return Err(ConfigError::InvalidPerPage(self.limits.per_page));
        }
        Ok(())
    }
}
