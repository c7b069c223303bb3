use secrecy::SecretString;
use wfstats_core::{
    default_api_concurrency, AnalysisConfig, ConfigError, FetchOptions, LimitsConfig,
    WorkflowConfig, WorkflowRef,
};

use crate::{FilterArgs, LimitArgs, WorkflowArgs};

const TOKEN_VARS: [&str; 2] = ["GH_TOKEN", "GITHUB_TOKEN"];

/// Builds and validates the one configuration value used for the whole run.
pub fn build_analysis_config(
    workflow: WorkflowArgs,
    filters: FilterArgs,
    limits: &LimitArgs,
    include_jobs: bool,
    top_jobs: usize,
) -> Result<AnalysisConfig, ConfigError> {
    let (org, repo) = match (workflow.org, workflow.repo) {
        (Some(org), Some(repo)) => (org, repo),
        _ => return Err(ConfigError::MissingOrgRepo),
    };

    let config = AnalysisConfig {
        workflow: WorkflowConfig {
            host: workflow.host,
            org,
            repo,
            workflow: WorkflowRef::from_parts(workflow.file, workflow.id)?,
        },
        options: FetchOptions {
            actor: filters.actor,
            branch: filters.branch,
            event: filters.event,
            created: filters.created,
            head_sha: filters.head_sha,
            exclude_pull_requests: filters.exclude_pull_requests,
            check_suite_id: filters.check_suite_id,
            all_pages: filters.all,
            statuses: filters
                .status
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        },
        limits: LimitsConfig {
            api_concurrency: limits.max_concurrency.unwrap_or_else(default_api_concurrency),
            sample_limit: limits.sample_limit,
            ..LimitsConfig::default()
        },
        include_jobs,
        top_jobs,
    };
    config.validate()?;
    Ok(config)
}

/// First non-empty token from `GH_TOKEN` or `GITHUB_TOKEN`.
pub fn token_from_env() -> Option<SecretString> {
    TOKEN_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|v| !v.trim().is_empty())
        .map(SecretString::from)
}
