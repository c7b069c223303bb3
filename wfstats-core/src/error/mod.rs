use thiserror::Error;

/// Invalid analysis input, detected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("organization and repository are required")]
    MissingOrgRepo,
    #[error("a workflow file name or workflow id is required")]
    MissingWorkflow,
    #[error("job count must be at least 1 (got {0})")]
    InvalidJobCount(usize),
    #[error("concurrency must be at least 1 (got {0})")]
    InvalidConcurrency(usize),
    #[error("sample limit must be at least 1 (got {0})")]
    InvalidSampleLimit(usize),
    #[error("per page must be between 1 and 100 (got {0})")]
    InvalidPerPage(u32),
}
