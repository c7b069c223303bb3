#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod reduce;
pub mod statistics;
pub mod types;

pub use crate::config::{
    default_api_concurrency, default_fanout_concurrency, AnalysisConfig, FetchOptions,
    LimitsConfig, WorkflowConfig, WorkflowRef,
};
pub use crate::error::ConfigError;
pub use crate::reduce::{JobReducer, RunReducer, SampleLimits, SampleUsage};
pub use crate::types::{
    Conclusion, ExecutionStats, JobRecord, JobStats, Rate, RunRecord, RunStats, RunSummary,
    StepRecord, StepStats,
};
