#![forbid(unsafe_code)]

//! Concurrent acquisition and streaming aggregation of workflow runs and jobs.
//!
//! Pure statistics live in `wfstats-core`; this crate owns everything that
//! talks to the network or shares state between tasks.

pub mod analyzer;
pub mod client;
pub mod collector;
pub mod error;
pub mod jobs;
pub mod limiter;
pub mod outcome;
pub mod runs;

pub use crate::analyzer::{Analyzer, ReportMetadata, WorkflowReport};
pub use crate::client::{GithubClient, RemoteClient, RunPage};
pub use crate::collector::StatsCollector;
pub use crate::error::{AnalyzeError, FetchError, FetchErrorKind, RateLimitError};
pub use crate::jobs::JobFetcher;
pub use crate::limiter::{Limiter, LimiterPermit};
pub use crate::outcome::Partial;
pub use crate::runs::RunFetcher;
