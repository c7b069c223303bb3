mod conclusion;
mod job;
mod run;
mod stats;

pub use conclusion::{empty_counts, Conclusion, STATUS_COMPLETED};
pub use job::{JobRecord, StepRecord};
pub use run::{RunRecord, RunSummary, MAX_DURATION_CAPPED, MAX_DURATION_SECONDS};
pub use stats::{ConclusionSummary, ExecutionStats, JobStats, Rate, RunStats, StepStats};
