use std::collections::BTreeMap;

use crate::types::conclusion::{Conclusion, empty_counts};
use crate::types::run::RunSummary;

/// Distribution of a duration sample, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExecutionStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub p95: f64,
    pub p99: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rate {
    pub success: f64,
    pub failure: f64,
    pub others: f64,
}

impl Rate {
    pub fn get(&self, conclusion: Conclusion) -> f64 {
        match conclusion {
            Conclusion::Success => self.success,
            Conclusion::Failure => self.failure,
            Conclusion::Others => self.others,
        }
    }
}

/// Per-conclusion count plus the bounded sample of runs behind it.
///
/// `count` keeps growing after `runs` reaches its cap, so `count >= runs.len()`.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConclusionSummary {
    pub count: usize,
    pub runs: Vec<RunSummary>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunStats {
    pub total_count: usize,
    pub name: String,
    pub rate: Rate,
    pub execution_stats: ExecutionStats,
    pub conclusions: BTreeMap<Conclusion, ConclusionSummary>,
}

impl RunStats {
    pub fn empty() -> Self {
        Self {
            total_count: 0,
            name: String::new(),
            rate: Rate::default(),
            execution_stats: ExecutionStats::default(),
            conclusions: Conclusion::ALL
                .into_iter()
                .map(|c| (c, ConclusionSummary::default()))
                .collect(),
        }
    }

    pub fn count(&self, conclusion: Conclusion) -> usize {
        self.conclusions.get(&conclusion).map_or(0, |c| c.count)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobStats {
    pub name: String,
    pub total_count: usize,
    pub rate: Rate,
    pub conclusions: BTreeMap<Conclusion, usize>,
    pub execution_stats: ExecutionStats,
    pub steps: Vec<StepStats>,
}

impl JobStats {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total_count: 0,
            rate: Rate::default(),
            conclusions: empty_counts(),
            execution_stats: ExecutionStats::default(),
            steps: Vec::new(),
        }
    }

    pub fn count(&self, conclusion: Conclusion) -> usize {
        self.conclusions.get(&conclusion).copied().unwrap_or(0)
    }

    /// The step with the most failures, if any step failed at all.
    pub fn most_failing_step(&self) -> Option<&StepStats> {
        self.steps
            .iter()
            .filter(|s| s.count(Conclusion::Failure) > 0)
            .max_by_key(|s| s.count(Conclusion::Failure))
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StepStats {
    pub name: String,
    pub number: u32,
    pub run_count: usize,
    pub conclusions: BTreeMap<Conclusion, usize>,
    pub rate: Rate,
    pub execution_stats: ExecutionStats,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_urls: Vec<String>,
}

impl StepStats {
    pub fn count(&self, conclusion: Conclusion) -> usize {
        self.conclusions.get(&conclusion).copied().unwrap_or(0)
    }
}
