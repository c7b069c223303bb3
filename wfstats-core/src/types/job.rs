use chrono::{DateTime, Utc};

use crate::types::conclusion::{Conclusion, STATUS_COMPLETED};
use crate::types::run::clamp_duration;

/// A job of one run attempt, with its ordered steps.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobRecord {
    pub id: u64,
    pub run_id: u64,

    #[serde(default)]
    pub run_attempt: u32,

    pub name: String,
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub html_url: String,

    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub number: u32,
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn conclusion_class(&self) -> Conclusion {
        Conclusion::classify(self.conclusion.as_deref())
    }

    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    pub fn duration_seconds(&self) -> f64 {
        span(self.started_at, self.completed_at)
    }
}

impl StepRecord {
    pub fn conclusion_class(&self) -> Conclusion {
        Conclusion::classify(self.conclusion.as_deref())
    }

    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    pub fn duration_seconds(&self) -> f64 {
        span(self.started_at, self.completed_at)
    }
}

fn span(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> f64 {
    match (start, end) {
        (Some(start), Some(end)) => clamp_duration((end - start).num_milliseconds() as f64 / 1000.0),
        _ => 0.0,
    }
}
