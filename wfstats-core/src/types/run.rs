use chrono::{DateTime, Utc};

use crate::types::conclusion::{Conclusion, STATUS_COMPLETED};

/// Longest duration a workflow run can legitimately report (35 days).
pub const MAX_DURATION_SECONDS: f64 = 35.0 * 24.0 * 3600.0;

/// Value reported in place of any duration beyond [`MAX_DURATION_SECONDS`].
pub const MAX_DURATION_CAPPED: f64 = 3_024_000.0;

/// One attempt of a workflow run, as returned by the list or attempt endpoints.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunRecord {
    pub id: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<u64>,

    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    pub run_attempt: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_sha: Option<String>,

    pub html_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl RunRecord {
    pub fn conclusion_class(&self) -> Conclusion {
        Conclusion::classify(self.conclusion.as_deref())
    }

    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    /// Seconds from start to completion, clamped to `[0, MAX_DURATION_SECONDS]`.
    ///
    /// Runs without a completion time report 0.
    pub fn duration_seconds(&self) -> f64 {
        let start = self.run_started_at.or(self.created_at);
        match (start, self.completed_at) {
            (Some(start), Some(end)) => {
                clamp_duration((end - start).num_milliseconds() as f64 / 1000.0)
            }
            _ => 0.0,
        }
    }

    /// Link to this specific attempt; the first attempt uses the plain run URL.
    pub fn attempt_url(&self) -> String {
        if self.run_attempt > 1 {
            format!("{}/attempts/{}", self.html_url, self.run_attempt)
        } else {
            self.html_url.clone()
        }
    }

    /// True when `filter` is empty or mentions this run's status or conclusion.
    pub fn matches_status(&self, filter: &[String]) -> bool {
        filter.is_empty()
            || filter.iter().any(|s| {
                s == &self.status || self.conclusion.as_deref() == Some(s.as_str())
            })
    }
}

pub(crate) fn clamp_duration(seconds: f64) -> f64 {
    if !seconds.is_finite() || seconds < 0.0 {
        0.0
    } else if seconds > MAX_DURATION_SECONDS {
        MAX_DURATION_CAPPED
    } else {
        seconds
    }
}

/// The subset of a run kept in conclusion buckets.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunSummary {
    pub id: u64,
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    pub run_attempt: u32,
    pub html_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    pub duration: f64,
}

impl From<&RunRecord> for RunSummary {
    fn from(run: &RunRecord) -> Self {
        Self {
            id: run.id,
            status: run.status.clone(),
            conclusion: run.conclusion.clone(),
            actor: run.actor.clone(),
            run_attempt: run.run_attempt,
            html_url: run.attempt_url(),
            jobs_url: run.jobs_url.clone(),
            logs_url: run.logs_url.clone(),
            created_at: run.created_at,
            run_started_at: run.run_started_at,
            updated_at: run.updated_at,
            duration: run.duration_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn run(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> RunRecord {
        RunRecord {
            id: 1,
            name: None,
            workflow_id: None,
            status: "completed".to_string(),
            conclusion: Some("success".to_string()),
            actor: None,
            run_attempt: 1,
            event: None,
            head_branch: None,
            head_sha: None,
            html_url: "https://github.com/o/r/actions/runs/1".to_string(),
            jobs_url: None,
            logs_url: None,
            created_at: Some(start),
            run_started_at: Some(start),
            updated_at: end,
            completed_at: end,
        }
    }

    #[test]
    fn duration_is_capped_past_the_maximum() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = start + chrono::Duration::seconds(MAX_DURATION_SECONDS as i64 + 1000);
        assert_eq!(run(start, Some(end)).duration_seconds(), MAX_DURATION_CAPPED);
    }

    #[test]
    fn negative_duration_reports_zero() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 10, 0).unwrap();
        let end = start - chrono::Duration::seconds(30);
        assert_eq!(run(start, Some(end)).duration_seconds(), 0.0);
    }

    #[test]
    fn duration_measures_start_to_completion_not_last_update() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut r = run(start, Some(start + chrono::Duration::seconds(90)));
        // bookkeeping updates after completion must not stretch the duration
        r.updated_at = Some(start + chrono::Duration::seconds(600));
        assert_eq!(r.duration_seconds(), 90.0);
        r.completed_at = None;
        assert_eq!(r.duration_seconds(), 0.0);
    }

    #[test]
    fn attempt_url_only_for_retries() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut r = run(start, None);
        assert_eq!(r.attempt_url(), "https://github.com/o/r/actions/runs/1");
        r.run_attempt = 3;
        assert_eq!(r.attempt_url(), "https://github.com/o/r/actions/runs/1/attempts/3");
    }

    #[test]
    fn status_filter_matches_status_or_conclusion() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let r = run(start, None);
        assert!(r.matches_status(&[]));
        assert!(r.matches_status(&["success".to_string()]));
        assert!(r.matches_status(&["completed".to_string()]));
        assert!(!r.matches_status(&["failure".to_string(), "queued".to_string()]));
    }
}
