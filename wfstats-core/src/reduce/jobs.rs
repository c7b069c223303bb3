use std::collections::BTreeMap;

use crate::reduce::sample::{SampleBuffer, SampleLimits, SampleUsage};
use crate::statistics;
use crate::types::{empty_counts, Conclusion, JobRecord, JobStats, StepRecord, StepStats};

#[derive(Debug, Clone)]
struct JobGroup {
    total: usize,
    counts: BTreeMap<Conclusion, usize>,
    durations: SampleBuffer<f64>,
    steps: BTreeMap<String, StepGroup>,
}

#[derive(Debug, Clone)]
struct StepGroup {
    number: u32,
    runs: usize,
    counts: BTreeMap<Conclusion, usize>,
    durations: SampleBuffer<f64>,
    failure_urls: SampleBuffer<String>,
}

/// Incremental job-level reduction, grouped by job name and then step name.
#[derive(Debug, Clone)]
pub struct JobReducer {
    limits: SampleLimits,
    jobs: BTreeMap<String, JobGroup>,
}

impl JobReducer {
    pub fn new(limits: SampleLimits) -> Self {
        Self {
            limits,
            jobs: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, job: &JobRecord) {
        let limits = self.limits;
        let group = self.jobs.entry(job.name.clone()).or_insert_with(|| JobGroup {
            total: 0,
            counts: empty_counts(),
            durations: SampleBuffer::new(limits.job_durations),
            steps: BTreeMap::new(),
        });

        group.total += 1;
        let class = job.conclusion_class();
        *group.counts.entry(class).or_insert(0) += 1;
        if job.is_completed() && class == Conclusion::Success {
            let duration = job.duration_seconds();
            if duration > 0.0 {
                group.durations.push(duration);
            }
        }

        for step in &job.steps {
            record_step(&mut group.steps, step, &job.html_url, limits);
        }
    }

    pub fn group_count(&self) -> usize {
        self.jobs.len()
    }

    /// Job statistics ordered by name, each with steps ordered by number.
    pub fn finish(&self) -> Vec<JobStats> {
        self.jobs
            .iter()
            .map(|(name, group)| {
                let mut steps: Vec<StepStats> = group
                    .steps
                    .iter()
                    .map(|(step_name, s)| StepStats {
                        name: step_name.clone(),
                        number: s.number,
                        run_count: s.runs,
                        conclusions: s.counts.clone(),
                        rate: statistics::rates(&s.counts, s.runs),
                        execution_stats: statistics::execution_stats(s.durations.as_slice()),
                        failure_urls: s.failure_urls.as_slice().to_vec(),
                    })
                    .collect();
                steps.sort_by_key(|s| s.number);

                JobStats {
                    name: name.clone(),
                    total_count: group.total,
                    rate: statistics::rates(&group.counts, group.total),
                    conclusions: group.counts.clone(),
                    execution_stats: statistics::execution_stats(group.durations.as_slice()),
                    steps,
                }
            })
            .collect()
    }

    pub fn fill_usage(&self, usage: &mut SampleUsage) {
        usage.ceiling = self.limits.ceiling;
        usage.job_groups = self.jobs.len();
        usage.job_durations = self.jobs.values().map(|g| g.durations.len()).sum();
        usage.step_groups = self.jobs.values().map(|g| g.steps.len()).sum();
        usage.step_durations = self
            .jobs
            .values()
            .flat_map(|g| g.steps.values())
            .map(|s| s.durations.len())
            .sum();
        usage.failure_urls = self
            .jobs
            .values()
            .flat_map(|g| g.steps.values())
            .map(|s| s.failure_urls.len())
            .sum();
    }
}

impl Default for JobReducer {
    fn default() -> Self {
        Self::new(SampleLimits::default())
    }
}

fn record_step(
    steps: &mut BTreeMap<String, StepGroup>,
    step: &StepRecord,
    job_url: &str,
    limits: SampleLimits,
) {
    let group = steps.entry(step.name.clone()).or_insert_with(|| StepGroup {
        number: step.number,
        runs: 0,
        counts: empty_counts(),
        durations: SampleBuffer::new(limits.step_durations),
        failure_urls: SampleBuffer::new(limits.failure_urls),
    });

    group.runs += 1;
    let class = step.conclusion_class();
    *group.counts.entry(class).or_insert(0) += 1;
    if !step.is_completed() {
        return;
    }
    if class == Conclusion::Failure && !job_url.is_empty() {
        group.failure_urls.push(job_url.to_string());
    }
    let timed = step.started_at.is_some() && step.completed_at.is_some();
    if timed && matches!(class, Conclusion::Success | Conclusion::Failure) {
        group.durations.push(step.duration_seconds());
    }
}
