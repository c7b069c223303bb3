//! Plain-text rendering of a [`WorkflowReport`].

use std::fmt::Write;

use wfstats_core::{AnalysisConfig, Conclusion, ExecutionStats, JobStats};
use wfstats_fetch::WorkflowReport;

pub fn render_report(config: &AnalysisConfig, report: &WorkflowReport) -> String {
    let mut out = String::new();
    let stats = &report.run_stats;
    let meta = &report.metadata;

    if meta.rate_limited {
        let reset = meta
            .rate_limit_reset_at
            .map(|at| format!(" (resets at {})", at.format("%Y-%m-%d %H:%M:%S UTC")))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "warning: GitHub API rate limit reached{reset}; statistics below are based on partial data"
        );
    }
    for warning in &meta.warnings {
        let _ = writeln!(out, "warning: some requests failed: {warning}");
    }

    let name = if stats.name.is_empty() {
        config.workflow.workflow.to_string()
    } else {
        stats.name.clone()
    };
    let _ = writeln!(
        out,
        "Workflow: {name} ({}/{}, {})",
        config.workflow.org, config.workflow.repo, config.workflow.workflow
    );
    let _ = writeln!(out, "Total runs: {}", stats.total_count);
    if meta.total_fetched != meta.total_filtered {
        let _ = writeln!(out, "  (filtered from {} fetched)", meta.total_fetched);
    }
    for class in Conclusion::ALL {
        let _ = writeln!(
            out,
            "  {:<8} {:>6}  ({:>6.2}%)",
            class.as_str(),
            stats.count(class),
            stats.rate.get(class) * 100.0
        );
    }

    out.push('\n');
    out.push_str("Execution time of successful runs:\n");
    write_execution_stats(&mut out, &stats.execution_stats);
    out
}

pub fn render_jobs(jobs: &[JobStats], top: usize) -> String {
    let mut out = String::new();
    if jobs.is_empty() {
        out.push_str("\nNo jobs found.\n");
        return out;
    }

    let _ = writeln!(out, "\nTop {top} failing jobs:");
    let failing = top_failing(jobs, top);
    if failing.is_empty() {
        out.push_str("  none\n");
    }
    for (rank, job) in failing.iter().enumerate() {
        let _ = write!(
            out,
            "  {}. {}  {} of {} failed ({:.2}%)",
            rank + 1,
            job.name,
            job.count(Conclusion::Failure),
            job.total_count,
            job.rate.failure * 100.0
        );
        if let Some(step) = job.most_failing_step() {
            let _ = write!(
                out,
                "  most failing step: #{} {} ({})",
                step.number,
                step.name,
                step.count(Conclusion::Failure)
            );
        }
        out.push('\n');
    }

    let _ = writeln!(out, "\nTop {top} slowest jobs (successful runs):");
    let slowest = top_slowest(jobs, top);
    if slowest.is_empty() {
        out.push_str("  none\n");
    }
    for (rank, job) in slowest.iter().enumerate() {
        let s = &job.execution_stats;
        let _ = writeln!(
            out,
            "  {}. {}  mean {}  p95 {}  max {}",
            rank + 1,
            job.name,
            fmt_duration(s.mean),
            fmt_duration(s.p95),
            fmt_duration(s.max)
        );
    }
    out
}

/// Jobs with at least one failure, most failures first.
fn top_failing(jobs: &[JobStats], top: usize) -> Vec<&JobStats> {
    let mut failing: Vec<_> = jobs
        .iter()
        .filter(|j| j.count(Conclusion::Failure) > 0)
        .collect();
    failing.sort_by(|a, b| {
        b.count(Conclusion::Failure)
            .cmp(&a.count(Conclusion::Failure))
            .then_with(|| a.name.cmp(&b.name))
    });
    failing.truncate(top);
    failing
}

fn top_slowest(jobs: &[JobStats], top: usize) -> Vec<&JobStats> {
    let mut timed: Vec<_> = jobs.iter().filter(|j| j.execution_stats.count > 0).collect();
    timed.sort_by(|a, b| {
        b.execution_stats
            .mean
            .total_cmp(&a.execution_stats.mean)
            .then_with(|| a.name.cmp(&b.name))
    });
    timed.truncate(top);
    timed
}

fn write_execution_stats(out: &mut String, s: &ExecutionStats) {
    if s.count == 0 {
        out.push_str("  no completed successful runs\n");
        return;
    }
    let _ = writeln!(out, "  samples  {}", s.count);
    for (label, value) in [
        ("min", s.min),
        ("max", s.max),
        ("mean", s.mean),
        ("median", s.median),
        ("p95", s.p95),
        ("p99", s.p99),
        ("std dev", s.std_dev),
    ] {
        let _ = writeln!(out, "  {label:<8} {}", fmt_duration(value));
    }
}

fn fmt_duration(seconds: f64) -> String {
    let whole = seconds.max(0.0).round() as u64;
    let (h, m, s) = (whole / 3600, (whole % 3600) / 60, whole % 60);
    match (h, m) {
        (0, 0) => format!("{:.1}s", seconds.max(0.0)),
        (0, _) => format!("{m}m{s:02}s"),
        _ => format!("{h}h{m:02}m{s:02}s"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use wfstats_core::{Rate, StepStats};

    use super::*;

    fn job(name: &str, failures: usize, total: usize, mean: f64) -> JobStats {
        let mut stats = JobStats::empty(name);
        stats.total_count = total;
        stats.conclusions.insert(Conclusion::Failure, failures);
        stats.conclusions.insert(Conclusion::Success, total - failures);
        stats.execution_stats = ExecutionStats {
            count: usize::from(mean > 0.0),
            mean,
            p95: mean,
            max: mean,
            ..ExecutionStats::default()
        };
        stats
    }

    #[test]
    fn durations_are_human_readable() {
        assert_eq!(fmt_duration(12.34), "12.3s");
        assert_eq!(fmt_duration(90.0), "1m30s");
        assert_eq!(fmt_duration(3725.0), "1h02m05s");
        assert_eq!(fmt_duration(-3.0), "0.0s");
    }

    #[test]
    fn failing_jobs_ranked_by_failure_count() {
        let jobs = vec![job("lint", 1, 10, 5.0), job("test", 4, 10, 50.0), job("build", 0, 10, 80.0)];
        let names: Vec<_> = top_failing(&jobs, 3).iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, ["test", "lint"]);

        let names: Vec<_> = top_slowest(&jobs, 2).iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, ["build", "test"]);
    }

    #[test]
    fn jobs_section_names_the_most_failing_step() {
        let mut test = job("test", 2, 4, 30.0);
        test.steps.push(StepStats {
            name: "Run tests".to_string(),
            number: 3,
            run_count: 4,
            conclusions: BTreeMap::from([
                (Conclusion::Success, 2),
                (Conclusion::Failure, 2),
                (Conclusion::Others, 0),
            ]),
            rate: Rate::default(),
            execution_stats: ExecutionStats::default(),
            failure_urls: Vec::new(),
        });

        let text = render_jobs(&[test], 3);
        assert!(text.contains("Top 3 failing jobs:"));
        assert!(text.contains("1. test  2 of 4 failed"));
        assert!(text.contains("most failing step: #3 Run tests (2)"));
        assert!(text.contains("mean 30.0s"));
    }
}
