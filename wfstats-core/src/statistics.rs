//! Pure numeric helpers used when finalising reducers.

use std::collections::BTreeMap;

use crate::types::{Conclusion, ExecutionStats, Rate};

/// Rates closer to zero than this are reported as exactly zero.
pub const RATE_EPSILON: f64 = 1e-9;

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Linear-interpolation percentile over an ascending slice.
///
/// `p <= 0` yields the minimum and `p >= 100` the maximum.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let (Some(&first), Some(&last)) = (sorted.first(), sorted.last()) else {
        return 0.0;
    };
    if p <= 0.0 {
        return first;
    }
    if p >= 100.0 {
        return last;
    }

    let index = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = index - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Sample standard deviation (Bessel corrected), 0 when fewer than two values.
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

pub fn adjust_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        return 0.0;
    }
    let rate = rate.clamp(0.0, 1.0);
    if rate < RATE_EPSILON {
        0.0
    } else {
        rate
    }
}

/// `count / total` rounded to six decimals, then clamped.
pub fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = count as f64 / total as f64;
    adjust_rate((raw * 1e6).round() / 1e6)
}

pub fn rates(counts: &BTreeMap<Conclusion, usize>, total: usize) -> Rate {
    let of = |c: Conclusion| rate(counts.get(&c).copied().unwrap_or(0), total);
    Rate {
        success: of(Conclusion::Success),
        failure: of(Conclusion::Failure),
        others: of(Conclusion::Others),
    }
}

pub fn execution_stats(durations: &[f64]) -> ExecutionStats {
    if durations.is_empty() {
        return ExecutionStats::default();
    }
    let mut sorted = durations.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let avg = mean(&sorted);
    ExecutionStats {
        count: sorted.len(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean: avg,
        median: percentile(&sorted, 50.0),
        p95: percentile(&sorted, 95.0),
        p99: percentile(&sorted, 99.0),
        std_dev: std_dev(&sorted, avg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_between_neighbours() {
        let v = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&v, 50.0), 25.0);
        assert_eq!(percentile(&v, 0.0), 10.0);
        assert_eq!(percentile(&v, 100.0), 40.0);
        assert_eq!(percentile(&v, -5.0), 10.0);
        assert_eq!(percentile(&v, 250.0), 40.0);
    }

    #[test]
    fn empty_inputs_are_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
        assert_eq!(std_dev(&[], 0.0), 0.0);
        assert_eq!(std_dev(&[3.0], 3.0), 0.0);
        assert_eq!(rate(1, 0), 0.0);
    }
}
