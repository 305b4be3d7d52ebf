use serde::{Deserialize, Serialize};

/// Latency statistics for one metric, in milliseconds.
///
/// Percentiles use the nearest-rank method: for `n` sorted samples the `p`th percentile is the
/// sample at rank `ceil(p / 100 * n)`, counting from 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub min: f64,
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
}

impl DurationStats {
    /// Sorts `values` in place and summarises them. Returns `None` when there are no values.
    pub fn from_values(values: &mut [f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        values.sort_unstable_by(f64::total_cmp);

        let sum: f64 = values.iter().sum();
        Some(Self {
            min: values[0],
            mean: sum / values.len() as f64,
            p50: nearest_rank(values, 50.0),
            p90: nearest_rank(values, 90.0),
            p95: nearest_rank(values, 95.0),
            p99: nearest_rank(values, 99.0),
            max: values[values.len() - 1],
        })
    }
}

/// Nearest-rank percentile of already sorted, non-empty values.
pub fn nearest_rank(sorted: &[f64], percentile: f64) -> f64 {
    let n = sorted.len();
    let rank = ((percentile / 100.0) * n as f64).ceil() as usize;
    sorted[rank.clamp(1, n) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_rank_of_one_to_hundred() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();

        assert_eq!(50.0, nearest_rank(&values, 50.0));
        assert_eq!(90.0, nearest_rank(&values, 90.0));
        assert_eq!(95.0, nearest_rank(&values, 95.0));
        assert_eq!(100.0, nearest_rank(&values, 100.0));
        assert_eq!(1.0, nearest_rank(&values, 0.0));
    }

    #[test]
    fn nearest_rank_rounds_up() {
        let values = [10.0, 20.0, 30.0];

        // ceil(0.5 * 3) = 2
        assert_eq!(20.0, nearest_rank(&values, 50.0));
        // ceil(0.9 * 3) = 3
        assert_eq!(30.0, nearest_rank(&values, 90.0));
    }

    #[test]
    fn single_value_is_every_percentile() {
        let stats = DurationStats::from_values(&mut [7.5]).unwrap();

        assert_eq!(7.5, stats.min);
        assert_eq!(7.5, stats.p50);
        assert_eq!(7.5, stats.p99);
        assert_eq!(7.5, stats.max);
        assert_eq!(7.5, stats.mean);
    }

    #[test]
    fn unsorted_input_is_summarised() {
        let mut values = vec![5.0, 1.0, 4.0, 2.0, 3.0];
        let stats = DurationStats::from_values(&mut values).unwrap();

        assert_eq!(1.0, stats.min);
        assert_eq!(5.0, stats.max);
        assert_eq!(3.0, stats.mean);
        assert_eq!(3.0, stats.p50);
        assert_eq!(5.0, stats.p90);
    }

    #[test]
    fn empty_input_has_no_stats() {
        assert!(DurationStats::from_values(&mut []).is_none());
    }
}
