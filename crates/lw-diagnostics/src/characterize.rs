//! Controller behaviour statistics.

use lw_core::stats::{diff, mean, population_std};
use lw_core::TimeSeries;
use serde::{Deserialize, Serialize};

/// Intervals shorter than this are floored before use.
const MIN_INTERVAL: f64 = 1e-6;

/// Error dispersion below which aggressiveness is reported as zero.
const MIN_ERROR_STD: f64 = 1e-6;

/// Quantified controller behaviour for one series.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControllerStats {
    /// Output movement per minute (sum of |delta output| over duration).
    pub total_variation: f64,
    /// Dispersion of output changes relative to error dispersion.
    ///
    /// Zero when the error has no dispersion. That covers both perfect
    /// control and a frozen sensor; this metric cannot tell them apart.
    pub aggressiveness: f64,
    pub avg_sampling_time: f64,
    pub max_sampling_time: f64,
    /// Elapsed seconds from first to last sample.
    pub duration: f64,
    /// Heuristic 0-100 score of sampling regularity.
    pub data_quality_score: f64,
}

/// Characterize output movement, aggressiveness and sampling quality.
pub fn characterize_controller(series: &TimeSeries) -> ControllerStats {
    let duration = series.duration();
    let op_diff = diff(series.output());

    let total_variation: f64 = op_diff.iter().map(|d| d.abs()).sum();
    let minutes = if duration > 0.0 { duration / 60.0 } else { 1.0 };

    let error_std = population_std(&series.errors());
    let aggressiveness = if error_std < MIN_ERROR_STD {
        0.0
    } else {
        population_std(&op_diff) / error_std
    };

    let intervals: Vec<f64> = series
        .intervals()
        .into_iter()
        .map(|dt| dt.max(MIN_INTERVAL))
        .collect();
    let avg_dt = mean(&intervals);
    let max_dt = intervals.iter().copied().fold(0.0, f64::max);

    let mut score: f64 = 100.0;
    if max_dt > 5.0 * avg_dt {
        score -= 20.0;
    }
    if avg_dt > 10.0 {
        score -= 10.0;
    }

    ControllerStats {
        total_variation: total_variation / minutes,
        aggressiveness,
        avg_sampling_time: avg_dt,
        max_sampling_time: max_dt,
        duration,
        data_quality_score: score.max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_variation_per_minute() {
        // 120 s of 1 s samples, output toggles by 1 each sample.
        let n = 121;
        let t: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let op: Vec<f64> = (0..n).map(|i| (i % 2) as f64).collect();
        let s = TimeSeries::from_columns(&t, &vec![1.0; n], &vec![1.0; n], &op).unwrap();
        let stats = characterize_controller(&s);
        assert!((stats.total_variation - 60.0).abs() < 1e-9);
        assert_eq!(stats.aggressiveness, 0.0);
        assert_eq!(stats.duration, 120.0);
        assert_eq!(stats.data_quality_score, 100.0);
    }

    #[test]
    fn aggressiveness_ratio() {
        let t = [0.0, 1.0, 2.0, 3.0];
        let sp = [0.0; 4];
        let pv = [1.0, -1.0, 1.0, -1.0];
        let op = [0.0, 2.0, 0.0, 2.0];
        let s = TimeSeries::from_columns(&t, &sp, &pv, &op).unwrap();
        let stats = characterize_controller(&s);
        // std(diff op) = std([2, -2, 2]); std(error) = 1
        let expected = population_std(&[2.0, -2.0, 2.0]);
        assert!((stats.aggressiveness - expected).abs() < 1e-12);
    }

    #[test]
    fn irregular_slow_sampling_penalized() {
        let mut t: Vec<f64> = (0..20).map(|i| i as f64 * 11.0).collect();
        t.push(t[19] + 2000.0);
        let n = t.len();
        let s = TimeSeries::from_columns(&t, &vec![0.0; n], &vec![0.0; n], &vec![0.0; n]).unwrap();
        let stats = characterize_controller(&s);
        assert_eq!(stats.max_sampling_time, 2000.0);
        assert_eq!(stats.data_quality_score, 70.0);
    }

    #[test]
    fn single_sample_is_neutral() {
        let s = TimeSeries::from_columns(&[0.0], &[1.0], &[0.0], &[5.0]).unwrap();
        let stats = characterize_controller(&s);
        assert_eq!(stats.total_variation, 0.0);
        assert_eq!(stats.avg_sampling_time, 0.0);
        assert_eq!(stats.duration, 0.0);
        assert_eq!(stats.data_quality_score, 100.0);
    }
}
