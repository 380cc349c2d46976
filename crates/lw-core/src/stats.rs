//! Descriptive statistics over signal slices.
//!
//! Thin wrappers over `statrs` with the conventions the analyzers rely on:
//! empty or single-sample inputs yield `0.0` dispersion instead of `NaN`, and
//! rolling windows report `None` until a full window is available.

use statrs::statistics::Statistics;

use crate::Real;

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(data: &[Real]) -> Real {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().mean()
}

/// Sample standard deviation (n - 1 denominator); `0.0` below two samples.
pub fn sample_std(data: &[Real]) -> Real {
    if data.len() < 2 {
        return 0.0;
    }
    data.iter().std_dev()
}

/// Population standard deviation (n denominator); `0.0` for an empty slice.
pub fn population_std(data: &[Real]) -> Real {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().population_std_dev()
}

/// Smallest and largest value, or `None` for an empty slice.
pub fn min_max(data: &[Real]) -> Option<(Real, Real)> {
    if data.is_empty() {
        return None;
    }
    let lo = data.iter().copied().fold(Real::INFINITY, Real::min);
    let hi = data.iter().copied().fold(Real::NEG_INFINITY, Real::max);
    Some((lo, hi))
}

/// `max - min`, `0.0` for an empty slice.
pub fn span(data: &[Real]) -> Real {
    min_max(data).map(|(lo, hi)| hi - lo).unwrap_or(0.0)
}

/// First differences `data[i + 1] - data[i]`.
pub fn diff(data: &[Real]) -> Vec<Real> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Centered moving average over an odd `window`.
///
/// Positions closer than `window / 2` to either end have no full window and
/// are reported as `None`.
pub fn centered_rolling_mean(data: &[Real], window: usize) -> Vec<Option<Real>> {
    let half = window / 2;
    (0..data.len())
        .map(|i| {
            if window == 0 || i < half || i + half >= data.len() {
                None
            } else {
                Some(mean(&data[i - half..=i + half]))
            }
        })
        .collect()
}

/// Trailing moving sample standard deviation over `window` samples.
///
/// The first `window - 1` positions are `None`.
pub fn trailing_rolling_std(data: &[Real], window: usize) -> Vec<Option<Real>> {
    (0..data.len())
        .map(|i| {
            if window < 2 || i + 1 < window {
                None
            } else {
                Some(sample_std(&data[i + 1 - window..=i]))
            }
        })
        .collect()
}

/// Ordinary least-squares slope of `ys` against their index `0..n`.
///
/// Returns `0.0` for fewer than two points.
pub fn index_slope(ys: &[Real]) -> Real {
    let n = ys.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as Real / 2.0;
    let y_mean = mean(ys);
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in ys.iter().enumerate() {
        let dx = i as Real - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    num / den
}
