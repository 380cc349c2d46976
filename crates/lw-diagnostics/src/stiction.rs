use lw_core::stats::trailing_rolling_std;

/// Window for the rolling dispersion used by both stiction detectors.
pub(crate) const STICTION_WINDOW: usize = 5;

/// Samples where the output is moving while the measurement is flat.
///
/// Both signals use a trailing rolling sample standard deviation; positions
/// without a full window are never candidates.
pub(crate) fn stiction_candidates(
    output: &[f64],
    measurement: &[f64],
    output_moving_above: f64,
    measurement_flat_below: f64,
) -> Vec<bool> {
    let op_std = trailing_rolling_std(output, STICTION_WINDOW);
    let pv_std = trailing_rolling_std(measurement, STICTION_WINDOW);
    op_std
        .iter()
        .zip(&pv_std)
        .map(|(op, pv)| match (op, pv) {
            (Some(op), Some(pv)) => *op > output_moving_above && *pv < measurement_flat_below,
            _ => false,
        })
        .collect()
}
