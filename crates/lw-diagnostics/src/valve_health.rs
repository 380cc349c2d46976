//! Valve mechanics analysis from output/measurement co-movement.
//!
//! Output travel is split into the ten 0-100 % opening deciles. Local gain
//! (measurement span over output span) in each sufficiently exercised bin
//! gives linearity and erosion indicators, and a stiction-candidate
//! histogram over the same bins locates sticky regions of travel.

use std::ops::Range;

use lw_core::stats::{mean, min_max, population_std};
use lw_core::TimeSeries;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::stiction::stiction_candidates;

const BIN_COUNT: usize = 10;
/// Width of one opening decile, in percent.
const BIN_WIDTH: f64 = 100.0 / BIN_COUNT as f64;
/// Samples a bin needs (strictly more than) before its gain is trusted.
const MIN_BIN_SAMPLES: usize = 10;
/// Output span a bin needs (strictly more than) before its gain is trusted.
const MIN_BIN_SPAN: f64 = 0.5;
/// Bins centred below this output are "low opening" for erosion.
const LOW_OPENING: f64 = 15.0;
const EROSION_RATIO: f64 = 1.5;
const ZONE_SHARE: f64 = 0.1;
const MIN_ZONE_SAMPLES: usize = 5;
/// Mean bin gain below this means the measurement does not follow the output.
const MIN_RESPONSE_GAIN: f64 = 1e-9;

/// Closed output interval `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputRange {
    pub low: f64,
    pub high: f64,
}

impl OutputRange {
    pub fn centre(&self) -> f64 {
        0.5 * (self.low + self.high)
    }

    pub fn overlaps(&self, other: &OutputRange) -> bool {
        self.low <= other.high && other.low <= self.high
    }
}

/// Local gain estimate for one output bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinGain {
    pub range: OutputRange,
    pub gain: f64,
    pub samples: usize,
}

/// Outcome of [`analyze_valve_health`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValveHealthReport {
    /// 0-100; 100 means every usable bin shows the same non-zero gain.
    pub linearity_score: f64,
    /// Mean of the usable bin gains.
    pub avg_gain: f64,
    /// Gains of bins with enough movement, in increasing output order.
    pub gain_by_output_bin: Vec<BinGain>,
    /// Merged output intervals where stiction candidates concentrate.
    pub stiction_zones: Vec<OutputRange>,
    pub erosion_risk: bool,
    pub suggestions: Vec<String>,
}

/// Opening decile of an output value; values outside 0-100 land in the end bins.
fn bin_index(value: f64) -> usize {
    ((value / BIN_WIDTH).floor().max(0.0) as usize).min(BIN_COUNT - 1)
}

/// Output interval covered by a run of deciles.
fn bin_range(bins: Range<usize>) -> OutputRange {
    OutputRange {
        low: bins.start as f64 * BIN_WIDTH,
        high: bins.end as f64 * BIN_WIDTH,
    }
}

/// Analyze valve linearity, erosion risk and stiction zones.
pub fn analyze_valve_health(series: &TimeSeries) -> ValveHealthReport {
    let op = series.output();
    let pv = series.measurement();

    let mut report = ValveHealthReport {
        gain_by_output_bin: bin_gains(op, pv),
        ..ValveHealthReport::default()
    };

    let gains: Vec<f64> = report.gain_by_output_bin.iter().map(|b| b.gain).collect();
    if gains.is_empty() {
        report.suggestions.push(
            "Insufficient output movement to assess valve characteristics; \
             exercise the valve over a wider range"
                .to_string(),
        );
    } else if mean(&gains).abs() < MIN_RESPONSE_GAIN {
        report.suggestions.push(
            "Measurement does not respond to output movement: \
             check for a stuck valve, a broken linkage or a failed sensor"
                .to_string(),
        );
    } else {
        report.avg_gain = mean(&gains);
        let cv = population_std(&gains) / report.avg_gain.abs();
        report.linearity_score = (100.0 * (1.0 - cv)).max(0.0);

        let low_gains: Vec<f64> = report
            .gain_by_output_bin
            .iter()
            .filter(|b| b.range.centre() < LOW_OPENING)
            .map(|b| b.gain)
            .collect();
        report.erosion_risk =
            !low_gains.is_empty() && mean(&low_gains) > EROSION_RATIO * report.avg_gain;
    }

    report.stiction_zones = stiction_zones(op, pv);

    if report.erosion_risk {
        report.suggestions.push(
            "Gain at low opening is well above average: possible trim erosion, \
             inspect the valve seat"
                .to_string(),
        );
    }
    if report.avg_gain != 0.0 && report.linearity_score < 60.0 {
        report.suggestions.push(format!(
            "Valve characteristic is strongly nonlinear (linearity {:.0}/100): \
             consider gain scheduling or a characterizer",
            report.linearity_score
        ));
    }
    for zone in &report.stiction_zones {
        report.suggestions.push(format!(
            "Localized stiction between {:.1} and {:.1} output: schedule valve maintenance",
            zone.low, zone.high
        ));
    }

    debug!(
        linearity = report.linearity_score,
        avg_gain = report.avg_gain,
        zones = report.stiction_zones.len(),
        erosion = report.erosion_risk,
        "valve health analyzed"
    );
    report
}

fn bin_gains(op: &[f64], pv: &[f64]) -> Vec<BinGain> {
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); BIN_COUNT];
    for (i, &u) in op.iter().enumerate() {
        members[bin_index(u)].push(i);
    }

    members
        .iter()
        .enumerate()
        .filter(|(_, idx)| idx.len() > MIN_BIN_SAMPLES)
        .filter_map(|(b, idx)| {
            let ops: Vec<f64> = idx.iter().map(|&i| op[i]).collect();
            let pvs: Vec<f64> = idx.iter().map(|&i| pv[i]).collect();
            let (op_lo, op_hi) = min_max(&ops)?;
            let (pv_lo, pv_hi) = min_max(&pvs)?;
            let op_span = op_hi - op_lo;
            (op_span > MIN_BIN_SPAN).then(|| BinGain {
                range: bin_range(b..b + 1),
                gain: (pv_hi - pv_lo) / op_span,
                samples: idx.len(),
            })
        })
        .collect()
}

fn stiction_zones(op: &[f64], pv: &[f64]) -> Vec<OutputRange> {
    let op_range = match min_max(op) {
        Some((lo, hi)) if hi - lo >= 1e-6 => hi - lo,
        _ => 1.0,
    };
    let pv_range = min_max(pv).map(|(lo, hi)| hi - lo).unwrap_or(0.0).max(1.0);

    let mask = stiction_candidates(op, pv, 0.005 * op_range, 0.001 * pv_range);
    let mut histogram = [0usize; BIN_COUNT];
    let mut total = 0usize;
    for (&u, _) in op.iter().zip(&mask).filter(|(_, m)| **m) {
        histogram[bin_index(u)] += 1;
        total += 1;
    }
    if total == 0 {
        return Vec::new();
    }

    let sticky: Vec<bool> = histogram
        .iter()
        .map(|&c| c as f64 > ZONE_SHARE * total as f64 && c > MIN_ZONE_SAMPLES)
        .collect();

    let mut zones = Vec::new();
    let mut start: Option<usize> = None;
    for (b, &is_sticky) in sticky.iter().enumerate() {
        match (is_sticky, start) {
            (true, None) => start = Some(b),
            (false, Some(s)) => {
                zones.push(bin_range(s..b));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        zones.push(bin_range(s..BIN_COUNT));
    }
    zones
}
