//! Validated control-loop time series.
//!
//! A [`TimeSeries`] holds `(time, setpoint, measurement, output)` samples with
//! strictly increasing timestamps expressed as seconds since the first sample.
//! Every analysis in loopwise consumes this type; construction is the single
//! place where shape and finiteness are checked.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::Real;

/// One logged control-loop sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Timestamp in seconds.
    pub time: Real,
    /// Setpoint (SP).
    pub setpoint: Real,
    /// Measured process variable (PV).
    pub measurement: Real,
    /// Controller output (OP).
    pub output: Real,
}

impl Sample {
    pub fn new(time: Real, setpoint: Real, measurement: Real, output: Real) -> Self {
        Self {
            time,
            setpoint,
            measurement,
            output,
        }
    }
}

/// Non-empty, time-ordered series of samples.
///
/// Stored column-wise; times are rebased so the first sample sits at `0.0`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Sample>", into = "Vec<Sample>")
)]
pub struct TimeSeries {
    time: Vec<Real>,
    setpoint: Vec<Real>,
    measurement: Vec<Real>,
    output: Vec<Real>,
}

impl TimeSeries {
    /// Validate and build a series from samples.
    ///
    /// # Errors
    ///
    /// Fails on an empty input, any non-finite field, or a timestamp that
    /// does not strictly exceed its predecessor.
    pub fn new(samples: Vec<Sample>) -> CoreResult<Self> {
        let first = samples.first().ok_or(CoreError::EmptySeries)?;
        let t0 = first.time;

        let mut series = Self {
            time: Vec::with_capacity(samples.len()),
            setpoint: Vec::with_capacity(samples.len()),
            measurement: Vec::with_capacity(samples.len()),
            output: Vec::with_capacity(samples.len()),
        };

        for (index, s) in samples.iter().enumerate() {
            check_finite("time", index, s.time)?;
            check_finite("setpoint", index, s.setpoint)?;
            check_finite("measurement", index, s.measurement)?;
            check_finite("output", index, s.output)?;

            if index > 0 {
                let previous = samples[index - 1].time;
                if s.time <= previous {
                    return Err(CoreError::NonIncreasingTime {
                        index,
                        previous,
                        current: s.time,
                    });
                }
            }

            series.time.push(s.time - t0);
            series.setpoint.push(s.setpoint);
            series.measurement.push(s.measurement);
            series.output.push(s.output);
        }

        Ok(series)
    }

    /// Build a series from parallel columns.
    pub fn from_columns(
        time: &[Real],
        setpoint: &[Real],
        measurement: &[Real],
        output: &[Real],
    ) -> CoreResult<Self> {
        check_len("setpoint", time.len(), setpoint.len())?;
        check_len("measurement", time.len(), measurement.len())?;
        check_len("output", time.len(), output.len())?;

        let samples = (0..time.len())
            .map(|i| Sample::new(time[i], setpoint[i], measurement[i], output[i]))
            .collect();
        Self::new(samples)
    }

    /// Build a series from wall-clock timestamps.
    ///
    /// Elapsed seconds are derived from the first timestamp.
    pub fn from_timestamps(
        stamps: &[DateTime<Utc>],
        setpoint: &[Real],
        measurement: &[Real],
        output: &[Real],
    ) -> CoreResult<Self> {
        let first = *stamps.first().ok_or(CoreError::EmptySeries)?;
        let time: Vec<Real> = stamps
            .iter()
            .map(|ts| {
                let delta = *ts - first;
                delta
                    .num_microseconds()
                    .map(|us| us as Real * 1e-6)
                    .unwrap_or_else(|| delta.num_milliseconds() as Real * 1e-3)
            })
            .collect();
        Self::from_columns(&time, setpoint, measurement, output)
    }

    /// Number of samples (always at least one).
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Always `false`; a validated series holds at least one sample.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Seconds since the first sample.
    pub fn times(&self) -> &[Real] {
        &self.time
    }

    pub fn setpoint(&self) -> &[Real] {
        &self.setpoint
    }

    pub fn measurement(&self) -> &[Real] {
        &self.measurement
    }

    pub fn output(&self) -> &[Real] {
        &self.output
    }

    /// Control error `setpoint - measurement` per sample.
    pub fn errors(&self) -> Vec<Real> {
        self.setpoint
            .iter()
            .zip(&self.measurement)
            .map(|(sp, pv)| sp - pv)
            .collect()
    }

    /// Elapsed time from first to last sample (seconds).
    pub fn duration(&self) -> Real {
        self.time.last().copied().unwrap_or(0.0)
    }

    /// Consecutive sampling intervals (`len - 1` entries).
    pub fn intervals(&self) -> Vec<Real> {
        crate::stats::diff(&self.time)
    }

    pub fn sample(&self, index: usize) -> Option<Sample> {
        (index < self.len()).then(|| {
            Sample::new(
                self.time[index],
                self.setpoint[index],
                self.measurement[index],
                self.output[index],
            )
        })
    }

    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.len()).map(|i| {
            Sample::new(
                self.time[i],
                self.setpoint[i],
                self.measurement[i],
                self.output[i],
            )
        })
    }
}

impl TryFrom<Vec<Sample>> for TimeSeries {
    type Error = CoreError;

    fn try_from(samples: Vec<Sample>) -> CoreResult<Self> {
        Self::new(samples)
    }
}

impl From<TimeSeries> for Vec<Sample> {
    fn from(series: TimeSeries) -> Self {
        series.samples().collect()
    }
}

fn check_finite(field: &'static str, index: usize, value: Real) -> CoreResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CoreError::NonFinite {
            field,
            index,
            value,
        })
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> CoreResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(CoreError::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rebases_time_to_first_sample() {
        let series = TimeSeries::from_columns(
            &[10.0, 11.0, 12.5],
            &[1.0, 1.0, 1.0],
            &[0.0, 0.5, 0.9],
            &[5.0, 5.0, 5.0],
        )
        .unwrap();
        assert_eq!(series.times(), &[0.0, 1.0, 2.5]);
        assert_eq!(series.duration(), 2.5);
        assert_eq!(series.errors(), vec![1.0, 0.5, 0.09999999999999998]);
        assert_eq!(series.intervals(), vec![1.0, 1.5]);
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(TimeSeries::new(vec![]).unwrap_err(), CoreError::EmptySeries);
    }

    #[test]
    fn rejects_non_increasing_time() {
        let err = TimeSeries::from_columns(
            &[0.0, 1.0, 1.0],
            &[0.0; 3],
            &[0.0; 3],
            &[0.0; 3],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::NonIncreasingTime { index: 2, .. }));
    }

    #[test]
    fn rejects_non_finite_field() {
        let err = TimeSeries::from_columns(
            &[0.0, 1.0],
            &[0.0, 0.0],
            &[0.0, Real::NAN],
            &[0.0, 0.0],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::NonFinite {
                field: "measurement",
                index: 1,
                ..
            }
        ));
    }

    #[test]
    fn rejects_mismatched_columns() {
        let err = TimeSeries::from_columns(&[0.0, 1.0], &[0.0], &[0.0, 0.0], &[0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, CoreError::LengthMismatch { what: "setpoint", .. }));
    }

    #[test]
    fn wall_clock_timestamps() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let stamps = [
            t0,
            t0 + chrono::Duration::seconds(1),
            t0 + chrono::Duration::milliseconds(2500),
        ];
        let series =
            TimeSeries::from_timestamps(&stamps, &[1.0; 3], &[1.0; 3], &[0.0; 3]).unwrap();
        assert_eq!(series.times(), &[0.0, 1.0, 2.5]);
    }

    #[test]
    fn sample_access() {
        let series =
            TimeSeries::from_columns(&[0.0, 1.0], &[2.0, 3.0], &[4.0, 5.0], &[6.0, 7.0]).unwrap();
        assert_eq!(series.sample(1), Some(Sample::new(1.0, 3.0, 5.0, 7.0)));
        assert_eq!(series.sample(2), None);
        assert_eq!(series.samples().count(), 2);
    }
}
