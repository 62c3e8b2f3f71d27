//! Sweep ranges for command-line parameter studies.
//!
//! Exposure-time and depth tables are produced by sweeping one parameter
//! (exposure seconds, airmass, rate of motion) over a `start:stop:step`
//! range given on the command line.

use std::fmt;
use std::str::FromStr;

/// Slack allowed when deciding whether the last step lands on `stop`.
const STOP_SLACK: f64 = 1e-9;

/// Longest sweep accepted on the command line.
pub const MAX_RANGE_POINTS: usize = 100_000;

/// Number of values from `start` to `stop`, `stop` included when reached.
fn point_count(start: f64, stop: f64, step: f64) -> f64 {
    ((stop - start) / step + STOP_SLACK).floor() + 1.0
}

/// Parse a `start:stop:step` range.
///
/// The step must be non-zero and point from `start` towards `stop`.
/// `start == stop` is accepted and yields a single value.
///
/// # Examples
/// - `"10:60:10"` - exposure sweep from 10 s to 60 s
/// - `"2.0:1.0:-0.1"` - airmass sweep from 2.0 down to 1.0
pub fn parse_range(s: &str) -> Result<(f64, f64, f64), String> {
    let parts: Vec<&str> = s.split(':').collect();
    let [start, stop, step] = parts.as_slice() else {
        return Err(format!("range '{s}' must be in format 'start:stop:step'"));
    };

    let parse = |label: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid {label} value '{}'", value.trim()))
    };

    let start = parse("start", *start)?;
    let stop = parse("stop", *stop)?;
    let step = parse("step", *step)?;

    if step == 0.0 {
        return Err("step cannot be zero".to_string());
    }
    if (stop - start) * step < 0.0 {
        return Err(format!(
            "step {step} points away from stop ({start} -> {stop})"
        ));
    }
    let points = point_count(start, stop, step);
    if points > MAX_RANGE_POINTS as f64 {
        return Err(format!(
            "range {start}:{stop}:{step} has {points:.0} values, more than {MAX_RANGE_POINTS}"
        ));
    }

    Ok((start, stop, step))
}

/// Parameter sweep range usable directly as a clap argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeArg {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl RangeArg {
    pub fn new(start: f64, stop: f64, step: f64) -> Result<Self, String> {
        parse_range(&format!("{start}:{stop}:{step}"))?;
        Ok(Self { start, stop, step })
    }

    /// Number of values in the sweep, `stop` included when reached.
    pub fn len(&self) -> usize {
        point_count(self.start, self.stop, self.step) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Values of the sweep computed as `start + i * step`.
    ///
    /// Each value is computed from its index, so long sweeps do not
    /// accumulate rounding error.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(move |i| self.start + i as f64 * self.step)
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values().collect()
    }
}

impl FromStr for RangeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, stop, step) = parse_range(s)?;
        Ok(Self { start, stop, step })
    }
}

impl fmt::Display for RangeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.start, self.stop, self.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_valid_ranges() {
        assert_eq!(parse_range("10:60:10").unwrap(), (10.0, 60.0, 10.0));
        assert_eq!(parse_range(" 2.0 : 1.0 : -0.5 ").unwrap(), (2.0, 1.0, -0.5));
        assert_eq!(parse_range("5:5:1").unwrap(), (5.0, 5.0, 1.0));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_range("10:60").is_err());
        assert!(parse_range("10:60:10:5").is_err());
        assert!(parse_range("ten:60:10").is_err());
        assert!(parse_range("10:60:0").is_err());
        assert!(parse_range("60:10:10").is_err());
        assert!(parse_range("10:60:-1").is_err());
        assert!(parse_range("10:inf:1").is_err());
    }

    #[test]
    fn test_exposure_sweep_values() {
        let range: RangeArg = "15:60:15".parse().unwrap();
        assert_eq!(range.to_vec(), vec![15.0, 30.0, 45.0, 60.0]);
        assert_eq!(range.to_string(), "15:60:15");
    }

    #[test]
    fn test_descending_sweep() {
        let range: RangeArg = "2.0:1.0:-0.25".parse().unwrap();
        assert_eq!(range.to_vec(), vec![2.0, 1.75, 1.5, 1.25, 1.0]);
    }

    #[test]
    fn test_fractional_steps_reach_stop() {
        // 0.1 is not exactly representable; the stop value must still appear
        let range: RangeArg = "0.1:0.5:0.1".parse().unwrap();
        let values = range.to_vec();
        assert_eq!(values.len(), 5);
        assert_relative_eq!(values[4], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_inexact_stop_is_not_overshot() {
        let range = RangeArg::new(0.0, 2.1, 0.5).unwrap();
        assert_eq!(range.to_vec(), vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_rejects_overlong_sweeps() {
        assert!(parse_range("1:1e20:1e-10").is_err());
        assert!("1:1e20:1e-10".parse::<RangeArg>().is_err());
        assert!(RangeArg::new(0.0, 1.0, 1e-9).is_err());
        assert_eq!(RangeArg::new(1.0, 100_000.0, 1.0).unwrap().len(), MAX_RANGE_POINTS);
    }

    #[test]
    fn test_single_value_range() {
        let range = RangeArg::new(30.0, 30.0, 5.0).unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range.to_vec(), vec![30.0]);
    }
}
