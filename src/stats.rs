//! Descriptive statistics aggregation
//!
//! A single pure entry point, [`aggregate`], computes one statistic over a
//! caller-owned slice of numbers. Nothing is retained between calls, so the
//! functions here may be invoked concurrently without synchronization.
//!
//! # Example
//!
//! ```rust
//! use math_tools_mcp::stats::{aggregate, Operation};
//!
//! let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
//! assert_eq!(aggregate(&xs, Operation::Mean).unwrap(), 3.0);
//! assert_eq!(aggregate(&xs, Operation::Median).unwrap(), 3.0);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::StatsError;

/// Supported aggregation operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Arithmetic mean
    Mean,
    /// Maximum value
    Max,
    /// Minimum value
    Min,
    /// Sample variance (n - 1 denominator)
    Var,
    /// Sample standard deviation
    Stdev,
    /// Median
    Median,
    /// Unique most frequent value
    Mode,
    /// Max minus min
    Range,
    /// Median of the lower half
    Q1,
    /// Median of the upper half
    Q3,
    /// Population skewness scaled by the sample stdev
    Skew,
    /// Excess kurtosis scaled by the sample stdev
    Kurtosis,
}

impl Operation {
    /// Every operation, in the order advertised to clients
    pub const ALL: [Operation; 12] = [
        Operation::Mean,
        Operation::Max,
        Operation::Min,
        Operation::Var,
        Operation::Stdev,
        Operation::Median,
        Operation::Mode,
        Operation::Range,
        Operation::Q1,
        Operation::Q3,
        Operation::Skew,
        Operation::Kurtosis,
    ];

    /// Wire tag for this operation
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Mean => "mean",
            Operation::Max => "max",
            Operation::Min => "min",
            Operation::Var => "var",
            Operation::Stdev => "stdev",
            Operation::Median => "median",
            Operation::Mode => "mode",
            Operation::Range => "range",
            Operation::Q1 => "q1",
            Operation::Q3 => "q3",
            Operation::Skew => "skew",
            Operation::Kurtosis => "kurtosis",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| StatsError::UnsupportedOperation(s.to_string()))
    }
}

/// Compute `op` over `numbers`.
///
/// # Errors
///
/// - [`StatsError::EmptyInput`] if `numbers` is empty (for every operation),
///   or if `q1`/`q3` would take the median of an empty half.
/// - [`StatsError::NoUniqueMode`] if `mode` finds a frequency tie.
/// - [`StatsError::OutOfRange`] if finite inputs produce a statistic too
///   large for an `f64`, such as the variance of `[1e308, -1e308, 0]`.
pub fn aggregate(numbers: &[f64], op: Operation) -> Result<f64, StatsError> {
    if numbers.is_empty() {
        return Err(StatsError::EmptyInput);
    }

    let value = match op {
        Operation::Mean => mean(numbers),
        Operation::Max => max(numbers),
        Operation::Min => min(numbers),
        Operation::Var => sample_variance(numbers),
        Operation::Stdev => sample_stdev(numbers),
        Operation::Median => median(&sorted(numbers))?,
        Operation::Mode => mode(numbers)?,
        Operation::Range => max(numbers) - min(numbers),
        Operation::Q1 => {
            let sorted = sorted(numbers);
            let mid = sorted.len() / 2;
            median(&sorted[..mid])?
        }
        Operation::Q3 => {
            let sorted = sorted(numbers);
            let n = sorted.len();
            let mid = n / 2;
            let start = if n % 2 == 0 { mid } else { mid + 1 };
            median(&sorted[start..])?
        }
        Operation::Skew => {
            if is_degenerate(numbers, 3) {
                0.0
            } else {
                standardized_moment(numbers, 3)
            }
        }
        Operation::Kurtosis => {
            if is_degenerate(numbers, 4) {
                0.0
            } else {
                standardized_moment(numbers, 4) - 3.0
            }
        }
    };

    if !value.is_finite() && numbers.iter().all(|x| x.is_finite()) {
        return Err(StatsError::OutOfRange);
    }
    Ok(value)
}

/// Like [`aggregate`], but takes the operation as its wire tag.
///
/// Emptiness is checked before the tag, so `aggregate_str(&[], "bogus")`
/// reports [`StatsError::EmptyInput`].
pub fn aggregate_str(numbers: &[f64], op: &str) -> Result<f64, StatsError> {
    if numbers.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    aggregate(numbers, op.parse()?)
}

fn mean(xs: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let sum = xs.iter().sum::<f64>();
    if sum.is_finite() {
        sum / n
    } else {
        // The running sum overflowed; the mean itself cannot
        xs.iter().map(|x| x / n).sum()
    }
}

fn max(xs: &[f64]) -> f64 {
    xs.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min(xs: &[f64]) -> f64 {
    xs.iter().copied().fold(f64::INFINITY, f64::min)
}

fn sample_variance(xs: &[f64]) -> f64 {
    let n = xs.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

fn sample_stdev(xs: &[f64]) -> f64 {
    let var = sample_variance(xs);
    if var.is_finite() {
        return var.sqrt();
    }
    let m = mean(xs);
    let scale = max_deviation(xs, m);
    let s = xs.iter().map(|x| ((x - m) / scale).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    scale * s.sqrt()
}

fn max_deviation(xs: &[f64], m: f64) -> f64 {
    xs.iter().map(|x| (x - m).abs()).fold(0.0, f64::max)
}

fn sorted(xs: &[f64]) -> Vec<f64> {
    let mut v = xs.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

/// Median of an already sorted slice.
fn median(sorted: &[f64]) -> Result<f64, StatsError> {
    let n = sorted.len();
    if n == 0 {
        return Err(StatsError::EmptyInput);
    }
    let mid = n / 2;
    if n % 2 == 1 {
        Ok(sorted[mid])
    } else {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

fn mode(xs: &[f64]) -> Result<f64, StatsError> {
    let sorted = sorted(xs);

    let mut best = sorted[0];
    let mut best_count = 0usize;
    let mut tied = false;

    // total_cmp puts -0.0 next to 0.0, so equal values always form one run
    let mut start = 0;
    while start < sorted.len() {
        let value = sorted[start];
        let mut end = start + 1;
        while end < sorted.len() && sorted[end] == value {
            end += 1;
        }
        let count = end - start;
        if count > best_count {
            best = value;
            best_count = count;
            tied = false;
        } else if count == best_count {
            tied = true;
        }
        start = end;
    }

    if tied {
        Err(StatsError::NoUniqueMode)
    } else {
        Ok(best)
    }
}

fn is_degenerate(xs: &[f64], min_len: usize) -> bool {
    xs.len() < min_len || sample_stdev(xs) == 0.0
}

/// `(Σ(x - mean)^k / n) / stdev^k` using the sample stdev.
fn standardized_moment(xs: &[f64], k: i32) -> f64 {
    let n = xs.len() as f64;
    let m = mean(xs);
    let sd = sample_stdev(xs);
    let direct = xs.iter().map(|x| (x - m).powi(k)).sum::<f64>() / n / sd.powi(k);
    if direct.is_finite() {
        direct
    } else {
        xs.iter().map(|x| ((x - m) / sd).powi(k)).sum::<f64>() / n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const XS: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];

    #[test]
    fn test_operation_round_trips_through_tag() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
        assert_eq!(Operation::Kurtosis.to_string(), "kurtosis");
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(
            "bogus_op".parse::<Operation>(),
            Err(StatsError::UnsupportedOperation("bogus_op".to_string()))
        );
        // Tags are case sensitive
        assert!("MEAN".parse::<Operation>().is_err());
    }

    #[test]
    fn test_basic_statistics() {
        assert_eq!(aggregate(&XS, Operation::Mean).unwrap(), 3.0);
        assert_eq!(aggregate(&XS, Operation::Max).unwrap(), 5.0);
        assert_eq!(aggregate(&XS, Operation::Min).unwrap(), 1.0);
        assert_eq!(aggregate(&XS, Operation::Range).unwrap(), 4.0);
        assert_eq!(aggregate(&XS, Operation::Median).unwrap(), 3.0);
        assert_eq!(aggregate(&XS, Operation::Var).unwrap(), 2.5);
        assert_relative_eq!(aggregate(&XS, Operation::Stdev).unwrap(), 2.5f64.sqrt());
    }

    #[test]
    fn test_median_even() {
        assert_eq!(aggregate(&[4.0, 1.0, 3.0, 2.0], Operation::Median).unwrap(), 2.5);
    }

    #[test]
    fn test_single_value_spread_is_zero() {
        assert_eq!(aggregate(&[1.0], Operation::Var).unwrap(), 0.0);
        assert_eq!(aggregate(&[1.0], Operation::Stdev).unwrap(), 0.0);
    }

    #[test]
    fn test_quartiles_even() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(aggregate(&xs, Operation::Q1).unwrap(), 1.5);
        assert_eq!(aggregate(&xs, Operation::Q3).unwrap(), 3.5);
    }

    #[test]
    fn test_quartiles_odd_exclude_middle() {
        // lower = [1, 2], upper = [4, 5]
        assert_eq!(aggregate(&XS, Operation::Q1).unwrap(), 1.5);
        assert_eq!(aggregate(&XS, Operation::Q3).unwrap(), 4.5);

        // lower = [1, 2, 3], upper = [5, 6, 7]
        let xs = [7.0, 1.0, 6.0, 2.0, 4.0, 3.0, 5.0];
        assert_eq!(aggregate(&xs, Operation::Q1).unwrap(), 2.0);
        assert_eq!(aggregate(&xs, Operation::Q3).unwrap(), 6.0);
    }

    #[test]
    fn test_quartiles_single_value_has_empty_half() {
        assert_eq!(aggregate(&[1.0], Operation::Q1), Err(StatsError::EmptyInput));
        assert_eq!(aggregate(&[1.0], Operation::Q3), Err(StatsError::EmptyInput));
    }

    #[test]
    fn test_mode() {
        assert_eq!(aggregate(&[1.0, 1.0, 2.0], Operation::Mode).unwrap(), 1.0);
        assert_eq!(aggregate(&[3.0, 2.0, 3.0, 1.0], Operation::Mode).unwrap(), 3.0);
        assert_eq!(aggregate(&[7.0], Operation::Mode).unwrap(), 7.0);
        assert_eq!(
            aggregate(&[1.0, 2.0], Operation::Mode),
            Err(StatsError::NoUniqueMode)
        );
        assert_eq!(
            aggregate(&[1.0, 1.0, 2.0, 2.0, 3.0], Operation::Mode),
            Err(StatsError::NoUniqueMode)
        );
    }

    #[test]
    fn test_mode_treats_signed_zeros_as_equal() {
        assert_eq!(aggregate(&[-0.0, 0.0, 1.0], Operation::Mode).unwrap(), 0.0);
    }

    #[test]
    fn test_constant_series_has_zero_shape() {
        let xs = [2.0, 2.0, 2.0, 2.0];
        assert_eq!(aggregate(&xs, Operation::Skew).unwrap(), 0.0);
        assert_eq!(aggregate(&xs, Operation::Kurtosis).unwrap(), 0.0);
    }

    #[test]
    fn test_short_series_has_zero_shape() {
        assert_eq!(aggregate(&[1.0, 5.0], Operation::Skew).unwrap(), 0.0);
        assert_eq!(aggregate(&[1.0, 2.0, 9.0], Operation::Kurtosis).unwrap(), 0.0);
    }

    #[test]
    fn test_skew_and_kurtosis() {
        // Symmetric data has zero skew
        assert_relative_eq!(aggregate(&XS, Operation::Skew).unwrap(), 0.0);

        // mean = 4, sample var = 50/3, Σd³ = 180
        let xs = [1.0, 2.0, 3.0, 10.0];
        let sd = (50.0f64 / 3.0).sqrt();
        assert_relative_eq!(
            aggregate(&xs, Operation::Skew).unwrap(),
            180.0 / 4.0 / sd.powi(3),
            epsilon = 1e-12
        );

        // Σd⁴ = 81 + 16 + 1 + 1296 = 1394
        assert_relative_eq!(
            aggregate(&xs, Operation::Kurtosis).unwrap(),
            1394.0 / 4.0 / sd.powi(4) - 3.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_huge_values_do_not_overflow() {
        assert_eq!(aggregate(&[1e308, 1e308], Operation::Mean).unwrap(), 1e308);
        assert_relative_eq!(
            aggregate(&[1e308, 1e308, -1e308], Operation::Mean).unwrap(),
            1e308 / 3.0
        );
        assert_eq!(aggregate(&[1e308, 1e308], Operation::Var).unwrap(), 0.0);

        // var = 1e616 does not fit, its square root does
        let xs = [1e308, -1e308, 0.0];
        assert_eq!(aggregate(&xs, Operation::Var), Err(StatsError::OutOfRange));
        assert_relative_eq!(aggregate(&xs, Operation::Stdev).unwrap(), 1e308);
        assert_relative_eq!(aggregate(&xs, Operation::Skew).unwrap(), 0.0);

        let xs = [1e300, 2e300, 3e300, 1e301];
        assert_relative_eq!(
            aggregate(&xs, Operation::Skew).unwrap(),
            aggregate(&[1.0, 2.0, 3.0, 10.0], Operation::Skew).unwrap(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_range_overflow_is_out_of_range() {
        assert_eq!(
            aggregate(&[f64::MAX, -f64::MAX], Operation::Range),
            Err(StatsError::OutOfRange)
        );
    }

    #[test]
    fn test_empty_input_for_every_operation() {
        for op in Operation::ALL {
            assert_eq!(aggregate(&[], op), Err(StatsError::EmptyInput), "{op}");
        }
    }

    #[test]
    fn test_aggregate_str() {
        assert_eq!(aggregate_str(&XS, "mean").unwrap(), 3.0);
        assert_eq!(
            aggregate_str(&XS, "bogus_op"),
            Err(StatsError::UnsupportedOperation("bogus_op".to_string()))
        );
        assert_eq!(aggregate_str(&[], "bogus_op"), Err(StatsError::EmptyInput));
    }
}
