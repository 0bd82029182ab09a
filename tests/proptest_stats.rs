//! Property-based testing for the statistics aggregator.
//!
//! Uses proptest to generate arbitrary number lists and verify the
//! invariants every aggregation must hold.

use math_tools_mcp::stats::{aggregate, aggregate_str, Operation};
use math_tools_mcp::StatsError;
use proptest::prelude::*;

// ============================================================================
// STRATEGIES
// ============================================================================

/// Strategy for generating finite, moderately sized values
pub fn arb_value() -> impl Strategy<Value = f64> {
    -1.0e6f64..1.0e6
}

/// Strategy for generating non-empty number lists
pub fn arb_numbers() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_value(), 1..64)
}

/// Strategy for generating any supported operation
pub fn arb_operation() -> impl Strategy<Value = Operation> {
    prop::sample::select(Operation::ALL.to_vec())
}

/// Strategy for generating tags that are not operations
pub fn arb_unknown_tag() -> impl Strategy<Value = String> {
    "[a-z_]{1,12}".prop_filter("must not be a real operation", |s| {
        s.parse::<Operation>().is_err()
    })
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_max_not_below_min(xs in arb_numbers()) {
        let max = aggregate(&xs, Operation::Max).unwrap();
        let min = aggregate(&xs, Operation::Min).unwrap();
        prop_assert!(max >= min);
    }

    #[test]
    fn prop_range_is_max_minus_min(xs in arb_numbers()) {
        let max = aggregate(&xs, Operation::Max).unwrap();
        let min = aggregate(&xs, Operation::Min).unwrap();
        prop_assert_eq!(aggregate(&xs, Operation::Range).unwrap(), max - min);
    }

    #[test]
    fn prop_central_values_within_bounds(xs in arb_numbers()) {
        let max = aggregate(&xs, Operation::Max).unwrap();
        let min = aggregate(&xs, Operation::Min).unwrap();
        let slack = 1e-9 * (max.abs() + min.abs() + 1.0);
        for op in [Operation::Mean, Operation::Median] {
            let v = aggregate(&xs, op).unwrap();
            prop_assert!(v >= min - slack && v <= max + slack, "{} = {}", op, v);
        }
    }

    #[test]
    fn prop_spread_is_non_negative(xs in arb_numbers()) {
        prop_assert!(aggregate(&xs, Operation::Var).unwrap() >= 0.0);
        prop_assert!(aggregate(&xs, Operation::Stdev).unwrap() >= 0.0);
    }

    #[test]
    fn prop_quartiles_ordered(xs in prop::collection::vec(arb_value(), 2..64)) {
        let q1 = aggregate(&xs, Operation::Q1).unwrap();
        let median = aggregate(&xs, Operation::Median).unwrap();
        let q3 = aggregate(&xs, Operation::Q3).unwrap();
        prop_assert!(q1 <= median && median <= q3);
    }

    #[test]
    fn prop_empty_input_always_rejected(op in arb_operation()) {
        prop_assert_eq!(aggregate(&[], op), Err(StatsError::EmptyInput));
    }

    #[test]
    fn prop_unknown_tag_rejected(xs in arb_numbers(), tag in arb_unknown_tag()) {
        prop_assert_eq!(
            aggregate_str(&xs, &tag),
            Err(StatsError::UnsupportedOperation(tag.clone()))
        );
    }

    #[test]
    fn prop_deterministic(xs in arb_numbers(), op in arb_operation()) {
        prop_assert_eq!(aggregate(&xs, op), aggregate(&xs, op));
    }

    #[test]
    fn prop_order_independent(xs in arb_numbers(), op in arb_operation()) {
        // Summation order changes the rounding of the moment-based statistics
        prop_assume!(matches!(
            op,
            Operation::Max | Operation::Min | Operation::Range | Operation::Median
                | Operation::Mode | Operation::Q1 | Operation::Q3
        ));
        let mut reversed = xs.clone();
        reversed.reverse();
        prop_assert_eq!(aggregate(&xs, op), aggregate(&reversed, op));
    }

    #[test]
    fn prop_constant_series_has_zero_shape(v in -1000i32..1000, n in 1usize..32) {
        // Integer values keep the running sum exact, so the mean is exactly v
        let v = f64::from(v);
        let xs = vec![v; n];
        prop_assert_eq!(aggregate(&xs, Operation::Var).unwrap(), 0.0);
        prop_assert_eq!(aggregate(&xs, Operation::Skew).unwrap(), 0.0);
        prop_assert_eq!(aggregate(&xs, Operation::Kurtosis).unwrap(), 0.0);
        prop_assert_eq!(aggregate(&xs, Operation::Mode).unwrap(), v);
    }
}
