//! Custom test assertions

/// Assert two values are approximately equal (for floats)
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr) => {
        assert_approx_eq!($left, $right, 1e-6_f64)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {
        let left_val: f64 = $left as f64;
        let right_val: f64 = $right as f64;
        let diff = (left_val - right_val).abs();
        assert!(
            diff < $epsilon,
            "assertion failed: `(left ~ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` (epsilon: `{:?}`)",
            left_val,
            right_val,
            diff,
            $epsilon
        );
    };
}

/// Assert a share of selections lies in a range
#[macro_export]
macro_rules! assert_share_between {
    ($count:expr, $total:expr, $low:expr, $high:expr) => {
        let share = $count as f64 / $total as f64;
        assert!(
            share >= $low && share <= $high,
            "share {:.3} not in [{}, {}]",
            share,
            $low,
            $high
        );
    };
}
