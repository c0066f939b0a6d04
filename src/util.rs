/// Asserts that a numerical value is in the provided interval `[a,b]` and panics
/// with a helpful message if not
///
/// ### Example
/// ```should_panic
/// # use rl_heads::assert_interval;
/// let tau = 2.0;
/// assert_interval!(tau, 0.0, 1.0);
/// ```
/// This panics with the message "Invalid value for \`tau\`. Must be in the interval \[0, 1\], got 2."
#[macro_export]
macro_rules! assert_interval {
    ($var:expr, $a:expr, $b:expr) => {
        assert!(
            $var >= $a && $var <= $b,
            "Invalid value for `{}`. Must be in the interval [{}, {}], got {}.",
            stringify!($var),
            $a,
            $b,
            $var,
        );
    };
}
