//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Clamp a value into the range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 1f64), (0f64, 100f64), 0.5), 50f64);
        assert_eq!(lin_map((0f64, 1f64), (1500f64, 1300f64), 1.0), 1300f64);
        assert_eq!(lin_map((0f64, 1f64), (1500f64, 1700f64), 0.0), 1500f64);
        assert_eq!(lin_map((-1f64, 1f64), (-10f64, 10f64), 0.25), 2.5f64);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(1.5f64, -1f64, 1f64), 1f64);
        assert_eq!(clamp(-1.5f64, -1f64, 1f64), -1f64);
        assert_eq!(clamp(0.3f64, -1f64, 1f64), 0.3f64);
    }
}
