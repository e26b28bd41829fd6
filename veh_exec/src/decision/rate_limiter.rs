//! Steering rate limiter
//!
//! Bounds how fast the steering demand may change between consecutive
//! decisions, regardless of which decision branch produced the target.

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Limits the slew rate of a demand signal.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Maximum change of the demand per second.
    max_rate: f64,

    /// Previously emitted demand
    prev_value: Option<f64>,

    /// Time of the previously emitted demand
    prev_time_s: Option<f64>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RateLimiter {
    /// Create a new limiter with the given maximum rate per second.
    pub fn new(max_rate: f64) -> Self {
        Self {
            max_rate,
            prev_value: None,
            prev_time_s: None
        }
    }

    /// Limit the target demand at the given time.
    ///
    /// Must be called exactly once per decision. The first call seeds the
    /// limiter with the target and returns it unclamped. A non-positive
    /// `dt` allows no change and returns the previous demand.
    pub fn apply(&mut self, target: f64, now_s: f64) -> f64 {
        let (prev_value, prev_time_s) = match (self.prev_value, self.prev_time_s) {
            (Some(v), Some(t)) => (v, t),
            _ => {
                self.prev_value = Some(target);
                self.prev_time_s = Some(now_s);
                return target;
            }
        };

        let dt = now_s - prev_time_s;
        self.prev_time_s = Some(now_s);

        if dt <= 0.0 {
            return prev_value;
        }

        let max_delta = self.max_rate * dt;
        let limited = util::maths::clamp(
            target,
            prev_value - max_delta,
            prev_value + max_delta
        );

        self.prev_value = Some(limited);

        limited
    }

    /// Clear all state back to initial.
    pub fn reset(&mut self) {
        self.prev_value = None;
        self.prev_time_s = None;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_first_call_unclamped() {
        let mut limiter = RateLimiter::new(1.0);
        assert_eq!(limiter.apply(0.9, 0.0), 0.9);
    }

    #[test]
    fn test_limits_slew() {
        let mut limiter = RateLimiter::new(1.0);

        limiter.apply(0.0, 0.0);
        // Target jumps to 1.0 but only 0.1 of travel is allowed in 0.1 s
        assert!((limiter.apply(1.0, 0.1) - 0.1).abs() < 1e-9);
        assert!((limiter.apply(1.0, 0.2) - 0.2).abs() < 1e-9);

        // Downward jumps are bounded symmetrically
        assert!((limiter.apply(-1.0, 0.3) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_small_changes_untouched() {
        let mut limiter = RateLimiter::new(10.0);

        limiter.apply(0.0, 0.0);
        assert_eq!(limiter.apply(0.5, 0.1), 0.5);
    }

    #[test]
    fn test_non_positive_dt_holds() {
        let mut limiter = RateLimiter::new(1.0);

        limiter.apply(0.2, 0.0);
        assert_eq!(limiter.apply(1.0, 0.0), 0.2);
        assert_eq!(limiter.apply(1.0, -1.0), 0.2);
    }
}
