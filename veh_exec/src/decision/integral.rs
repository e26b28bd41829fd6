//! Integral (I) controller term
//!
//! The accumulation counterpart of [`DifferentialController`], correcting
//! steady-state offset. Supports an optional symmetric windup clamp and an
//! optional reset when the error changes sign.
//!
//! [`DifferentialController`]: super::DifferentialController

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::differential::MAX_VALID_DT_S;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An integral controller with windup protection.
#[derive(Debug, Clone)]
pub struct IntegralController {
    /// Integral gain
    ki: f64,

    /// Symmetric limit on the accumulated integral, `None` for unlimited.
    integral_limit: Option<f64>,

    /// Zero the accumulation when the error crosses zero.
    reset_on_zero_crossing: bool,

    /// Accumulated error integral
    integral: f64,

    /// Previous error sample
    prev_error: Option<f64>,

    /// Time of the previous error sample
    prev_time_s: Option<f64>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl IntegralController {
    /// Create a new controller with the given gain.
    pub fn new(
        ki: f64,
        integral_limit: Option<f64>,
        reset_on_zero_crossing: bool
    ) -> Self {
        Self {
            ki,
            integral_limit,
            reset_on_zero_crossing,
            integral: 0.0,
            prev_error: None,
            prev_time_s: None
        }
    }

    /// Feed in the error at the given time and get the integral term
    /// (`ki * integral`).
    ///
    /// The first call starts the accumulation and returns 0.0. A sample
    /// with a non-positive or stale `dt` updates the stored sample but
    /// leaves the accumulation untouched.
    pub fn update(&mut self, error: f64, now_s: f64) -> f64 {
        let prev_time_s = match self.prev_time_s {
            Some(t) => t,
            None => {
                self.prev_error = Some(error);
                self.prev_time_s = Some(now_s);
                return 0.0;
            }
        };

        let dt = now_s - prev_time_s;
        let prev_error = self.prev_error;

        self.prev_error = Some(error);
        self.prev_time_s = Some(now_s);

        if dt <= 0.0 || dt > MAX_VALID_DT_S {
            return self.ki * self.integral;
        }

        if self.reset_on_zero_crossing {
            if let Some(prev) = prev_error {
                if (prev > 0.0 && error < 0.0) || (prev < 0.0 && error > 0.0) {
                    self.integral = 0.0;
                }
            }
        }

        // Rectangular accumulation
        self.integral += error * dt;

        if let Some(limit) = self.integral_limit {
            self.integral = util::maths::clamp(self.integral, -limit, limit);
        }

        self.ki * self.integral
    }

    /// Clear all state back to initial.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
        self.prev_time_s = None;
    }

    /// The current accumulated integral, without the gain applied.
    pub fn integral(&self) -> f64 {
        self.integral
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_first_sample_returns_zero() {
        let mut ctrl = IntegralController::new(1.0, None, false);
        assert_eq!(ctrl.update(4.0, 0.0), 0.0);
    }

    #[test]
    fn test_accumulation() {
        let mut ctrl = IntegralController::new(2.0, None, false);

        ctrl.update(1.0, 0.0);
        // 1.0 error over 0.5 s: integral 0.5, term 1.0
        assert!((ctrl.update(1.0, 0.5) - 1.0).abs() < 1e-9);
        // another 0.5: integral 1.0, term 2.0
        assert!((ctrl.update(1.0, 1.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_windup_clamp() {
        let mut ctrl = IntegralController::new(1.0, Some(0.3), false);

        ctrl.update(1.0, 0.0);
        ctrl.update(1.0, 0.5);
        ctrl.update(1.0, 1.0);
        assert!((ctrl.integral() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_zero_crossing_reset() {
        let mut ctrl = IntegralController::new(1.0, None, true);

        ctrl.update(1.0, 0.0);
        ctrl.update(1.0, 0.5);
        assert!(ctrl.integral() > 0.0);

        // Error changes sign: accumulation restarts from zero
        ctrl.update(-1.0, 1.0);
        assert!((ctrl.integral() - (-0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_bad_dt_preserves_integral() {
        let mut ctrl = IntegralController::new(1.0, None, false);

        ctrl.update(1.0, 0.0);
        ctrl.update(1.0, 0.5);
        let before = ctrl.integral();

        ctrl.update(1.0, 0.4);
        assert_eq!(ctrl.integral(), before);

        ctrl.update(1.0, 5.0);
        assert_eq!(ctrl.integral(), before);
    }
}
