//! Derivative (D) controller term
//!
//! Computes a smoothed rate-of-change of an error signal. Shares its
//! stale-timestep policy with [`IntegralController`]: a non-positive or
//! over-long `dt` must never be allowed to corrupt the filter state.
//!
//! [`IntegralController`]: super::IntegralController

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A derivative controller with exponential smoothing.
#[derive(Debug, Clone)]
pub struct DifferentialController {
    /// Derivative gain
    kd: f64,

    /// Exponential smoothing factor in [0, 1]. 0 applies no smoothing, 1
    /// holds the previous derivative forever.
    smoothing_factor: f64,

    /// Previous error sample
    prev_error: Option<f64>,

    /// Time of the previous error sample
    prev_time_s: Option<f64>,

    /// Smoothed derivative of the error
    smoothed_derivative: f64
}

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Timesteps longer than this are considered stale and are not fed into the
/// filter.
pub(crate) const MAX_VALID_DT_S: f64 = 1.0;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DifferentialController {
    /// Create a new controller with the given gain and smoothing factor.
    ///
    /// The smoothing factor is clamped into [0, 1].
    pub fn new(kd: f64, smoothing_factor: f64) -> Self {
        Self {
            kd,
            smoothing_factor: util::maths::clamp(smoothing_factor, 0.0, 1.0),
            prev_error: None,
            prev_time_s: None,
            smoothed_derivative: 0.0
        }
    }

    /// Feed in the error at the given time and get the derivative term
    /// (`kd * smoothed_derivative`).
    ///
    /// The first call stores the sample and returns 0.0, as no derivative
    /// is defined yet. A sample with a non-positive or stale `dt` updates
    /// the stored sample but returns the previous smoothed term unchanged.
    pub fn update(&mut self, error: f64, now_s: f64) -> f64 {
        let (prev_error, prev_time_s) = match (self.prev_error, self.prev_time_s) {
            (Some(e), Some(t)) => (e, t),
            _ => {
                self.prev_error = Some(error);
                self.prev_time_s = Some(now_s);
                self.smoothed_derivative = 0.0;
                return 0.0;
            }
        };

        let dt = now_s - prev_time_s;

        self.prev_error = Some(error);
        self.prev_time_s = Some(now_s);

        if dt <= 0.0 || dt > MAX_VALID_DT_S {
            return self.kd * self.smoothed_derivative;
        }

        let raw = (error - prev_error) / dt;

        // Exponential moving average over the raw derivative
        self.smoothed_derivative = self.smoothing_factor * self.smoothed_derivative
            + (1.0 - self.smoothing_factor) * raw;

        self.kd * self.smoothed_derivative
    }

    /// Clear all state back to initial.
    pub fn reset(&mut self) {
        self.prev_error = None;
        self.prev_time_s = None;
        self.smoothed_derivative = 0.0;
    }

    /// The current smoothed derivative, without the gain applied.
    pub fn derivative(&self) -> f64 {
        self.smoothed_derivative
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
        let mut ctrl = DifferentialController::new(0.5, 0.0);
        assert_eq!(ctrl.update(123.4, 10.0), 0.0);
        assert_eq!(ctrl.derivative(), 0.0);
    }

    #[test]
    fn test_derivative_no_smoothing() {
        let mut ctrl = DifferentialController::new(0.5, 0.0);

        ctrl.update(0.0, 0.0);
        // error rises by 1.0 over 0.1 s: derivative 10, term 5
        let term = ctrl.update(1.0, 0.1);
        assert!((term - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_smoothing() {
        let mut ctrl = DifferentialController::new(1.0, 0.5);

        ctrl.update(0.0, 0.0);
        ctrl.update(1.0, 0.1);
        // raw derivative 10, smoothed = 0.5*0 + 0.5*10 = 5
        assert!((ctrl.derivative() - 5.0).abs() < 1e-9);

        ctrl.update(2.0, 0.2);
        // raw derivative 10, smoothed = 0.5*5 + 0.5*10 = 7.5
        assert!((ctrl.derivative() - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_bad_dt_preserves_filter() {
        let mut ctrl = DifferentialController::new(1.0, 0.0);

        ctrl.update(0.0, 0.0);
        ctrl.update(1.0, 0.1);
        let before = ctrl.derivative();

        // Out-of-order sample must not corrupt the filter
        assert_eq!(ctrl.update(5.0, 0.05), before);
        assert_eq!(ctrl.derivative(), before);

        // Stale sample (dt > 1 s) likewise
        assert_eq!(ctrl.update(6.0, 2.0), before);
    }

    #[test]
    fn test_reset() {
        let mut ctrl = DifferentialController::new(1.0, 0.0);
        ctrl.update(0.0, 0.0);
        ctrl.update(1.0, 0.1);

        ctrl.reset();
        assert_eq!(ctrl.update(3.0, 5.0), 0.0);
    }
}
