//! # Actuation calibration model
//!
//! The calibration describes the linear mapping between normalised
//! steer/throttle demands and the pulse widths a specific vehicle's servo
//! and ESC expect. It is loaded from parameters once and treated as
//! read-only for the rest of the execution.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pulse width calibration and safety limits for one vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActuationCalibration {
    /// Steering servo pulse width for straight ahead, in microseconds.
    pub steer_center_us: u32,

    /// Steering servo pulse width at full left lock, in microseconds.
    pub steer_left_us: u32,

    /// Steering servo pulse width at full right lock, in microseconds.
    pub steer_right_us: u32,

    /// ESC pulse width for neutral (stopped), in microseconds.
    pub throttle_stop_us: u32,

    /// ESC pulse width at maximum permitted throttle, in microseconds.
    pub throttle_max_us: u32,

    /// Fraction of full steering lock that may be commanded, in [0, 1].
    #[serde(default = "default_limit")]
    pub steer_limit: f64,

    /// Fraction of full throttle that may be commanded, in [0, 1].
    #[serde(default = "default_limit")]
    pub throttle_limit: f64
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Ways in which a calibration can be invalid.
#[derive(Debug, Error)]
pub enum CalibError {
    #[error("Steering calibration is degenerate (left == right == {0} us)")]
    DegenerateSteerRange(u32),

    #[error("Throttle calibration is degenerate (stop == max == {0} us)")]
    DegenerateThrottleRange(u32),

    #[error("Steering limit must be in [0, 1], found {0}")]
    SteerLimitOutOfRange(f64),

    #[error("Throttle limit must be in [0, 1], found {0}")]
    ThrottleLimitOutOfRange(f64)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActuationCalibration {
    /// Check the calibration is usable.
    ///
    /// A degenerate mapping (zero-width steer or throttle range) is
    /// distinguishable from a missing calibration, and rejected at
    /// configuration time rather than at every apply.
    pub fn validate(&self) -> Result<(), CalibError> {
        if self.steer_left_us == self.steer_right_us {
            return Err(CalibError::DegenerateSteerRange(self.steer_left_us));
        }
        if self.throttle_stop_us == self.throttle_max_us {
            return Err(CalibError::DegenerateThrottleRange(self.throttle_stop_us));
        }
        if self.steer_limit < 0.0 || self.steer_limit > 1.0 {
            return Err(CalibError::SteerLimitOutOfRange(self.steer_limit));
        }
        if self.throttle_limit < 0.0 || self.throttle_limit > 1.0 {
            return Err(CalibError::ThrottleLimitOutOfRange(self.throttle_limit));
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_limit() -> f64 {
    1.0
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn calib() -> ActuationCalibration {
        ActuationCalibration {
            steer_center_us: 1500,
            steer_left_us: 1300,
            steer_right_us: 1700,
            throttle_stop_us: 1500,
            throttle_max_us: 1600,
            steer_limit: 1.0,
            throttle_limit: 1.0
        }
    }

    #[test]
    fn test_validate() {
        assert!(calib().validate().is_ok());

        let mut c = calib();
        c.steer_right_us = c.steer_left_us;
        assert!(c.validate().is_err());

        let mut c = calib();
        c.throttle_max_us = c.throttle_stop_us;
        assert!(c.validate().is_err());

        let mut c = calib();
        c.steer_limit = 1.5;
        assert!(c.validate().is_err());

        let mut c = calib();
        c.throttle_limit = -0.1;
        assert!(c.validate().is_err());
    }
}
