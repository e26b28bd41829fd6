//! Parameters structure for the actuation module

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use ctrl_if::calib::ActuationCalibration;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the actuation mapper, as loaded from `actuation.toml`.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct ActuationParams {
    /// Sink channel driving the steering servo.
    pub steer_channel: u8,

    /// Sink channel driving the ESC.
    pub throttle_channel: u8,

    /// PWM period of the sink in microseconds (20000 for the standard
    /// 50 Hz servo/ESC signal).
    pub pwm_period_us: u32,

    /// Pulse width calibration for this vehicle.
    pub calibration: ActuationCalibration
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ActuationParams {
    fn default() -> Self {
        Self {
            steer_channel: 0,
            throttle_channel: 1,
            pwm_period_us: 20000,
            calibration: ActuationCalibration {
                steer_center_us: 1500,
                steer_left_us: 1300,
                steer_right_us: 1700,
                throttle_stop_us: 1500,
                throttle_max_us: 1600,
                steer_limit: 1.0,
                throttle_limit: 1.0
            }
        }
    }
}
