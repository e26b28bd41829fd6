//! # Actuation telemetry definitions

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Report of one actuation attempt: what was actually commanded to the
/// hardware, independent of what was requested.
#[derive(Clone, Debug, Serialize)]
pub struct Telemetry {
    /// Frame id of the command this telemetry reports on, 0 for stop calls
    /// made outside the command stream.
    pub frame_id: u64,

    /// Timestamp of the command this telemetry reports on, in seconds since
    /// the session epoch.
    pub timestamp_s: f64,

    /// Outcome of the actuation attempt.
    pub status: ActuationStatus,

    /// The steering value actually applied, after limiting.
    pub applied_steer: Option<f64>,

    /// The throttle value actually applied, after limiting.
    pub applied_throttle: Option<f64>,

    /// The steering pulse width written to the sink, in microseconds.
    pub steer_pulse_us: Option<u32>,

    /// The throttle pulse width written to the sink, in microseconds.
    pub throttle_pulse_us: Option<u32>,

    /// Human readable detail, set on errors and stops.
    pub message: Option<String>
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Outcome of an actuation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ActuationStatus {
    /// The command was mapped and written to the sink.
    Ok,

    /// The vehicle was commanded to its neutral state.
    Stopped,

    /// The hardware sink rejected the write.
    DriverError,

    /// Actuation was invoked without a valid calibration.
    CalibrationError
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Telemetry {
    /// Build a telemetry report for a failed attempt, with no pulse fields.
    pub fn failure(
        frame_id: u64,
        timestamp_s: f64,
        status: ActuationStatus,
        message: String
    ) -> Self {
        Self {
            frame_id,
            timestamp_s,
            status,
            applied_steer: None,
            applied_throttle: None,
            steer_pulse_us: None,
            throttle_pulse_us: None,
            message: Some(message)
        }
    }
}

impl ActuationStatus {
    /// Short string representation, for tabular logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActuationStatus::Ok => "OK",
            ActuationStatus::Stopped => "STOPPED",
            ActuationStatus::DriverError => "DRIVER_ERR",
            ActuationStatus::CalibrationError => "CALIB_ERR"
        }
    }
}
