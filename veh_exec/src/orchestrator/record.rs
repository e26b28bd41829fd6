//! Per-cycle and per-run record structures
//!
//! `CycleRecord` is the produced interface of the control core: one flat
//! row per processed cycle, suitable for CSV archiving and tabular logs.
//! Flat scalars only, as the CSV writer cannot represent nesting.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use ctrl_if::cmd::Command;
use ctrl_if::features::Features;
use ctrl_if::reading::DistanceReading;
use ctrl_if::telem::Telemetry;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Timing of the four pipeline stages within one cycle.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct StageTiming {
    pub sensor_dur_s: f64,
    pub perception_dur_s: f64,
    pub decision_dur_s: f64,
    pub actuation_dur_s: f64
}

/// One processed cycle, flattened for archiving.
#[derive(Clone, Debug, Serialize)]
pub struct CycleRecord {
    // Reading
    pub elapsed_s: f64,
    pub front_mm: f64,
    pub left_mm: f64,
    pub left_front_mm: f64,
    pub right_front_mm: f64,

    // Features
    pub lateral_error: f64,
    pub front_blocked: bool,
    pub corner_severity: f64,
    pub fork_detected: bool,

    // Command
    pub frame_id: u64,
    pub steer: f64,
    pub throttle: f64,
    pub mode: &'static str,
    pub reason: &'static str,

    // Telemetry
    pub status: &'static str,
    pub steer_pulse_us: Option<u32>,
    pub throttle_pulse_us: Option<u32>,

    // Stage timing
    pub sensor_dur_s: f64,
    pub perception_dur_s: f64,
    pub decision_dur_s: f64,
    pub actuation_dur_s: f64
}

/// Summary of a whole run, written as JSON at shutdown.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    /// Total loop cycles, including quiet ones.
    pub num_cycles: u64,

    /// Cycles which processed a fresh reading end to end.
    pub num_processed: u64,

    /// Total sensor errors over the run.
    pub num_sensor_errors: u64,

    /// Total driver errors over the run.
    pub num_driver_errors: u64,

    /// Cycles which overran the configured period.
    pub num_cycle_overruns: u64,

    /// Status of the last actuation attempt.
    pub last_status: Option<String>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CycleRecord {
    /// Assemble the record for one cycle's data chain.
    pub fn new(
        reading: &DistanceReading,
        features: &Features,
        cmd: &Command,
        telem: &Telemetry,
        timing: StageTiming
    ) -> Self {
        Self {
            elapsed_s: reading.timestamp_s,
            front_mm: reading.front_mm,
            left_mm: reading.left_mm,
            left_front_mm: reading.left_front_mm,
            right_front_mm: reading.right_front_mm,

            lateral_error: features.lateral_error,
            front_blocked: features.front_blocked,
            corner_severity: features.corner_severity(),
            fork_detected: features.fork_detected,

            frame_id: cmd.frame_id,
            steer: cmd.steer,
            throttle: cmd.throttle,
            mode: cmd.mode.as_str(),
            reason: cmd.reason.unwrap_or(""),

            status: telem.status.as_str(),
            steer_pulse_us: telem.steer_pulse_us,
            throttle_pulse_us: telem.throttle_pulse_us,

            sensor_dur_s: timing.sensor_dur_s,
            perception_dur_s: timing.perception_dur_s,
            decision_dur_s: timing.decision_dur_s,
            actuation_dur_s: timing.actuation_dur_s
        }
    }
}
