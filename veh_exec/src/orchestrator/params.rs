//! Parameters structure for the orchestrator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the orchestrator, as loaded from `veh_exec.toml`.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct OrchestratorParams {
    /// Which following strategy to run.
    pub follow_mode: FollowMode,

    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Interval between table rows in the log.
    ///
    /// Units: seconds
    pub log_interval_s: f64,

    /// Limit on the number of consecutive sensor errors before the loop
    /// escalates to an emergency stop.
    pub max_consec_sensor_errors: u64,

    /// Limit on the number of consecutive driver errors before the loop
    /// escalates to an emergency stop.
    pub max_consec_driver_errors: u64,

    /// Stop cleanly after this many cycles, `None` to run until
    /// interrupted. Used for bounded simulation runs.
    pub max_cycles: Option<u64>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The available following strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowMode {
    /// Track a fixed offset from the left wall.
    WallFollow,

    /// Run the centreline between the two corridor walls.
    Corridor
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for OrchestratorParams {
    fn default() -> Self {
        Self {
            follow_mode: FollowMode::Corridor,
            cycle_period_s: 0.1,
            log_interval_s: 1.0,
            max_consec_sensor_errors: 5,
            max_consec_driver_errors: 5,
            max_cycles: None
        }
    }
}
