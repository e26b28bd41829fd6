//! # Decision command definitions

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single steering/throttle demand produced by a decision module.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Command {
    /// Monotonically increasing identifier, one per decision.
    pub frame_id: u64,

    /// Time of the reading this command was derived from, in seconds since
    /// the session epoch.
    pub timestamp_s: f64,

    /// Normalised steering demand in [-1, 1], positive is a left turn.
    pub steer: f64,

    /// Normalised throttle demand in [0, 1]. Always 0.0 when `mode` is
    /// [`DriveMode::Stop`].
    pub throttle: f64,

    /// The drive mode of this command.
    pub mode: DriveMode,

    /// Diagnostic tag naming the decision branch taken. Not used for
    /// control.
    pub reason: Option<&'static str>
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The discrete drive mode of a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DriveMode {
    /// Normal tracking at full commanded speed
    Run,

    /// Reduced speed for avoidance or cornering
    Slow,

    /// Vehicle must be stationary
    Stop
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Command {
    /// Create a new command.
    ///
    /// The `mode == Stop ⇒ throttle == 0.0` invariant is enforced here: a
    /// stop command always carries zero throttle no matter what was passed
    /// in.
    pub fn new(
        frame_id: u64,
        timestamp_s: f64,
        steer: f64,
        throttle: f64,
        mode: DriveMode,
        reason: Option<&'static str>
    ) -> Self {
        let throttle = match mode {
            DriveMode::Stop => 0.0,
            _ => throttle
        };

        Self {
            frame_id,
            timestamp_s,
            steer,
            throttle,
            mode,
            reason
        }
    }
}

impl DriveMode {
    /// Short string representation, for tabular logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            DriveMode::Run => "RUN",
            DriveMode::Slow => "SLOW",
            DriveMode::Stop => "STOP"
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_stop_forces_zero_throttle() {
        let cmd = Command::new(1, 0.0, 0.5, 0.8, DriveMode::Stop, None);
        assert_eq!(cmd.throttle, 0.0);

        let cmd = Command::new(2, 0.0, 0.5, 0.8, DriveMode::Slow, None);
        assert_eq!(cmd.throttle, 0.8);
    }
}
