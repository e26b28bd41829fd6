//! # Distance reading definitions

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An immutable snapshot of all distance channels from one sensor poll.
///
/// Covers both supported sensor layouts: the wall-follow layout uses the
/// straight left and diagonal left-front sensors, the corridor layout uses
/// the two diagonal sensors. Unfitted channels simply report "far".
///
/// Units are millimetres throughout.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DistanceReading {
    /// Distance straight ahead
    pub front_mm: f64,

    /// Distance to the left
    pub left_mm: f64,

    /// Distance to the front-left diagonal
    pub left_front_mm: f64,

    /// Distance to the front-right diagonal
    pub right_front_mm: f64,

    /// Time the snapshot was taken, in seconds since the session epoch
    pub timestamp_s: f64
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// An error produced by a distance source.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("The sensor bus could not be read: {0}")]
    BusError(String),

    #[error("The sensor has not been initialised")]
    NotInitialised,

    #[error("Timed out waiting for the sensor to produce a reading")]
    Timeout
}
