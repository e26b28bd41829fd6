//! # Perception feature definitions

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Navigational features extracted from one [`DistanceReading`].
///
/// [`DistanceReading`]: crate::reading::DistanceReading
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Features {
    /// Time of the reading these features were extracted from, in seconds
    /// since the session epoch.
    pub timestamp_s: f64,

    /// Signed lateral error. Positive means the vehicle should steer left to
    /// correct, negative that it should steer right. The magnitude is in
    /// millimetres for wall-follow perception and normalised to [-1, 1] for
    /// corridor perception.
    pub lateral_error: f64,

    /// True if the path ahead is blocked and avoidance is required.
    pub front_blocked: bool,

    /// Distance straight ahead, for speed control.
    pub front_distance_mm: f64,

    /// Front-left diagonal distance, for avoidance direction choice.
    pub left_front_mm: f64,

    /// Front-right diagonal distance, for avoidance direction choice.
    pub right_front_mm: f64,

    /// Set when an upcoming corner is indicated by the sensor geometry.
    /// Absent when no corner is approaching, so a severity can never exist
    /// without a corner.
    pub corner_approach: Option<CornerApproach>,

    /// True when the sensor pattern indicates a Y-fork ahead.
    pub fork_detected: bool
}

/// Description of an approaching corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CornerApproach {
    /// The side the corridor opens towards, i.e. the direction to turn.
    pub open_side: Side,

    /// How sharply the corner is indicated, from 0 (barely) to 1 (fully
    /// open).
    pub severity: f64
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A lateral side of the vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Side {
    Left,
    Right
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Side {
    /// The steering sign for turning towards this side (positive steer is a
    /// left turn).
    pub fn steer_sign(&self) -> f64 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0
        }
    }
}

impl Features {
    /// Corner severity, or 0.0 when no corner is approaching.
    pub fn corner_severity(&self) -> f64 {
        match self.corner_approach {
            Some(c) => c.severity,
            None => 0.0
        }
    }
}
