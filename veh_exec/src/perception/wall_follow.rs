//! Wall-follow feature extraction
//!
//! Follows the left wall at a fixed target offset using the straight left
//! and diagonal left-front sensors.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{sanitise_distance, WallFollowPerceptionParams};
use ctrl_if::features::{CornerApproach, Features, Side};
use ctrl_if::reading::DistanceReading;
use ctrl_if::stages::Perception;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Feature extractor for left-wall following.
pub struct WallFollowPerception {
    params: WallFollowPerceptionParams
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WallFollowPerception {
    /// Create a new extractor with the given parameters.
    pub fn new(params: WallFollowPerceptionParams) -> Self {
        Self { params }
    }
}

impl Perception for WallFollowPerception {
    fn analyze(&self, reading: &DistanceReading) -> Features {
        let cap = self.params.wall_detection_threshold_mm;

        let side = sanitise_distance(reading.left_mm, cap);
        let diag = sanitise_distance(reading.left_front_mm, cap);
        let front = sanitise_distance(reading.front_mm, cap);
        let right_diag = sanitise_distance(reading.right_front_mm, cap);

        // Positive error means the wall is further away than the target and
        // the vehicle should steer left (towards it), negative that it is
        // too close and should steer right.
        let lateral_error = side - self.params.target_distance_mm;

        // The diagonal sensor catches walls approached at a shallow angle
        // before the straight front sensor does. Comparisons are strict so
        // a reading exactly on the threshold counts as clear.
        let front_blocked = front < self.params.front_blocked_threshold_mm
            || diag < self.params.diagonal_blocked_threshold_mm;

        // The followed side only counts as open when both of its sensors
        // agree, otherwise a gap in the wall would read as a corner.
        let corner_approach = if side > self.params.corner_open_threshold_mm
            && diag > self.params.corner_open_threshold_mm
        {
            Some(CornerApproach {
                open_side: Side::Left,
                severity: 1.0
            })
        }
        else {
            None
        };

        Features {
            timestamp_s: reading.timestamp_s,
            lateral_error,
            front_blocked,
            front_distance_mm: front,
            left_front_mm: diag,
            right_front_mm: right_diag,
            corner_approach,
            fork_detected: false
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn reading(front: f64, left: f64, left_front: f64) -> DistanceReading {
        DistanceReading {
            front_mm: front,
            left_mm: left,
            left_front_mm: left_front,
            right_front_mm: 8190.0,
            timestamp_s: 1.0,
        }
    }

    fn perception() -> WallFollowPerception {
        WallFollowPerception::new(WallFollowPerceptionParams::default())
    }

    #[test]
    fn test_lateral_error_from_target() {
        // 20 mm further out than the 200 mm target
        let features = perception().analyze(&reading(1000.0, 220.0, 400.0));

        assert_eq!(features.lateral_error, 20.0);
        assert!(!features.front_blocked);
        assert!(features.corner_approach.is_none());
        assert_eq!(features.timestamp_s, 1.0);
    }

    #[test]
    fn test_error_capped_when_no_wall() {
        // Sensor-saturated left reading must not produce a huge error
        let features = perception().analyze(&reading(1000.0, 8190.0, 400.0));

        assert_eq!(features.lateral_error, 1200.0 - 200.0);
    }

    #[test]
    fn test_front_blocked() {
        let features = perception().analyze(&reading(80.0, 220.0, 400.0));
        assert!(features.front_blocked);

        // Diagonal closer than the tight threshold also blocks
        let features = perception().analyze(&reading(1000.0, 220.0, 150.0));
        assert!(features.front_blocked);

        // Exactly on the threshold counts as clear
        let features = perception().analyze(&reading(300.0, 220.0, 200.0));
        assert!(!features.front_blocked);
    }

    #[test]
    fn test_corner_needs_both_sensors_open() {
        let features = perception().analyze(&reading(1000.0, 800.0, 800.0));
        let corner = features.corner_approach.unwrap();
        assert_eq!(corner.open_side, Side::Left);
        assert_eq!(corner.severity, 1.0);

        // Straight sensor open but diagonal still seeing wall: a gap, not a
        // corner
        let features = perception().analyze(&reading(1000.0, 800.0, 400.0));
        assert!(features.corner_approach.is_none());

        // Exactly on the threshold counts as not open
        let features = perception().analyze(&reading(1000.0, 600.0, 600.0));
        assert!(features.corner_approach.is_none());
    }

    #[test]
    fn test_malformed_readings_read_as_far() {
        let features = perception().analyze(
            &reading(std::f64::NAN, -20.0, std::f64::NAN)
        );

        assert!(!features.front_blocked);
        assert_eq!(features.front_distance_mm, 1200.0);
        assert_eq!(features.lateral_error, 1000.0);
    }
}
