//! Corridor-centre feature extraction
//!
//! Balances the two diagonal clearances to keep the vehicle on the corridor
//! centreline, and reads the diagonal imbalance for upcoming corners and
//! Y-forks.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{sanitise_distance, CorridorPerceptionParams};
use ctrl_if::features::{CornerApproach, Features, Side};
use ctrl_if::reading::DistanceReading;
use ctrl_if::stages::Perception;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Feature extractor for corridor-centre following.
pub struct CorridorPerception {
    params: CorridorPerceptionParams
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CorridorPerception {
    /// Create a new extractor with the given parameters.
    pub fn new(params: CorridorPerceptionParams) -> Self {
        Self { params }
    }

    /// Detect an upcoming corner from the diagonal imbalance.
    ///
    /// A corner shows up as one diagonal closing on a wall while the other
    /// stays open: `near < threshold` with `far / near` exceeding the
    /// configured ratio. Severity grows from 0 at the ratio to 1 at twice
    /// the ratio.
    fn detect_corner(&self, left_front: f64, right_front: f64) -> Option<CornerApproach> {
        let near = left_front.min(right_front);
        let far = left_front.max(right_front);

        // A wall-contact reading of zero carries no ratio information
        if near <= 0.0 || near >= self.params.corner_near_wall_threshold_mm {
            return None;
        }

        let ratio = far / near;
        if ratio < self.params.corner_imbalance_ratio {
            return None;
        }

        let severity = clamp(
            (ratio - self.params.corner_imbalance_ratio) / self.params.corner_imbalance_ratio,
            0.0,
            1.0
        );

        let open_side = if left_front >= right_front {
            Side::Left
        }
        else {
            Side::Right
        };

        Some(CornerApproach { open_side, severity })
    }
}

impl Perception for CorridorPerception {
    fn analyze(&self, reading: &DistanceReading) -> Features {
        let cap = self.params.wall_detection_threshold_mm;

        let left_front = sanitise_distance(reading.left_front_mm, cap);
        let right_front = sanitise_distance(reading.right_front_mm, cap);
        let front = sanitise_distance(reading.front_mm, cap);

        // Left/right balance error normalised by the corridor width, giving
        // [-1, 1]. Positive means the left is more open, i.e. steer left.
        // A zero-width corridor carries no information, read as centred.
        let corridor_width = left_front + right_front;
        let lateral_error = if corridor_width > 0.0 {
            (left_front - right_front) / corridor_width
        }
        else {
            0.0
        };

        let front_blocked = front < self.params.front_blocked_threshold_mm;

        // A fork island sits mid-range ahead of the vehicle with both
        // passages open beside it.
        let fork_detected = front < self.params.fork_front_threshold_mm
            && left_front > self.params.fork_side_open_threshold_mm
            && right_front > self.params.fork_side_open_threshold_mm;

        Features {
            timestamp_s: reading.timestamp_s,
            lateral_error,
            front_blocked,
            front_distance_mm: front,
            left_front_mm: left_front,
            right_front_mm: right_front,
            corner_approach: self.detect_corner(left_front, right_front),
            fork_detected
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn reading(front: f64, left_front: f64, right_front: f64) -> DistanceReading {
        DistanceReading {
            front_mm: front,
            left_mm: 8190.0,
            left_front_mm: left_front,
            right_front_mm: right_front,
            timestamp_s: 2.0,
        }
    }

    fn perception() -> CorridorPerception {
        CorridorPerception::new(CorridorPerceptionParams::default())
    }

    #[test]
    fn test_balance_error() {
        // Closer to the right wall: positive error, steer left
        let features = perception().analyze(&reading(1000.0, 600.0, 400.0));
        assert!((features.lateral_error - 0.2).abs() < 1e-9);

        // Centred: no error
        let features = perception().analyze(&reading(1000.0, 500.0, 500.0));
        assert_eq!(features.lateral_error, 0.0);
    }

    #[test]
    fn test_zero_width_reads_as_centred() {
        let features = perception().analyze(&reading(1000.0, 0.0, 0.0));
        assert_eq!(features.lateral_error, 0.0);
    }

    #[test]
    fn test_front_blocked() {
        let features = perception().analyze(&reading(80.0, 500.0, 500.0));
        assert!(features.front_blocked);

        let features = perception().analyze(&reading(450.0, 500.0, 500.0));
        assert!(!features.front_blocked);
    }

    #[test]
    fn test_corner_detection() {
        // Right diagonal closing in, left wide open: left corner ahead.
        // ratio = 1000 / 200 = 5, severity = (5 - 2.5) / 2.5 = 1.0
        let features = perception().analyze(&reading(1000.0, 1000.0, 200.0));
        let corner = features.corner_approach.unwrap();
        assert_eq!(corner.open_side, Side::Left);
        assert!((corner.severity - 1.0).abs() < 1e-9);

        // Mirrored for a right corner, milder imbalance.
        // ratio = 900 / 300 = 3, severity = (3 - 2.5) / 2.5 = 0.2
        let features = perception().analyze(&reading(1000.0, 300.0, 900.0));
        let corner = features.corner_approach.unwrap();
        assert_eq!(corner.open_side, Side::Right);
        assert!((corner.severity - 0.2).abs() < 1e-9);

        // Imbalance with the near wall still distant is not a corner
        let features = perception().analyze(&reading(1000.0, 1200.0, 450.0));
        assert!(features.corner_approach.is_none());
    }

    #[test]
    fn test_fork_detection() {
        let features = perception().analyze(&reading(600.0, 900.0, 900.0));
        assert!(features.fork_detected);

        // One side walled off: a plain corner situation, not a fork
        let features = perception().analyze(&reading(600.0, 900.0, 500.0));
        assert!(!features.fork_detected);
    }
}
