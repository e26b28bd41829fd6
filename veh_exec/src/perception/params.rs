//! Parameters structures for the perception module

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for both perception variants, as loaded from
/// `perception.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct PerceptionParams {
    pub wall_follow: WallFollowPerceptionParams,
    pub corridor: CorridorPerceptionParams
}

/// Parameters for wall-follow (left wall) feature extraction.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct WallFollowPerceptionParams {
    /// Desired distance between the vehicle and the followed wall.
    ///
    /// Units: millimetres
    pub target_distance_mm: f64,

    /// Maximum distance at which a wall is considered detected. Readings
    /// beyond this cap are treated as "no wall".
    ///
    /// Units: millimetres
    pub wall_detection_threshold_mm: f64,

    /// Front distance below which the path ahead is considered blocked.
    ///
    /// Units: millimetres
    pub front_blocked_threshold_mm: f64,

    /// Diagonal distance below which the path ahead is considered blocked,
    /// catching walls approached at a shallow angle that the front sensor
    /// misses.
    ///
    /// Units: millimetres
    pub diagonal_blocked_threshold_mm: f64,

    /// Distance beyond which the followed side counts as open. Both the
    /// straight and the diagonal sensor must exceed this for a corner to be
    /// declared.
    ///
    /// Units: millimetres
    pub corner_open_threshold_mm: f64
}

/// Parameters for corridor-centre feature extraction.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct CorridorPerceptionParams {
    /// Maximum distance at which a wall is considered detected. Readings
    /// beyond this cap are treated as "no wall".
    ///
    /// Units: millimetres
    pub wall_detection_threshold_mm: f64,

    /// Front distance below which the path ahead is considered blocked.
    ///
    /// Units: millimetres
    pub front_blocked_threshold_mm: f64,

    /// Diagonal distance below which a corner may be indicated by
    /// left/right imbalance.
    ///
    /// Units: millimetres
    pub corner_near_wall_threshold_mm: f64,

    /// Minimum far/near diagonal ratio that indicates an upcoming corner.
    pub corner_imbalance_ratio: f64,

    /// Front distance below which a fork island may be ahead.
    ///
    /// Units: millimetres
    pub fork_front_threshold_mm: f64,

    /// Diagonal distance above which a side counts as open for fork
    /// detection.
    ///
    /// Units: millimetres
    pub fork_side_open_threshold_mm: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for WallFollowPerceptionParams {
    fn default() -> Self {
        Self {
            target_distance_mm: 200.0,
            wall_detection_threshold_mm: 1200.0,
            front_blocked_threshold_mm: 300.0,
            diagonal_blocked_threshold_mm: 200.0,
            corner_open_threshold_mm: 600.0
        }
    }
}

impl Default for CorridorPerceptionParams {
    fn default() -> Self {
        Self {
            wall_detection_threshold_mm: 1200.0,
            front_blocked_threshold_mm: 450.0,
            corner_near_wall_threshold_mm: 400.0,
            corner_imbalance_ratio: 2.5,
            fork_front_threshold_mm: 800.0,
            fork_side_open_threshold_mm: 700.0
        }
    }
}
