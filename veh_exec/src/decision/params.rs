//! Parameters structures for the decision module

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for both decision variants, as loaded from `decision.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct DecisionParams {
    pub wall_follow: WallFollowDecisionParams,
    pub corridor: CorridorDecisionParams
}

/// Parameters for the wall-follow decision controller (pure P control).
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct WallFollowDecisionParams {
    /// Proportional gain on the lateral error (mm → steering).
    pub kp: f64,

    /// Throttle during normal tracking, in [0, 1].
    pub base_speed: f64,

    /// Maximum steering magnitude that may be commanded.
    pub max_steering: f64,

    /// Throttle while the front is blocked. 0.0 makes the vehicle stop
    /// rather than creep past the obstruction.
    pub front_blocked_speed: f64,

    /// Steering while the front is blocked. Negative turns away from the
    /// followed left wall.
    pub front_blocked_steering: f64,

    /// Throttle while turning through an open corner.
    pub corner_speed: f64,

    /// Steering while turning through an open corner. Positive turns into
    /// the open left side.
    pub corner_steering: f64
}

/// Parameters for the corridor-centre decision controller (PD control with
/// optional I term and rate limiting).
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct CorridorDecisionParams {
    /// Proportional gain on the normalised balance error.
    pub kp: f64,

    /// Integral gain, 0.0 disables the I term.
    pub ki: f64,

    /// Derivative gain, 0.0 disables the D term.
    pub kd: f64,

    /// Exponential smoothing factor for the derivative, in [0, 1].
    pub derivative_smoothing_factor: f64,

    /// Symmetric windup clamp on the integral, `None` for unlimited.
    pub integral_limit: Option<f64>,

    /// Zero the integral when the balance error changes sign.
    pub integral_reset_on_zero_crossing: bool,

    /// Throttle when the front is close, in [0, 1].
    pub base_speed: f64,

    /// Throttle when the front is clear, in [0, 1].
    pub high_speed: f64,

    /// Maximum steering magnitude that may be commanded.
    pub max_steering: f64,

    /// Front distance above which full `high_speed` is used; below it the
    /// throttle ramps down linearly towards `base_speed`.
    ///
    /// Units: millimetres
    pub front_slow_threshold_mm: f64,

    /// Throttle while the front is blocked. The corridor variant keeps
    /// rolling through avoidance by default.
    pub front_blocked_speed: f64,

    /// Steering magnitude while the front is blocked; the sign is chosen
    /// towards the more open diagonal.
    pub front_blocked_steering: f64,

    /// Deceleration target at full corner severity.
    pub corner_approach_speed: f64,

    /// Steering magnitude at full corner severity; scaled down by the
    /// severity for milder corners.
    pub corner_steer_gain: f64,

    /// Fraction of throttle shed per unit of steering magnitude, in
    /// [0, 1]. 0.0 disables curve-dependent deceleration.
    pub steer_speed_reduction: f64,

    /// Maximum steering change per second, `None` disables rate limiting.
    pub max_steer_rate: Option<f64>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for WallFollowDecisionParams {
    fn default() -> Self {
        Self {
            kp: 0.03,
            base_speed: 0.5,
            max_steering: 1.0,
            front_blocked_speed: 0.0,
            front_blocked_steering: -0.5,
            corner_speed: 0.3,
            corner_steering: 0.8
        }
    }
}

impl Default for CorridorDecisionParams {
    fn default() -> Self {
        Self {
            kp: 1.8,
            ki: 0.0,
            kd: 0.05,
            derivative_smoothing_factor: 0.0,
            integral_limit: None,
            integral_reset_on_zero_crossing: false,
            base_speed: 0.35,
            high_speed: 0.40,
            max_steering: 1.0,
            front_slow_threshold_mm: 700.0,
            front_blocked_speed: 0.25,
            front_blocked_steering: 1.0,
            corner_approach_speed: 0.20,
            corner_steer_gain: 0.8,
            steer_speed_reduction: 0.0,
            max_steer_rate: Some(4.0)
        }
    }
}
