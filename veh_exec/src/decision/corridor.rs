//! Corridor-centre decision controller
//!
//! PD control (with an optional I term) on the left/right balance error,
//! corner-severity deceleration, front-distance speed ramping and uniform
//! steering rate limiting.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{
    CorridorDecisionParams,
    DifferentialController,
    IntegralController,
    RateLimiter
};
use ctrl_if::cmd::{Command, DriveMode};
use ctrl_if::features::Features;
use ctrl_if::stages::Decision;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Decision controller for corridor-centre following.
pub struct CorridorDecision {
    params: CorridorDecisionParams,

    /// D term on the balance error
    differential: DifferentialController,

    /// Optional I term on the balance error
    integral: IntegralController,

    /// Steering slew limiter, applied to every branch's target
    rate_limiter: Option<RateLimiter>,

    /// Monotonic decision counter
    frame_id: u64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CorridorDecision {
    /// Create a new controller with the given parameters.
    pub fn new(params: CorridorDecisionParams) -> Self {
        Self {
            differential: DifferentialController::new(
                params.kd,
                params.derivative_smoothing_factor
            ),
            integral: IntegralController::new(
                params.ki,
                params.integral_limit,
                params.integral_reset_on_zero_crossing
            ),
            rate_limiter: params.max_steer_rate.map(RateLimiter::new),
            frame_id: 0,
            params
        }
    }

    /// Throttle for the current front clearance.
    ///
    /// Clear ahead runs at `high_speed`; as the front distance falls below
    /// the slow threshold the throttle ramps down linearly towards
    /// `base_speed` at zero distance.
    fn ramp_speed(&self, front_distance_mm: f64) -> f64 {
        if front_distance_mm >= self.params.front_slow_threshold_mm {
            self.params.high_speed
        }
        else {
            let ratio = front_distance_mm / self.params.front_slow_threshold_mm;
            self.params.base_speed
                + (self.params.high_speed - self.params.base_speed) * ratio
        }
    }
}

impl Decision for CorridorDecision {
    fn decide(&mut self, features: &Features) -> Command {
        // One frame id per decision, whichever branch is taken
        self.frame_id += 1;
        let now_s = features.timestamp_s;

        // Branch priority is a safety contract: an open corner outranks a
        // blocked front, which outranks normal tracking.
        let (target_steer, target_speed, reason) = if let Some(corner) =
            features.corner_approach
        {
            // 1. Corner ahead: steer into the open side, the magnitude and
            //    the deceleration both scaling with severity
            let steer = corner.open_side.steer_sign()
                * self.params.corner_steer_gain
                * corner.severity;

            let speed = self.params.base_speed
                - (self.params.base_speed - self.params.corner_approach_speed)
                * corner.severity;

            (steer, speed, "corner")
        }
        else if features.front_blocked {
            // 2. Front blocked: turn towards whichever diagonal reports
            //    more clearance
            let steer = if features.left_front_mm >= features.right_front_mm {
                self.params.front_blocked_steering.abs()
            }
            else {
                -self.params.front_blocked_steering.abs()
            };

            (steer, self.params.front_blocked_speed, "front_blocked")
        }
        else {
            // 3. Normal tracking: PD (+ optional I) control on the balance
            //    error
            let error = features.lateral_error;

            let p_term = error * self.params.kp;
            let i_term = self.integral.update(error, now_s);
            let d_term = self.differential.update(error, now_s);

            (
                p_term + i_term + d_term,
                self.ramp_speed(features.front_distance_mm),
                "tracking"
            )
        };

        // The steering bound and the slew limit apply uniformly, whichever
        // branch produced the target
        let clamped = clamp(
            target_steer,
            -self.params.max_steering,
            self.params.max_steering
        );

        let steer = match self.rate_limiter {
            Some(ref mut limiter) => limiter.apply(clamped, now_s),
            None => clamped
        };

        // Shed speed in proportion to how hard the vehicle is actually
        // steering, then bound the throttle
        let mut throttle = target_speed;
        if self.params.steer_speed_reduction > 0.0 {
            throttle *= 1.0 - self.params.steer_speed_reduction * steer.abs();
        }
        let throttle = clamp(throttle, 0.0, 1.0);

        let mode = match reason {
            "corner" => DriveMode::Slow,
            "front_blocked" => {
                if throttle == 0.0 {
                    DriveMode::Stop
                }
                else {
                    DriveMode::Slow
                }
            }
            _ => DriveMode::Run
        };

        Command::new(self.frame_id, now_s, steer, throttle, mode, Some(reason))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
