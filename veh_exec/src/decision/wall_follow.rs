//! Wall-follow decision controller
//!
//! Pure proportional control on the wall offset error, with discrete
//! avoidance behaviours for open corners and blocked fronts.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::WallFollowDecisionParams;
use ctrl_if::cmd::{Command, DriveMode};
use ctrl_if::features::Features;
use ctrl_if::stages::Decision;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Decision controller for left-wall following.
pub struct WallFollowDecision {
    params: WallFollowDecisionParams,

    /// Monotonic decision counter
    frame_id: u64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WallFollowDecision {
    /// Create a new controller with the given parameters.
    pub fn new(params: WallFollowDecisionParams) -> Self {
        Self {
            params,
            frame_id: 0
        }
    }
}

impl Decision for WallFollowDecision {
    fn decide(&mut self, features: &Features) -> Command {
        // One frame id per decision, whichever branch is taken
        self.frame_id += 1;
        let now_s = features.timestamp_s;

        // Branch priority is a safety contract: an open corner outranks a
        // blocked front, which outranks normal tracking.

        // 1. Followed side open: turn through the corner at reduced speed
        if features.corner_approach.is_some() {
            return Command::new(
                self.frame_id,
                now_s,
                clamp(
                    self.params.corner_steering,
                    -self.params.max_steering,
                    self.params.max_steering
                ),
                clamp(self.params.corner_speed, 0.0, 1.0),
                DriveMode::Slow,
                Some("corner")
            );
        }

        // 2. Front blocked: turn away from the followed wall, stopping
        //    entirely if the avoidance speed is zero
        if features.front_blocked {
            let throttle = clamp(self.params.front_blocked_speed, 0.0, 1.0);

            let mode = if throttle == 0.0 {
                DriveMode::Stop
            }
            else {
                DriveMode::Slow
            };

            return Command::new(
                self.frame_id,
                now_s,
                clamp(
                    self.params.front_blocked_steering,
                    -self.params.max_steering,
                    self.params.max_steering
                ),
                throttle,
                mode,
                Some("front_blocked")
            );
        }

        // 3. Normal tracking: proportional control on the offset error.
        //    Positive error (too far from the wall) steers left, towards it.
        let steer = clamp(
            features.lateral_error * self.params.kp,
            -self.params.max_steering,
            self.params.max_steering
        );

        Command::new(
            self.frame_id,
            now_s,
            steer,
            clamp(self.params.base_speed, 0.0, 1.0),
            DriveMode::Run,
            Some("tracking")
        )
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use ctrl_if::features::{CornerApproach, Side};

    fn features() -> Features {
        Features {
            timestamp_s: 1.0,
            lateral_error: 0.0,
            front_blocked: false,
            front_distance_mm: 1000.0,
            left_front_mm: 400.0,
            right_front_mm: 1200.0,
            corner_approach: None,
            fork_detected: false
        }
    }

    fn decision() -> WallFollowDecision {
        WallFollowDecision::new(WallFollowDecisionParams::default())
    }

    #[test]
    fn test_tracking() {
        let mut dec = decision();

        // 20 mm outside the target with kp 0.03: steer 0.6 towards the wall
        let mut f = features();
        f.lateral_error = 20.0;

        let cmd = dec.decide(&f);
        assert!((cmd.steer - 0.6).abs() < 1e-9);
        assert_eq!(cmd.throttle, 0.5);
        assert_eq!(cmd.mode, DriveMode::Run);
        assert_eq!(cmd.reason, Some("tracking"));
    }

    #[test]
    fn test_tracking_steer_clamped() {
        let mut dec = decision();

        let mut f = features();
        f.lateral_error = 1000.0;

        let cmd = dec.decide(&f);
        assert_eq!(cmd.steer, 1.0);
    }

    #[test]
    fn test_front_blocked_stops_by_default() {
        let mut dec = decision();

        let mut f = features();
        f.front_blocked = true;

        let cmd = dec.decide(&f);
        assert_eq!(cmd.mode, DriveMode::Stop);
        assert_eq!(cmd.throttle, 0.0);
        assert_eq!(cmd.steer, -0.5);
        assert_eq!(cmd.reason, Some("front_blocked"));
    }

    #[test]
    fn test_front_blocked_slow_with_nonzero_speed() {
        let mut params = WallFollowDecisionParams::default();
        params.front_blocked_speed = 0.2;
        let mut dec = WallFollowDecision::new(params);

        let mut f = features();
        f.front_blocked = true;

        let cmd = dec.decide(&f);
        assert_eq!(cmd.mode, DriveMode::Slow);
        assert_eq!(cmd.throttle, 0.2);
    }

    #[test]
    fn test_corner_outranks_front_blocked() {
        let mut dec = decision();

        let mut f = features();
        f.front_blocked = true;
        f.corner_approach = Some(CornerApproach {
            open_side: Side::Left,
            severity: 1.0
        });

        let cmd = dec.decide(&f);
        assert_eq!(cmd.mode, DriveMode::Slow);
        assert_eq!(cmd.reason, Some("corner"));
        assert!((cmd.steer - 0.8).abs() < 1e-9);
        assert_eq!(cmd.throttle, 0.3);
    }

    #[test]
    fn test_frame_id_increments_every_decide() {
        let mut dec = decision();

        let mut f = features();
        assert_eq!(dec.decide(&f).frame_id, 1);

        f.front_blocked = true;
        assert_eq!(dec.decide(&f).frame_id, 2);

        f.corner_approach = Some(CornerApproach {
            open_side: Side::Left,
            severity: 1.0
        });
        assert_eq!(dec.decide(&f).frame_id, 3);
    }
}
