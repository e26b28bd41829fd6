//! PWM actuation mapper
//!
//! Maps normalised steering/throttle commands onto calibrated pulse widths
//! and writes them to a [`PulseSink`]. Owns the calibration and the last
//! applied pulse state, and with them the safe-neutral guarantee: `stop`
//! and `close` always drive the vehicle back to neutral if the hardware is
//! reachable at all.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;

// Internal
use super::ActuationParams;
use ctrl_if::calib::{ActuationCalibration, CalibError};
use ctrl_if::cmd::{Command, DriveMode};
use ctrl_if::stages::{Actuation, PulseSink};
use ctrl_if::telem::{ActuationStatus, Telemetry};
use util::maths::{clamp, lin_map};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Actuation mapper writing into a PWM pulse sink.
pub struct PwmActuation<S: PulseSink> {
    /// The hardware sink, `None` once closed.
    sink: Option<S>,

    /// The calibration, `None` until `configure` succeeds.
    calib: Option<ActuationCalibration>,

    steer_channel: u8,
    throttle_channel: u8,
    period_us: u32,

    /// Last steering pulse successfully written to the sink.
    last_steer_us: Option<u32>,

    /// Last throttle pulse successfully written to the sink.
    last_throttle_us: Option<u32>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<S: PulseSink> PwmActuation<S> {
    /// Create a new unconfigured mapper over the given sink.
    pub fn new(sink: S, params: &ActuationParams) -> Self {
        Self {
            sink: Some(sink),
            calib: None,
            steer_channel: params.steer_channel,
            throttle_channel: params.throttle_channel,
            period_us: params.pwm_period_us,
            last_steer_us: None,
            last_throttle_us: None
        }
    }

    /// The pulses currently on the hardware, `(steer_us, throttle_us)`.
    pub fn last_pulses(&self) -> (Option<u32>, Option<u32>) {
        (self.last_steer_us, self.last_throttle_us)
    }

    /// Map a steering demand onto a servo pulse width.
    ///
    /// The demand is clamped into `±steer_limit` before mapping, then
    /// interpolated from centre towards the left or right end point.
    /// Fractional microseconds are truncated towards zero, not rounded,
    /// matching the vehicle's historical calibration behaviour.
    fn steer_to_us(calib: &ActuationCalibration, steer: f64) -> u32 {
        let steer = clamp(steer, -calib.steer_limit, calib.steer_limit);

        if calib.steer_limit == 0.0 {
            return calib.steer_center_us;
        }

        let us = if steer >= 0.0 {
            lin_map(
                (0.0, calib.steer_limit),
                (calib.steer_center_us as f64, calib.steer_left_us as f64),
                steer
            )
        }
        else {
            lin_map(
                (0.0, calib.steer_limit),
                (calib.steer_center_us as f64, calib.steer_right_us as f64),
                -steer
            )
        };

        us as u32
    }

    /// Map a throttle demand onto an ESC pulse width.
    ///
    /// The demand is clamped into `[0, throttle_limit]` before mapping.
    /// Fractional microseconds are truncated towards zero.
    fn throttle_to_us(calib: &ActuationCalibration, throttle: f64) -> u32 {
        let throttle = clamp(throttle, 0.0, calib.throttle_limit);

        if calib.throttle_limit == 0.0 {
            return calib.throttle_stop_us;
        }

        let us = lin_map(
            (0.0, calib.throttle_limit),
            (calib.throttle_stop_us as f64, calib.throttle_max_us as f64),
            throttle
        );

        us as u32
    }

    /// Convert a pulse width into the sink's 16 bit duty cycle encoding.
    fn duty_cycle(&self, pulse_us: u32) -> u16 {
        ((pulse_us as f64 / self.period_us as f64) * 65535.0).round() as u16
    }

    /// Write a pulse to a sink channel, recording it in the last-pulse
    /// state on success.
    fn write_pulse(&mut self, channel: u8, pulse_us: u32) -> Result<(), String> {
        let duty = self.duty_cycle(pulse_us);

        let sink = match self.sink {
            Some(ref mut s) => s,
            None => return Err("Pulse sink has been released".into())
        };

        match sink.set_duty_cycle(channel, duty) {
            Ok(()) => {
                if channel == self.steer_channel {
                    self.last_steer_us = Some(pulse_us);
                }
                if channel == self.throttle_channel {
                    self.last_throttle_us = Some(pulse_us);
                }
                Ok(())
            }
            Err(e) => Err(format!("{}", e))
        }
    }
}

impl<S: PulseSink> Actuation for PwmActuation<S> {
    /// Store the calibration and drive the actuators to neutral.
    ///
    /// Fails if the calibration itself is invalid. A sink failure during
    /// the initial neutral write is only warned about; it will resurface as
    /// a `DriverError` on the first `apply`.
    fn configure(&mut self, calib: ActuationCalibration) -> Result<(), CalibError> {
        calib.validate()?;
        self.calib = Some(calib);

        if let Err(e) = self.write_pulse(self.throttle_channel, calib.throttle_stop_us) {
            warn!("Could not write initial neutral throttle: {}", e);
        }
        if let Err(e) = self.write_pulse(self.steer_channel, calib.steer_center_us) {
            warn!("Could not write initial centre steering: {}", e);
        }

        Ok(())
    }

    fn apply(&mut self, cmd: &Command) -> Telemetry {
        let calib = match self.calib {
            Some(c) => c,
            None => {
                return Telemetry::failure(
                    cmd.frame_id,
                    cmd.timestamp_s,
                    ActuationStatus::CalibrationError,
                    "Calibration not configured".into()
                )
            }
        };

        // A stop command always maps to the neutral throttle pulse, even if
        // the inbound throttle is nonzero. The command type should already
        // guarantee this, but the mapper is the last line before hardware.
        let (throttle_us, applied_throttle) = match cmd.mode {
            DriveMode::Stop => (calib.throttle_stop_us, 0.0),
            _ => (
                Self::throttle_to_us(&calib, cmd.throttle),
                clamp(cmd.throttle, 0.0, calib.throttle_limit)
            )
        };

        let steer_us = Self::steer_to_us(&calib, cmd.steer);
        let applied_steer = clamp(cmd.steer, -calib.steer_limit, calib.steer_limit);

        // Throttle first so a steering failure can never leave the vehicle
        // driving on a stale throttle
        let write_result = self
            .write_pulse(self.throttle_channel, throttle_us)
            .and_then(|_| self.write_pulse(self.steer_channel, steer_us));

        match write_result {
            Ok(()) => Telemetry {
                frame_id: cmd.frame_id,
                timestamp_s: cmd.timestamp_s,
                status: ActuationStatus::Ok,
                applied_steer: Some(applied_steer),
                applied_throttle: Some(applied_throttle),
                steer_pulse_us: Some(steer_us),
                throttle_pulse_us: Some(throttle_us),
                message: None
            },
            // Report the attempted values even though the write failed, so
            // the telemetry consumer sees what was being commanded
            Err(e) => Telemetry {
                frame_id: cmd.frame_id,
                timestamp_s: cmd.timestamp_s,
                status: ActuationStatus::DriverError,
                applied_steer: Some(applied_steer),
                applied_throttle: Some(applied_throttle),
                steer_pulse_us: Some(steer_us),
                throttle_pulse_us: Some(throttle_us),
                message: Some(format!("Failed to apply command: {}", e))
            }
        }
    }

    fn stop(&mut self, reason: &str) -> Telemetry {
        let calib = match (self.calib, self.sink.is_some()) {
            (Some(c), true) => c,
            // Without calibration or hardware there is nothing to write,
            // but the stop itself still succeeds
            _ => {
                return Telemetry::failure(
                    0,
                    0.0,
                    ActuationStatus::Stopped,
                    reason.into()
                )
            }
        };

        let write_result = self
            .write_pulse(self.throttle_channel, calib.throttle_stop_us)
            .and_then(|_| self.write_pulse(self.steer_channel, calib.steer_center_us));

        match write_result {
            Ok(()) => Telemetry {
                frame_id: 0,
                timestamp_s: 0.0,
                status: ActuationStatus::Stopped,
                applied_steer: Some(0.0),
                applied_throttle: Some(0.0),
                steer_pulse_us: Some(calib.steer_center_us),
                throttle_pulse_us: Some(calib.throttle_stop_us),
                message: Some(reason.into())
            },
            Err(e) => Telemetry::failure(
                0,
                0.0,
                ActuationStatus::DriverError,
                format!("Failed to stop ({}): {}", reason, e)
            )
        }
    }

    fn close(&mut self) {
        // Best effort neutral before releasing the hardware
        if let Some(calib) = self.calib {
            if self.sink.is_some() {
                self.write_pulse(self.throttle_channel, calib.throttle_stop_us).ok();
                self.write_pulse(self.steer_channel, calib.steer_center_us).ok();
            }
        }

        self.sink = None;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::super::MockPulseSink;
    use super::*;

    fn calib() -> ActuationCalibration {
        ActuationCalibration {
            steer_center_us: 1500,
            steer_left_us: 1300,
            steer_right_us: 1700,
            throttle_stop_us: 1500,
            throttle_max_us: 1600,
            steer_limit: 1.0,
            throttle_limit: 1.0
        }
    }

    fn actuation() -> PwmActuation<MockPulseSink> {
        let mut act = PwmActuation::new(
            MockPulseSink::new(),
            &ActuationParams::default()
        );
        act.configure(calib()).unwrap();
        act
    }

    fn cmd(steer: f64, throttle: f64, mode: DriveMode) -> Command {
        Command::new(7, 1.5, steer, throttle, mode, None)
    }

    #[test]
    fn test_apply_maps_pulses() {
        let mut act = actuation();

        let telem = act.apply(&cmd(1.0, 0.5, DriveMode::Run));
        assert_eq!(telem.status, ActuationStatus::Ok);
        assert_eq!(telem.steer_pulse_us, Some(1300));
        assert_eq!(telem.throttle_pulse_us, Some(1550));
        assert_eq!(telem.applied_steer, Some(1.0));
        assert_eq!(telem.applied_throttle, Some(0.5));
        assert_eq!(telem.frame_id, 7);
    }

    #[test]
    fn test_center_identity() {
        let mut act = actuation();

        let telem = act.apply(&cmd(0.0, 0.0, DriveMode::Run));
        assert_eq!(telem.steer_pulse_us, Some(1500));

        let telem = act.apply(&cmd(-1.0, 0.0, DriveMode::Run));
        assert_eq!(telem.steer_pulse_us, Some(1700));
    }

    #[test]
    fn test_mapping_monotonic() {
        let mut act = actuation();

        // Sweep the demand range and check pulses walk monotonically from
        // the right end point to the left one
        let mut prev = None;
        let mut steer = -1.0;
        while steer <= 1.0 {
            let us = act
                .apply(&cmd(steer, 0.0, DriveMode::Run))
                .steer_pulse_us
                .unwrap();

            if let Some(p) = prev {
                assert!(us <= p, "pulse increased at steer {}", steer);
            }
            prev = Some(us);
            steer += 0.125;
        }
    }

    #[test]
    fn test_fractional_us_truncated() {
        let mut act = actuation();

        // 0.333 * -200 = -66.6: expect 1433, not 1434
        let telem = act.apply(&cmd(0.333, 0.0, DriveMode::Run));
        assert_eq!(telem.steer_pulse_us, Some(1433));
    }

    #[test]
    fn test_stop_mode_forces_neutral_throttle() {
        let mut act = actuation();

        // Build a malformed command around the constructor to check the
        // mapper's own defence
        let mut bad = cmd(0.0, 0.0, DriveMode::Stop);
        bad.throttle = 0.9;

        let telem = act.apply(&bad);
        assert_eq!(telem.applied_throttle, Some(0.0));
        assert_eq!(telem.throttle_pulse_us, Some(1500));
    }

    #[test]
    fn test_limits_clamp_before_mapping() {
        let mut c = calib();
        c.steer_limit = 0.5;
        c.throttle_limit = 0.5;

        let mut act = PwmActuation::new(
            MockPulseSink::new(),
            &ActuationParams::default()
        );
        act.configure(c).unwrap();

        // Demand past the limits maps to the limit end points
        let telem = act.apply(&cmd(1.0, 1.0, DriveMode::Run));
        assert_eq!(telem.steer_pulse_us, Some(1300));
        assert_eq!(telem.throttle_pulse_us, Some(1600));
        assert_eq!(telem.applied_steer, Some(0.5));
        assert_eq!(telem.applied_throttle, Some(0.5));

        // Half of the limited range reaches half of the pulse range
        let telem = act.apply(&cmd(0.25, 0.25, DriveMode::Run));
        assert_eq!(telem.steer_pulse_us, Some(1400));
        assert_eq!(telem.throttle_pulse_us, Some(1550));
    }

    #[test]
    fn test_apply_without_configure() {
        let mut act = PwmActuation::new(
            MockPulseSink::new(),
            &ActuationParams::default()
        );

        let telem = act.apply(&cmd(0.5, 0.5, DriveMode::Run));
        assert_eq!(telem.status, ActuationStatus::CalibrationError);
        assert_eq!(telem.steer_pulse_us, None);

        // No pulses must have reached the sink
        assert!(act.sink.as_ref().unwrap().writes.is_empty());
    }

    #[test]
    fn test_degenerate_calibration_rejected() {
        let mut act = PwmActuation::new(
            MockPulseSink::new(),
            &ActuationParams::default()
        );

        let mut c = calib();
        c.steer_right_us = c.steer_left_us;
        assert!(act.configure(c).is_err());

        // Still unconfigured afterwards
        let telem = act.apply(&cmd(0.0, 0.0, DriveMode::Run));
        assert_eq!(telem.status, ActuationStatus::CalibrationError);
    }

    #[test]
    fn test_stop_idempotent() {
        let mut act = actuation();

        let first = act.stop("test");
        let second = act.stop("test");

        assert_eq!(first.status, ActuationStatus::Stopped);
        assert_eq!(second.status, ActuationStatus::Stopped);
        assert_eq!(first.steer_pulse_us, second.steer_pulse_us);
        assert_eq!(first.throttle_pulse_us, second.throttle_pulse_us);
        assert_eq!(act.last_pulses(), (Some(1500), Some(1500)));
    }

    #[test]
    fn test_stop_without_configure() {
        let mut act = PwmActuation::new(
            MockPulseSink::new(),
            &ActuationParams::default()
        );

        let telem = act.stop("early");
        assert_eq!(telem.status, ActuationStatus::Stopped);
        assert_eq!(telem.steer_pulse_us, None);
        assert_eq!(telem.message, Some("early".into()));
    }

    #[test]
    fn test_driver_error_reports_attempted_values() {
        let mut act = PwmActuation::new(
            MockPulseSink::failing(),
            &ActuationParams::default()
        );
        act.configure(calib()).unwrap();

        let telem = act.apply(&cmd(1.0, 0.5, DriveMode::Run));
        assert_eq!(telem.status, ActuationStatus::DriverError);
        assert_eq!(telem.steer_pulse_us, Some(1300));
        assert_eq!(telem.throttle_pulse_us, Some(1550));
        assert!(telem.message.is_some());
    }

    #[test]
    fn test_close_is_neutral_and_final() {
        let mut act = actuation();

        act.apply(&cmd(1.0, 0.8, DriveMode::Run));
        act.close();

        assert_eq!(act.last_pulses(), (Some(1500), Some(1500)));

        // Applying after close degrades to a driver error, never a panic
        let telem = act.apply(&cmd(0.0, 0.0, DriveMode::Run));
        assert_eq!(telem.status, ActuationStatus::DriverError);
    }

    #[test]
    fn test_duty_cycle_encoding() {
        let mut act = actuation();
        act.apply(&cmd(1.0, 0.0, DriveMode::Run));

        // 1300 us of a 20000 us period: round(1300 / 20000 * 65535) = 4260
        let sink = act.sink.as_ref().unwrap();
        let steer_duty = sink.last_for_channel(0).unwrap();
        assert_eq!(steer_duty, 4260);
    }
}
