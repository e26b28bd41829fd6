//! # Pipeline stage trait definitions
//!
//! The control pipeline is composed of four stages, each behind a trait so
//! that alternative implementations (different sensor layouts, different
//! control strategies, mock equipment) can be swapped freely:
//!
//! [`DistanceSource`] → [`Perception`] → [`Decision`] → [`Actuation`]
//!
//! The [`PulseSink`] trait is the hardware boundary below [`Actuation`],
//! abstracting over the physical PWM driver board.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use thiserror::Error;

use crate::calib::{ActuationCalibration, CalibError};
use crate::cmd::Command;
use crate::features::Features;
use crate::reading::{DistanceReading, SensorError};
use crate::telem::Telemetry;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of distance readings.
pub trait DistanceSource {
    /// Block until a fresh reading is available and return it.
    fn read(&mut self) -> Result<DistanceReading, SensorError>;

    /// Poll the source without blocking for new data.
    ///
    /// Returns `(true, reading)` when at least one channel was updated since
    /// the last poll, `(false, reading)` otherwise. Channels that did not
    /// update retain their last known value in the returned snapshot, they
    /// are never zeroed.
    fn poll(&mut self) -> Result<(bool, DistanceReading), SensorError>;
}

/// Feature extraction from a distance reading.
///
/// Implementations are pure functions of their configured thresholds and
/// the reading, and must not fail on well-formed or malformed input alike:
/// out-of-range values are normalised, never propagated as errors.
pub trait Perception {
    /// Extract navigational features from the reading.
    fn analyze(&self, reading: &DistanceReading) -> Features;
}

/// Decision making from features to a bounded command.
///
/// Implementations own their internal controller state (derivative filter,
/// rate limiter, frame counter) across cycles.
pub trait Decision {
    /// Decide the steering/throttle command for this cycle.
    fn decide(&mut self, features: &Features) -> Command;
}

/// Actuation of commands onto the vehicle hardware.
pub trait Actuation {
    /// Store the pulse width calibration and drive the actuators to
    /// neutral.
    fn configure(&mut self, calib: ActuationCalibration) -> Result<(), CalibError>;

    /// Map and apply a command, reporting what was done.
    ///
    /// Never panics on hardware failure: the failure is reported through
    /// the returned telemetry's status.
    fn apply(&mut self, cmd: &Command) -> Telemetry;

    /// Command the safe neutral state.
    ///
    /// Always succeeds at the software level, is safe to call repeatedly
    /// and from failure handlers.
    fn stop(&mut self, reason: &str) -> Telemetry;

    /// Best-effort final neutral write, then release the sink.
    fn close(&mut self);
}

/// A sink for PWM pulse demands, typically a servo driver board.
pub trait PulseSink {
    /// Set the duty cycle of a channel.
    ///
    /// `duty_cycle` is the pulse high-time encoded as a 16 bit fraction of
    /// the PWM period (`round(pulse_us / period_us * 65535)`).
    fn set_duty_cycle(&mut self, channel: u8, duty_cycle: u16) -> Result<(), SinkError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// An error produced by a pulse sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("An I2C error occured")]
    I2c,

    #[error("No such output channel: {0}")]
    InvalidChannel(u8),

    #[error("Duty cycle rejected by the driver")]
    InvalidDutyCycle
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

// Forwarding impls so the executable can compose the pipeline from boxed
// strategies chosen at runtime.

impl<P: Perception + ?Sized> Perception for Box<P> {
    fn analyze(&self, reading: &DistanceReading) -> Features {
        (**self).analyze(reading)
    }
}

impl<D: Decision + ?Sized> Decision for Box<D> {
    fn decide(&mut self, features: &Features) -> Command {
        (**self).decide(features)
    }
}

impl<S: DistanceSource + ?Sized> DistanceSource for Box<S> {
    fn read(&mut self) -> Result<DistanceReading, SensorError> {
        (**self).read()
    }

    fn poll(&mut self) -> Result<(bool, DistanceReading), SensorError> {
        (**self).poll()
    }
}

impl<A: Actuation + ?Sized> Actuation for Box<A> {
    fn configure(&mut self, calib: ActuationCalibration) -> Result<(), CalibError> {
        (**self).configure(calib)
    }

    fn apply(&mut self, cmd: &Command) -> Telemetry {
        (**self).apply(cmd)
    }

    fn stop(&mut self, reason: &str) -> Telemetry {
        (**self).stop(reason)
    }

    fn close(&mut self) {
        (**self).close()
    }
}
