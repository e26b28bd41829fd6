//! # Actuation module
//!
//! Maps bounded commands onto hardware pulse widths under the vehicle's
//! calibration and safety limits, and guarantees a safe neutral state on
//! stop and shutdown.
//!
//! The hardware boundary is the [`PulseSink`] trait: [`Pca9685Sink`] drives
//! the real servo board, [`MockPulseSink`] records writes for simulation
//! and tests.
//!
//! [`PulseSink`]: ctrl_if::stages::PulseSink

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod mock;
mod params;
/// [`PulseSink`] implementation for the Adafruit PCA9685 16 channel servo
/// driver board.
///
/// [`PulseSink`]: ctrl_if::stages::PulseSink
mod pca9685;
mod pwm;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use mock::*;
pub use params::*;
pub use pca9685::*;
pub use pwm::*;
