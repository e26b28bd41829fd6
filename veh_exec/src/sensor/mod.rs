//! # Sensor module
//!
//! Adapters between physical distance sensors and the [`DistanceSource`]
//! trait the pipeline consumes. The raw bus drivers themselves live outside
//! this crate; what lives here is the last-good-value cache that turns
//! partial per-channel updates into complete snapshots, and the playback
//! mock used in simulation and tests.
//!
//! [`DistanceSource`]: ctrl_if::stages::DistanceSource

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cache;
mod mock;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use cache::*;
pub use mock::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A distance sensor channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorChannel {
    Front,
    Left,
    LeftFront,
    RightFront
}
