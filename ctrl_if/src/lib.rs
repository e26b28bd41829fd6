//! # Control interfaces crate.
//!
//! Provides the data types and stage abstractions shared by the vehicle
//! control pipeline: distance readings in, features, commands and telemetry
//! out. Each stage of the pipeline (sensing, perception, decision,
//! actuation) is defined here as a trait so that alternative strategies can
//! be swapped without touching the orchestration.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuation calibration model
pub mod calib;

/// Decision command definitions
pub mod cmd;

/// Perception feature definitions
pub mod features;

/// Distance reading definitions
pub mod reading;

/// Pipeline stage trait definitions
pub mod stages;

/// Actuation telemetry definitions
pub mod telem;
