//! # Vehicle control library
//!
//! Implements the perception → decision → actuation pipeline for the wall
//! and corridor following vehicle, plus the orchestrator which sequences
//! the pipeline at a fixed cadence and owns failure escalation.
//!
//! All modules shall:
//!     1. Be configured through an explicit `Params` struct loaded from a
//!        TOML parameter file, never through process-wide state.
//!     2. Implement the relevant stage trait from `ctrl_if::stages`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Actuation mapping onto pulse sinks.
pub mod actuation;

/// Decision controllers producing steering/throttle commands.
pub mod decision;

/// Cycle orchestration and failure escalation.
pub mod orchestrator;

/// Feature extraction from distance readings.
pub mod perception;

/// Distance source adapters.
pub mod sensor;
