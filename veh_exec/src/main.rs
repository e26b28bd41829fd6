//! Main vehicle-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Build the pipeline stages for the configured follow mode
//!     - Main loop (owned by the orchestrator):
//!         - Distance acquisition
//!         - Feature extraction
//!         - Decision processing
//!         - Actuation
//!     - Shutdown: final stop, hardware release, run report
//!
//! An interrupt (Ctrl-C) at any point requests cooperative shutdown, which
//! the orchestrator answers with an emergency stop before exiting.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result
};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// Internal
use ctrl_if::stages::{Actuation, Decision, Perception};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session
};
use veh_lib::{
    actuation::{ActuationParams, PwmActuation},
    decision::{CorridorDecision, DecisionParams, WallFollowDecision},
    orchestrator::{FollowMode, Orchestrator, OrchestratorParams},
    perception::{CorridorPerception, PerceptionParams, WallFollowPerception},
    sensor::{MockDistanceSource, ScriptStep}
};

// ---------------------------------------------------------------------------
// MAIN
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "veh_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Vehicle Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let orch_params: OrchestratorParams = util::params::load("veh_exec.toml")
        .wrap_err("Could not load orchestrator params")?;
    let perception_params: PerceptionParams = util::params::load("perception.toml")
        .wrap_err("Could not load perception params")?;
    let decision_params: DecisionParams = util::params::load("decision.toml")
        .wrap_err("Could not load decision params")?;
    let actuation_params: ActuationParams = util::params::load("actuation.toml")
        .wrap_err("Could not load actuation params")?;

    info!("Parameters loaded");

    // ---- BUILD PIPELINE ----

    info!("Follow mode: {:?}", orch_params.follow_mode);

    let perception: Box<dyn Perception> = match orch_params.follow_mode {
        FollowMode::WallFollow => Box::new(
            WallFollowPerception::new(perception_params.wall_follow)
        ),
        FollowMode::Corridor => Box::new(
            CorridorPerception::new(perception_params.corridor)
        )
    };

    let decision: Box<dyn Decision> = match orch_params.follow_mode {
        FollowMode::WallFollow => Box::new(
            WallFollowDecision::new(decision_params.wall_follow)
        ),
        FollowMode::Corridor => Box::new(
            CorridorDecision::new(decision_params.corridor)
        )
    };

    let source = MockDistanceSource::new(
        sim_script(orch_params.cycle_period_s)
    );

    let mut actuation = build_actuation(&actuation_params)?;
    actuation
        .configure(actuation_params.calibration)
        .wrap_err("Invalid actuation calibration")?;

    info!("Actuation configured");

    // ---- INTERRUPT HANDLER ----

    let interrupt = Arc::new(AtomicBool::new(false));
    {
        let flag = interrupt.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .wrap_err("Failed to install the interrupt handler")?;
    }

    info!("Initialisation complete\n");

    // ---- MAIN LOOP ----

    let mut orchestrator = Orchestrator::new(
        orch_params,
        source,
        perception,
        decision,
        actuation
    );

    orchestrator
        .with_archive(&session)
        .map_err(|e| eyre!("Failed to create the cycle archive: {}", e))?;

    let loop_result = orchestrator.run_loop(&interrupt);

    // ---- SHUTDOWN ----

    orchestrator.shutdown();

    let report = orchestrator.report();
    let report_path = session.session_root.join("run_report.json");
    match std::fs::File::create(&report_path) {
        Ok(file) => match serde_json::to_writer_pretty(file, &report) {
            Ok(_) => info!("Run report written to {:?}", report_path),
            Err(e) => warn!("Could not write the run report: {}", e)
        },
        Err(e) => warn!("Could not create the run report file: {}", e)
    }

    loop_result.wrap_err("Main loop terminated abnormally")?;

    info!("End of execution");

    Ok(())
}

// ---------------------------------------------------------------------------
// EQUIPMENT
// ---------------------------------------------------------------------------

/// Build the actuation stage over the mock pulse sink.
#[cfg(feature = "sim")]
fn build_actuation(params: &ActuationParams) -> Result<Box<dyn Actuation>> {
    use veh_lib::actuation::MockPulseSink;

    info!("Using the mock pulse sink");

    Ok(Box::new(PwmActuation::new(MockPulseSink::new(), params)))
}

/// Build the actuation stage over the real PCA9685 board.
#[cfg(all(not(feature = "sim"), feature = "hw", target_arch = "arm"))]
fn build_actuation(params: &ActuationParams) -> Result<Box<dyn Actuation>> {
    use veh_lib::actuation::Pca9685Sink;

    /// I2C address of the PCA9685 board
    const PCA9685_I2C_ADDRESS: u8 = 0x40;

    let i2c = rppal::i2c::I2c::new().wrap_err("Failed to open the I2C bus")?;

    let sink = Pca9685Sink::new(i2c, PCA9685_I2C_ADDRESS)
        .map_err(|e| eyre!("Failed to initialise the PCA9685: {}", e))?;

    info!("PCA9685 pulse sink initialised");

    Ok(Box::new(PwmActuation::new(sink, params)))
}

#[cfg(all(not(feature = "sim"), not(all(feature = "hw", target_arch = "arm"))))]
compile_error!(
    "No equipment available: enable the `sim` feature, or `hw` when building \
     for the vehicle target"
);

// ---------------------------------------------------------------------------
// SIMULATION PROFILE
// ---------------------------------------------------------------------------

/// Scripted sensor profile for bench runs: a gentle weave along a corridor,
/// a left corner, then a closing front wall.
///
/// Also used for hardware bring-up, where it drives the real actuators
/// through a known demand sequence without needing the sensor stack fitted.
fn sim_script(cycle_period_s: f64) -> Vec<ScriptStep> {
    use ctrl_if::reading::DistanceReading;

    let mut script = Vec::with_capacity(300);

    for i in 0..300 {
        let t = (i + 1) as f64 * cycle_period_s;

        let (front_mm, left_front_mm, right_front_mm) = if i < 180 {
            // Straight corridor, drifting gently off the centreline
            let weave = 120.0 * (t * 0.8).sin();
            (2000.0, 500.0 + weave, 500.0 - weave)
        }
        else if i < 220 {
            // Left corner: right diagonal closing in, left opening up
            let progress = (i - 180) as f64 / 40.0;
            (
                900.0 - 300.0 * progress,
                800.0 + 400.0 * progress,
                450.0 - 300.0 * progress
            )
        }
        else {
            // Corner passed, front wall closing towards a blocked stop
            let progress = (i - 220) as f64 / 80.0;
            (1200.0 - 1100.0 * progress, 520.0, 480.0)
        };

        script.push(ScriptStep::Reading(DistanceReading {
            front_mm,
            left_mm: left_front_mm.min(350.0),
            left_front_mm,
            right_front_mm,
            timestamp_s: t
        }));
    }

    script
}
