//! # Orchestrator module
//!
//! Drives the fixed-cadence control loop:
//!
//! ```text
//! poll sensor → extract features → decide → actuate → record
//! ```
//!
//! and owns everything around it: cycle cadence, stage timing, per-cycle
//! archiving, consecutive-error accounting and the escalation to an
//! emergency stop. No control logic lives here; the stages are opaque
//! behind their `ctrl_if` traits.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod record;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{error, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use ctrl_if::stages::{Actuation, Decision, DistanceSource, Perception};
use ctrl_if::telem::{ActuationStatus, Telemetry};
use util::archive::Archiver;
use util::session::Session;

pub use params::*;
pub use record::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The control loop orchestrator.
///
/// Owns the four pipeline stages and the lifetime of each cycle's data
/// chain. The stages never talk to each other directly.
pub struct Orchestrator<S, P, D, A>
where
    S: DistanceSource,
    P: Perception,
    D: Decision,
    A: Actuation
{
    params: OrchestratorParams,

    source: S,
    perception: P,
    decision: D,
    actuation: A,

    /// CSV archive of processed cycles, when a session is attached.
    archiver: Option<Archiver>,

    /// Total loop cycles, including quiet ones.
    num_cycles: u64,

    /// Cycles which processed a fresh reading end to end.
    num_processed: u64,

    num_consec_sensor_errors: u64,
    num_consec_driver_errors: u64,
    num_consec_cycle_overruns: u64,

    total_sensor_errors: u64,
    total_driver_errors: u64,
    total_cycle_overruns: u64,

    /// Timestamp of the last reading fed into the pipeline, for stale
    /// detection.
    last_reading_timestamp_s: Option<f64>,

    /// Elapsed time of the last table row logged.
    last_table_log_s: Option<f64>,

    header_logged: bool,

    last_telemetry: Option<Telemetry>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors terminating the orchestrator loop.
///
/// Every variant is raised only after an emergency stop has been attempted.
#[derive(Debug, thiserror::Error)]
pub enum OrchError {
    #[error("Exceeded the maximum number of consecutive sensor errors ({0})")]
    SensorErrorLimit(u64),

    #[error("Exceeded the maximum number of consecutive driver errors ({0})")]
    DriverErrorLimit(u64),

    #[error("Actuation was invoked without a valid calibration")]
    NotCalibrated
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<S, P, D, A> Orchestrator<S, P, D, A>
where
    S: DistanceSource,
    P: Perception,
    D: Decision,
    A: Actuation
{
    /// Create a new orchestrator over the given pipeline stages.
    pub fn new(
        params: OrchestratorParams,
        source: S,
        perception: P,
        decision: D,
        actuation: A
    ) -> Self {
        Self {
            params,
            source,
            perception,
            decision,
            actuation,
            archiver: None,
            num_cycles: 0,
            num_processed: 0,
            num_consec_sensor_errors: 0,
            num_consec_driver_errors: 0,
            num_consec_cycle_overruns: 0,
            total_sensor_errors: 0,
            total_driver_errors: 0,
            total_cycle_overruns: 0,
            last_reading_timestamp_s: None,
            last_table_log_s: None,
            header_logged: false,
            last_telemetry: None
        }
    }

    /// Attach a per-cycle CSV archive in the session's archive directory.
    pub fn with_archive(
        &mut self,
        session: &Session
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.archiver = Some(Archiver::from_path(session, "cycles.csv")?);
        Ok(())
    }

    /// Run the loop until interrupted, cycle-limited or failed.
    ///
    /// The interrupt flag is the cooperative cancellation path: it is
    /// checked once per cycle and triggers an emergency stop followed by a
    /// clean exit. Stage failures escalate internally and surface here as
    /// an error, also after an emergency stop.
    pub fn run_loop(&mut self, interrupt: &AtomicBool) -> Result<(), OrchError> {
        info!("Beginning main loop\n");

        loop {
            // Get cycle start time
            let cycle_start = Instant::now();

            if interrupt.load(Ordering::Relaxed) {
                warn!("External interrupt received");
                self.emergency_stop("user_interrupt");
                return Ok(());
            }

            if let Some(max) = self.params.max_cycles {
                if self.num_cycles >= max {
                    info!("Reached the configured cycle limit ({}), stopping", max);
                    self.emergency_stop("end_of_run");
                    return Ok(());
                }
            }

            self.run_cycle()?;

            // ---- CYCLE MANAGEMENT ----

            let cycle_dur = Instant::now() - cycle_start;

            match Duration::from_secs_f64(self.params.cycle_period_s)
                .checked_sub(cycle_dur)
            {
                Some(d) => {
                    self.num_consec_cycle_overruns = 0;
                    thread::sleep(d);
                }
                None => {
                    warn!(
                        "Cycle overran by {:.06} s",
                        cycle_dur.as_secs_f64() - self.params.cycle_period_s
                    );
                    self.num_consec_cycle_overruns += 1;
                    self.total_cycle_overruns += 1;

                    if self.num_consec_cycle_overruns > 1 {
                        trace!(
                            "{} consecutive cycle overruns",
                            self.num_consec_cycle_overruns
                        );
                    }
                }
            }

            self.num_cycles += 1;
        }
    }

    /// Execute one cycle of the pipeline.
    ///
    /// Returns `Ok(None)` on quiet cycles: no fresh reading, a stale
    /// reading, or a sensor error still under the escalation limit.
    pub fn run_cycle(&mut self) -> Result<Option<CycleRecord>, OrchError> {
        let mut timing = StageTiming::default();

        // ---- SENSE ----

        let stage_start = Instant::now();
        let poll_result = self.source.poll();
        timing.sensor_dur_s = stage_start.elapsed().as_secs_f64();

        let (updated, reading) = match poll_result {
            Ok(r) => {
                self.num_consec_sensor_errors = 0;
                r
            }
            Err(e) => {
                self.num_consec_sensor_errors += 1;
                self.total_sensor_errors += 1;
                warn!("Sensor poll failed: {}", e);

                if self.num_consec_sensor_errors > self.params.max_consec_sensor_errors {
                    error!(
                        "Maximum number of consecutive sensor errors ({}) has been exceeded",
                        self.params.max_consec_sensor_errors
                    );
                    self.emergency_stop("sensor_failure");
                    return Err(OrchError::SensorErrorLimit(
                        self.params.max_consec_sensor_errors
                    ));
                }

                return Ok(None);
            }
        };

        if !updated {
            return Ok(None);
        }

        // Frozen or out-of-order sensor data must not be re-fed to the
        // pipeline: reacting to a stuck reading looks identical to reacting
        // to a real one right up until the wall
        if let Some(last) = self.last_reading_timestamp_s {
            if reading.timestamp_s <= last {
                trace!(
                    "Stale reading (t = {:.3} s, last = {:.3} s), skipping",
                    reading.timestamp_s,
                    last
                );
                return Ok(None);
            }
        }
        self.last_reading_timestamp_s = Some(reading.timestamp_s);

        // ---- PERCEIVE ----

        let stage_start = Instant::now();
        let features = self.perception.analyze(&reading);
        timing.perception_dur_s = stage_start.elapsed().as_secs_f64();

        // ---- DECIDE ----

        let stage_start = Instant::now();
        let cmd = self.decision.decide(&features);
        timing.decision_dur_s = stage_start.elapsed().as_secs_f64();

        // ---- ACT ----

        let stage_start = Instant::now();
        let telem = self.actuation.apply(&cmd);
        timing.actuation_dur_s = stage_start.elapsed().as_secs_f64();

        trace!(
            "Stage durations: sensor {:.6} s, perception {:.6} s, decision {:.6} s, actuation {:.6} s",
            timing.sensor_dur_s,
            timing.perception_dur_s,
            timing.decision_dur_s,
            timing.actuation_dur_s
        );

        // ---- ESCALATION ----

        match telem.status {
            ActuationStatus::Ok | ActuationStatus::Stopped => {
                self.num_consec_driver_errors = 0;
            }
            ActuationStatus::DriverError => {
                self.num_consec_driver_errors += 1;
                self.total_driver_errors += 1;
                warn!(
                    "Driver error on frame {}: {:?}",
                    telem.frame_id, telem.message
                );

                // Hold the vehicle while the driver is failing
                self.actuation.stop("driver_error");

                if self.num_consec_driver_errors > self.params.max_consec_driver_errors {
                    error!(
                        "Maximum number of consecutive driver errors ({}) has been exceeded",
                        self.params.max_consec_driver_errors
                    );

                    let record = CycleRecord::new(&reading, &features, &cmd, &telem, timing);
                    self.archive(&record);

                    self.emergency_stop("driver_failure");

                    return Err(OrchError::DriverErrorLimit(
                        self.params.max_consec_driver_errors
                    ));
                }
            }
            ActuationStatus::CalibrationError => {
                error!("Actuation reports it is not calibrated, cannot continue");
                self.emergency_stop("not_calibrated");
                return Err(OrchError::NotCalibrated);
            }
        }

        // ---- RECORD ----

        let record = CycleRecord::new(&reading, &features, &cmd, &telem, timing);
        self.archive(&record);
        self.log_table(&record);

        self.num_processed += 1;
        self.last_telemetry = Some(telem);

        Ok(Some(record))
    }

    /// Bring the vehicle to its safe neutral state immediately.
    ///
    /// Callable from any supervisor at any time; never fails at the
    /// software level.
    pub fn emergency_stop(&mut self, reason: &str) -> Telemetry {
        warn!("EMERGENCY STOP: {}", reason);

        let telem = self.actuation.stop(reason);

        match telem.status {
            ActuationStatus::Stopped => info!("Vehicle brought to neutral"),
            s => error!("Emergency stop actuation returned {:?}", s)
        }

        self.last_telemetry = Some(telem.clone());
        telem
    }

    /// Final stop and release of the actuation hardware.
    pub fn shutdown(&mut self) {
        self.actuation.stop("shutdown");
        self.actuation.close();
        info!("Actuation closed");
    }

    /// Summary of the run so far.
    pub fn report(&self) -> RunReport {
        RunReport {
            num_cycles: self.num_cycles,
            num_processed: self.num_processed,
            num_sensor_errors: self.total_sensor_errors,
            num_driver_errors: self.total_driver_errors,
            num_cycle_overruns: self.total_cycle_overruns,
            last_status: self
                .last_telemetry
                .as_ref()
                .map(|t| t.status.as_str().to_string())
        }
    }

    /// Write a record into the cycle archive, if one is attached.
    fn archive(&mut self, record: &CycleRecord) {
        if let Some(ref mut archiver) = self.archiver {
            if let Err(e) = archiver.serialise(record) {
                warn!("Could not archive cycle record: {}", e);
            }
        }
    }

    /// Log a table row for the record at the configured interval.
    fn log_table(&mut self, record: &CycleRecord) {
        let due = match self.last_table_log_s {
            Some(last) => record.elapsed_s - last >= self.params.log_interval_s,
            None => true
        };

        if !due {
            return;
        }
        self.last_table_log_s = Some(record.elapsed_s);

        if !self.header_logged {
            info!(
                "{:>8} | {:>7} | {:>7} | {:>7} | {:>8} | {:>3} | {:>6} | {:>8} | {:>7} | {:>7} | {}",
                "TIME", "F_DIST", "LF_DIST", "RF_DIST", "ERROR", "BLK",
                "STEER", "THROTTLE", "S_PWM", "T_PWM", "STATUS"
            );
            self.header_logged = true;
        }

        info!(
            "{:>7.1}s | {:>5.0}mm | {:>5.0}mm | {:>5.0}mm | {:>+8.2} | {:>3} | {:>+6.2} | {:>8.2} | {:>5}us | {:>5}us | {}",
            record.elapsed_s,
            record.front_mm,
            record.left_front_mm,
            record.right_front_mm,
            record.lateral_error,
            if record.front_blocked { "Y" } else { "N" },
            record.steer,
            record.throttle,
            record.steer_pulse_us.unwrap_or(0),
            record.throttle_pulse_us.unwrap_or(0),
            record.status
        );
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::actuation::{ActuationParams, MockPulseSink, PwmActuation};
    use crate::decision::{WallFollowDecision, WallFollowDecisionParams};
    use crate::perception::{WallFollowPerception, WallFollowPerceptionParams};
    use crate::sensor::{MockDistanceSource, ScriptStep};
    use ctrl_if::calib::ActuationCalibration;
    use ctrl_if::reading::DistanceReading;

    type TestOrchestrator = Orchestrator<
        MockDistanceSource,
        WallFollowPerception,
        WallFollowDecision,
        PwmActuation<MockPulseSink>
    >;

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

    fn reading(front: f64, left: f64, timestamp_s: f64) -> DistanceReading {
        DistanceReading {
            front_mm: front,
            left_mm: left,
            left_front_mm: 400.0,
            right_front_mm: 8190.0,
            timestamp_s
        }
    }

    fn orchestrator(script: Vec<ScriptStep>, params: OrchestratorParams) -> TestOrchestrator {
        let mut actuation = PwmActuation::new(
            MockPulseSink::new(),
            &ActuationParams::default()
        );
        actuation.configure(calib()).unwrap();

        Orchestrator::new(
            params,
            MockDistanceSource::new(script),
            WallFollowPerception::new(WallFollowPerceptionParams::default()),
            WallFollowDecision::new(WallFollowDecisionParams::default()),
            actuation
        )
    }

    fn fast_params() -> OrchestratorParams {
        let mut p = OrchestratorParams::default();
        p.cycle_period_s = 0.001;
        p
    }

    #[test]
    fn test_pipeline_runs_end_to_end() {
        let mut orch = orchestrator(
            vec![
                ScriptStep::Reading(reading(1000.0, 220.0, 0.1)),
                ScriptStep::Reading(reading(1000.0, 240.0, 0.2)),
            ],
            fast_params()
        );

        let record = orch.run_cycle().unwrap().unwrap();
        assert_eq!(record.frame_id, 1);
        assert_eq!(record.lateral_error, 20.0);
        assert!((record.steer - 0.6).abs() < 1e-9);
        assert_eq!(record.mode, "RUN");
        assert_eq!(record.status, "OK");
        assert_eq!(record.steer_pulse_us, Some(1380));

        let record = orch.run_cycle().unwrap().unwrap();
        assert_eq!(record.frame_id, 2);

        // Script exhausted: quiet cycle, not an error
        assert!(orch.run_cycle().unwrap().is_none());
        assert_eq!(orch.report().num_processed, 2);
    }

    #[test]
    fn test_frozen_reading_skipped() {
        let mut orch = orchestrator(
            vec![
                ScriptStep::Reading(reading(1000.0, 220.0, 0.1)),
                // Same timestamp again: frozen sensor data
                ScriptStep::Reading(reading(1000.0, 220.0, 0.1)),
                ScriptStep::Reading(reading(1000.0, 220.0, 0.2)),
            ],
            fast_params()
        );

        assert!(orch.run_cycle().unwrap().is_some());
        assert!(orch.run_cycle().unwrap().is_none());

        let record = orch.run_cycle().unwrap().unwrap();
        // The frozen reading must not have consumed a frame id
        assert_eq!(record.frame_id, 2);
    }

    #[test]
    fn test_sensor_error_escalation() {
        let mut params = fast_params();
        params.max_consec_sensor_errors = 1;

        let mut orch = orchestrator(
            vec![
                ScriptStep::BusFailure("i2c timeout".into()),
                ScriptStep::BusFailure("i2c timeout".into()),
            ],
            params
        );

        // First failure is tolerated
        assert!(orch.run_cycle().unwrap().is_none());

        // Second consecutive failure exceeds the limit and escalates
        match orch.run_cycle() {
            Err(OrchError::SensorErrorLimit(1)) => (),
            r => panic!("Expected sensor error escalation, got {:?}", r.is_ok())
        }

        // The escalation must have driven the vehicle to neutral
        assert_eq!(orch.actuation.last_pulses(), (Some(1500), Some(1500)));
    }

    #[test]
    fn test_sensor_recovery_resets_count() {
        let mut params = fast_params();
        params.max_consec_sensor_errors = 1;

        let mut orch = orchestrator(
            vec![
                ScriptStep::BusFailure("glitch".into()),
                ScriptStep::Reading(reading(1000.0, 220.0, 0.1)),
                ScriptStep::BusFailure("glitch".into()),
            ],
            params
        );

        assert!(orch.run_cycle().unwrap().is_none());
        assert!(orch.run_cycle().unwrap().is_some());

        // Non-consecutive failure: tolerated again
        assert!(orch.run_cycle().unwrap().is_none());
    }

    #[test]
    fn test_driver_error_escalation() {
        let mut params = fast_params();
        params.max_consec_driver_errors = 1;

        let mut actuation = PwmActuation::new(
            MockPulseSink::failing(),
            &ActuationParams::default()
        );
        actuation.configure(calib()).unwrap();

        let mut orch = Orchestrator::new(
            params,
            MockDistanceSource::new(vec![
                ScriptStep::Reading(reading(1000.0, 220.0, 0.1)),
                ScriptStep::Reading(reading(1000.0, 220.0, 0.2)),
            ]),
            WallFollowPerception::new(WallFollowPerceptionParams::default()),
            WallFollowDecision::new(WallFollowDecisionParams::default()),
            actuation
        );

        // First driver error is tolerated, the cycle still records
        let record = orch.run_cycle().unwrap().unwrap();
        assert_eq!(record.status, "DRIVER_ERR");

        match orch.run_cycle() {
            Err(OrchError::DriverErrorLimit(1)) => (),
            r => panic!("Expected driver error escalation, got {:?}", r.is_ok())
        }
    }

    #[test]
    fn test_uncalibrated_actuation_aborts() {
        let actuation = PwmActuation::new(
            MockPulseSink::new(),
            &ActuationParams::default()
        );

        let mut orch = Orchestrator::new(
            fast_params(),
            MockDistanceSource::new(vec![
                ScriptStep::Reading(reading(1000.0, 220.0, 0.1)),
            ]),
            WallFollowPerception::new(WallFollowPerceptionParams::default()),
            WallFollowDecision::new(WallFollowDecisionParams::default()),
            actuation
        );

        match orch.run_cycle() {
            Err(OrchError::NotCalibrated) => (),
            r => panic!("Expected calibration abort, got {:?}", r.is_ok())
        }
    }

    #[test]
    fn test_emergency_stop() {
        let mut orch = orchestrator(Vec::new(), fast_params());

        let telem = orch.emergency_stop("test");
        assert_eq!(telem.status, ActuationStatus::Stopped);
        assert_eq!(orch.actuation.last_pulses(), (Some(1500), Some(1500)));

        // Safe to invoke repeatedly
        let telem = orch.emergency_stop("test again");
        assert_eq!(telem.status, ActuationStatus::Stopped);
    }

    #[test]
    fn test_interrupt_exits_loop_with_stop() {
        let mut orch = orchestrator(
            vec![ScriptStep::Reading(reading(1000.0, 220.0, 0.1))],
            fast_params()
        );

        let interrupt = AtomicBool::new(true);
        orch.run_loop(&interrupt).unwrap();

        assert_eq!(orch.actuation.last_pulses(), (Some(1500), Some(1500)));
        assert_eq!(orch.report().last_status, Some("STOPPED".into()));
    }

    #[test]
    fn test_loop_honours_cycle_limit() {
        let mut params = fast_params();
        params.max_cycles = Some(3);

        let mut orch = orchestrator(
            vec![
                ScriptStep::Reading(reading(1000.0, 220.0, 0.1)),
                ScriptStep::Reading(reading(1000.0, 220.0, 0.2)),
            ],
            params
        );

        let interrupt = AtomicBool::new(false);
        orch.run_loop(&interrupt).unwrap();

        let report = orch.report();
        assert_eq!(report.num_cycles, 3);
        assert_eq!(report.num_processed, 2);
        assert_eq!(report.last_status, Some("STOPPED".into()));
    }
}
