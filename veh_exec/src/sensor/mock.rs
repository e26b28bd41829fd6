//! Scripted mock distance source
//!
//! Plays back a prepared script of full readings, partial channel updates
//! and fault injections. Used for simulation runs and for driving the
//! orchestrator in tests.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;

use super::{ReadingCache, SensorChannel};
use ctrl_if::reading::{DistanceReading, SensorError};
use ctrl_if::stages::DistanceSource;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Out-of-range value reported by channels that have never updated,
/// matching the saturation value of the real time-of-flight sensors.
pub const SENSOR_MAX_RANGE_MM: f64 = 8190.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// One step of a mock sensor script.
#[derive(Clone, Debug)]
pub enum ScriptStep {
    /// All channels update at once.
    Reading(DistanceReading),

    /// A single channel updates, the rest retain their last values.
    Partial {
        channel: SensorChannel,
        value_mm: f64,
        timestamp_s: f64
    },

    /// The sensor has nothing new this poll.
    NoUpdate,

    /// The sensor bus fails.
    BusFailure(String)
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A distance source playing back a script.
pub struct MockDistanceSource {
    cache: ReadingCache,
    script: VecDeque<ScriptStep>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MockDistanceSource {
    /// Create a source playing back the given script.
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self {
            cache: ReadingCache::new(SENSOR_MAX_RANGE_MM),
            script: script.into()
        }
    }

    /// Create a source which reports each reading in turn, then goes
    /// quiet.
    pub fn from_readings(readings: Vec<DistanceReading>) -> Self {
        Self::new(readings.into_iter().map(ScriptStep::Reading).collect())
    }

    /// Number of script steps not yet played.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Execute one script step against the cache.
    fn step(&mut self) -> Result<bool, SensorError> {
        match self.script.pop_front() {
            Some(ScriptStep::Reading(reading)) => {
                self.cache.update_all(&reading);
                Ok(true)
            }
            Some(ScriptStep::Partial { channel, value_mm, timestamp_s }) => {
                self.cache.update(channel, value_mm, timestamp_s);
                Ok(true)
            }
            Some(ScriptStep::NoUpdate) | None => Ok(false),
            Some(ScriptStep::BusFailure(msg)) => Err(SensorError::BusError(msg))
        }
    }
}

impl DistanceSource for MockDistanceSource {
    fn read(&mut self) -> Result<DistanceReading, SensorError> {
        // Blocking read: play steps until one produces fresh data
        loop {
            if self.script.is_empty() {
                return Err(SensorError::Timeout);
            }

            if self.step()? {
                return Ok(self.cache.snapshot());
            }
        }
    }

    fn poll(&mut self) -> Result<(bool, DistanceReading), SensorError> {
        let updated = self.step()?;
        Ok((updated, self.cache.snapshot()))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn reading(front: f64, timestamp_s: f64) -> DistanceReading {
        DistanceReading {
            front_mm: front,
            left_mm: 220.0,
            left_front_mm: 400.0,
            right_front_mm: 600.0,
            timestamp_s
        }
    }

    #[test]
    fn test_poll_playback() {
        let mut source = MockDistanceSource::new(vec![
            ScriptStep::Reading(reading(1000.0, 0.1)),
            ScriptStep::NoUpdate,
            ScriptStep::Partial {
                channel: SensorChannel::Front,
                value_mm: 800.0,
                timestamp_s: 0.3
            },
        ]);

        let (updated, snap) = source.poll().unwrap();
        assert!(updated);
        assert_eq!(snap.front_mm, 1000.0);

        // No update: previous snapshot retained
        let (updated, snap) = source.poll().unwrap();
        assert!(!updated);
        assert_eq!(snap.front_mm, 1000.0);
        assert_eq!(snap.timestamp_s, 0.1);

        // Partial update: front changes, left retained
        let (updated, snap) = source.poll().unwrap();
        assert!(updated);
        assert_eq!(snap.front_mm, 800.0);
        assert_eq!(snap.left_mm, 220.0);
        assert_eq!(snap.timestamp_s, 0.3);

        // Script exhausted: quiet, not an error
        let (updated, _) = source.poll().unwrap();
        assert!(!updated);
    }

    #[test]
    fn test_read_skips_quiet_steps() {
        let mut source = MockDistanceSource::new(vec![
            ScriptStep::NoUpdate,
            ScriptStep::Reading(reading(900.0, 0.2)),
        ]);

        let snap = source.read().unwrap();
        assert_eq!(snap.front_mm, 900.0);

        // Nothing left to read
        assert!(source.read().is_err());
    }

    #[test]
    fn test_bus_failure() {
        let mut source = MockDistanceSource::new(vec![
            ScriptStep::BusFailure("i2c timeout".into()),
            ScriptStep::Reading(reading(900.0, 0.2)),
        ]);

        assert!(source.poll().is_err());

        // The source recovers on the next poll
        let (updated, _) = source.poll().unwrap();
        assert!(updated);
    }
}
