//! Mock pulse sink
//!
//! Records every duty cycle write for inspection, standing in for the
//! servo driver board in simulation and tests. Can be built in a failing
//! state to exercise the driver error paths.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use ctrl_if::stages::{PulseSink, SinkError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A recording pulse sink.
#[derive(Debug, Default)]
pub struct MockPulseSink {
    /// All accepted writes, in order, as `(channel, duty_cycle)`.
    pub writes: Vec<(u8, u16)>,

    /// When true every write fails with an I2C error.
    pub fail: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MockPulseSink {
    /// Create a sink which accepts all writes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink which rejects all writes.
    pub fn failing() -> Self {
        Self {
            writes: Vec::new(),
            fail: true
        }
    }

    /// The most recent duty cycle written to the given channel.
    pub fn last_for_channel(&self, channel: u8) -> Option<u16> {
        self.writes
            .iter()
            .rev()
            .find(|(c, _)| *c == channel)
            .map(|(_, d)| *d)
    }
}

impl PulseSink for MockPulseSink {
    fn set_duty_cycle(&mut self, channel: u8, duty_cycle: u16) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::I2c);
        }

        self.writes.push((channel, duty_cycle));
        Ok(())
    }
}
