//! Last-good-value reading cache
//!
//! Event-driven sensors only update some of their channels per poll. The
//! cache owns the per-channel last known values so a partial update
//! produces a complete snapshot with the remaining channels retained, never
//! zeroed. It is owned by a sensor adapter and exposed only through the
//! snapshots it returns.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::SensorChannel;
use ctrl_if::reading::DistanceReading;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Per-channel last known distance values.
#[derive(Clone, Copy, Debug)]
pub struct ReadingCache {
    front_mm: f64,
    left_mm: f64,
    left_front_mm: f64,
    right_front_mm: f64,

    /// Time of the most recent channel update
    timestamp_s: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ReadingCache {
    /// Create a cache with every channel initialised to the given "far"
    /// value, so a channel that has never reported reads as open rather
    /// than as an obstacle at zero range.
    pub fn new(initial_range_mm: f64) -> Self {
        Self {
            front_mm: initial_range_mm,
            left_mm: initial_range_mm,
            left_front_mm: initial_range_mm,
            right_front_mm: initial_range_mm,
            timestamp_s: 0.0
        }
    }

    /// Store a new value for one channel.
    pub fn update(&mut self, channel: SensorChannel, value_mm: f64, timestamp_s: f64) {
        match channel {
            SensorChannel::Front => self.front_mm = value_mm,
            SensorChannel::Left => self.left_mm = value_mm,
            SensorChannel::LeftFront => self.left_front_mm = value_mm,
            SensorChannel::RightFront => self.right_front_mm = value_mm
        }

        self.timestamp_s = timestamp_s;
    }

    /// Replace all channels at once from a full reading.
    pub fn update_all(&mut self, reading: &DistanceReading) {
        self.front_mm = reading.front_mm;
        self.left_mm = reading.left_mm;
        self.left_front_mm = reading.left_front_mm;
        self.right_front_mm = reading.right_front_mm;
        self.timestamp_s = reading.timestamp_s;
    }

    /// A complete snapshot of the current channel values.
    pub fn snapshot(&self) -> DistanceReading {
        DistanceReading {
            front_mm: self.front_mm,
            left_mm: self.left_mm,
            left_front_mm: self.left_front_mm,
            right_front_mm: self.right_front_mm,
            timestamp_s: self.timestamp_s
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_update_retains_other_channels() {
        let mut cache = ReadingCache::new(8190.0);

        cache.update(SensorChannel::Front, 350.0, 0.1);
        cache.update(SensorChannel::Left, 210.0, 0.2);

        let snap = cache.snapshot();
        assert_eq!(snap.front_mm, 350.0);
        assert_eq!(snap.left_mm, 210.0);
        // Channels that never reported stay at the far value
        assert_eq!(snap.left_front_mm, 8190.0);
        assert_eq!(snap.right_front_mm, 8190.0);
        assert_eq!(snap.timestamp_s, 0.2);

        // A later front update must not disturb the left value
        cache.update(SensorChannel::Front, 340.0, 0.3);
        let snap = cache.snapshot();
        assert_eq!(snap.left_mm, 210.0);
        assert_eq!(snap.front_mm, 340.0);
        assert_eq!(snap.timestamp_s, 0.3);
    }
}
