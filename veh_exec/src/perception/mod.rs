//! # Perception module
//!
//! Turns raw multi-directional distance readings into navigational
//! features. Two extractors are provided: [`WallFollowPerception`] tracks a
//! fixed offset from the left wall, [`CorridorPerception`] balances the two
//! diagonal clearances to run the corridor centre.
//!
//! Both are stateless: features are a pure function of the configured
//! thresholds and the current reading.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod corridor;
mod params;
mod wall_follow;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use corridor::*;
pub use params::*;
pub use wall_follow::*;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Normalise a raw distance for use in feature extraction.
///
/// Malformed values (NaN, negative) and sensor-saturated values are mapped
/// to the detection cap, i.e. treated as "no wall in range", so that they
/// cannot dominate an error term or trip an obstacle threshold. This keeps
/// the control loop live on bad input rather than propagating a failure.
pub(crate) fn sanitise_distance(distance_mm: f64, cap_mm: f64) -> f64 {
    if !distance_mm.is_finite() || distance_mm < 0.0 {
        return cap_mm;
    }

    if distance_mm > cap_mm {
        cap_mm
    }
    else {
        distance_mm
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sanitise_distance() {
        assert_eq!(sanitise_distance(250.0, 1200.0), 250.0);
        assert_eq!(sanitise_distance(8190.0, 1200.0), 1200.0);
        assert_eq!(sanitise_distance(-5.0, 1200.0), 1200.0);
        assert_eq!(sanitise_distance(std::f64::NAN, 1200.0), 1200.0);
        assert_eq!(sanitise_distance(std::f64::INFINITY, 1200.0), 1200.0);
    }
}
