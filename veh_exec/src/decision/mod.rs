//! # Decision module
//!
//! Stateful decision controllers turning navigational features into bounded
//! steering/throttle commands. Two controllers are provided, matching the
//! two perception variants: [`WallFollowDecision`] (pure P control) and
//! [`CorridorDecision`] (PD control with optional I term, corner
//! deceleration and steering rate limiting).
//!
//! Each controller owns its filter and limiter state privately and is the
//! sole author of the monotonic command `frame_id` sequence.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod corridor;
mod differential;
mod integral;
mod params;
mod rate_limiter;
mod wall_follow;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use corridor::*;
pub use differential::DifferentialController;
pub use integral::IntegralController;
pub use params::*;
pub use rate_limiter::RateLimiter;
pub use wall_follow::*;
