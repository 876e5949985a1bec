//! Per-session limit on in-flight updates

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;

/// Default in-flight updates allowed per second
pub const INPUT_RATE_LIMIT: u32 = 30;

pub struct PlayerRateLimiter {
    limiter: DefaultDirectRateLimiter,
}

impl PlayerRateLimiter {
    /// A zero quota is raised to one update per second
    pub fn new(updates_per_second: u32) -> Self {
        let per_second = NonZeroU32::new(updates_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        }
    }

    /// Take one token; false once the quota is spent
    pub fn check_input(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl Default for PlayerRateLimiter {
    fn default() -> Self {
        Self::new(INPUT_RATE_LIMIT)
    }
}
