//! Procedural pipe course

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::physics::{floor_div, floor_mod, PIPE_INTERVAL_X, PIPE_START_OFFSET_X};

/// Length of the per-game gap table; the course repeats after this many pipes
pub const COURSE_LENGTH: usize = 256;

/// Topmost tile row a gap may start at
pub const MIN_GAP_TILE_Y: i32 = 2;
/// Bottommost tile row a gap may start at
pub const MAX_GAP_TILE_Y: i32 = 7;

/// Gap positions for one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    gaps: Vec<i32>,
}

impl Course {
    /// Deterministic course for a seed
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let gaps = (0..COURSE_LENGTH)
            .map(|_| rng.gen_range(MIN_GAP_TILE_Y..=MAX_GAP_TILE_Y))
            .collect();
        Self { gaps }
    }

    /// Course with an explicit gap table (must not be empty)
    pub fn from_gaps(gaps: Vec<i32>) -> Self {
        debug_assert!(!gaps.is_empty());
        Self { gaps }
    }

    pub fn gaps(&self) -> &[i32] {
        &self.gaps
    }

    /// Gap top row of the pipe at a tile column, if that column has one
    pub fn pipe_at(&self, tile_x: i32) -> Option<i32> {
        let offset = tile_x - PIPE_START_OFFSET_X;
        if offset <= 0 || self.gaps.is_empty() {
            return None;
        }
        if floor_mod(offset, PIPE_INTERVAL_X) != 0 {
            return None;
        }
        let idx = floor_div(offset, PIPE_INTERVAL_X) as usize;
        Some(self.gaps[idx % self.gaps.len()])
    }
}
