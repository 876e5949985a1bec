//! Fixed-point flyer physics, collision and scoring
//!
//! Positions and velocities are in 1/16 px units.

use crate::ws::protocol::User;

use super::course::Course;

pub const SCREEN_WIDTH: i32 = 640;
pub const SCREEN_HEIGHT: i32 = 480;
pub const TILE_SIZE: i32 = 32;
pub const PIPE_WIDTH: i32 = TILE_SIZE * 2;
/// First pipe column offset, in tiles
pub const PIPE_START_OFFSET_X: i32 = 8;
/// Tiles between pipes
pub const PIPE_INTERVAL_X: i32 = 8;
/// Gap height, in tiles
pub const PIPE_GAP_Y: i32 = 5;

/// Horizontal advance per tick
pub const STEP_X16: i32 = 32;
/// Velocity set by a jump
pub const JUMP_VY16: i32 = -96;
/// Velocity gained per tick
pub const GRAVITY_VY16: i32 = 4;
/// Max falling velocity
pub const TERMINAL_VY16: i32 = 96;
pub const SPAWN_Y16: i32 = 100 * 16;

/// Sprite box the hit box is centred in
pub const SPRITE_WIDTH: i32 = 60;
pub const SPRITE_HEIGHT: i32 = 75;
pub const HITBOX_WIDTH: i32 = 30;
pub const HITBOX_HEIGHT: i32 = 60;

pub fn floor_div(x: i32, y: i32) -> i32 {
    let d = x / y;
    if x % y != 0 && (x < 0) != (y < 0) {
        d - 1
    } else {
        d
    }
}

pub fn floor_mod(x: i32, y: i32) -> i32 {
    x - floor_div(x, y) * y
}

/// The locally controlled player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flyer {
    pub x16: i32,
    pub y16: i32,
    pub vy16: i32,
    pub running: bool,
}

impl Flyer {
    pub fn new() -> Self {
        Self {
            x16: 0,
            y16: SPAWN_Y16,
            vy16: 0,
            running: true,
        }
    }

    /// Back to the spawn point, in flight
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance one tick. Returns true on the tick the flyer crashes.
    pub fn step(&mut self, jump: bool, course: &Course) -> bool {
        if !self.running {
            return false;
        }

        // a flyer that never crashes wraps instead of overflowing
        self.x16 = self.x16.wrapping_add(STEP_X16);
        if jump {
            self.vy16 = JUMP_VY16;
        }
        self.y16 += self.vy16;

        self.vy16 = (self.vy16 + GRAVITY_VY16).min(TERMINAL_VY16);

        if self.hits(course) {
            self.running = false;
            return true;
        }
        false
    }

    /// Whether the hit box overlaps a pipe or has left the play area
    pub fn hits(&self, course: &Course) -> bool {
        let x0 = floor_div(self.x16, 16) + (SPRITE_WIDTH - HITBOX_WIDTH) / 2;
        let y0 = floor_div(self.y16, 16) + (SPRITE_HEIGHT - HITBOX_HEIGHT) / 2;
        let x1 = x0 + HITBOX_WIDTH;
        let y1 = y0 + HITBOX_HEIGHT;

        if y0 < -TILE_SIZE * 4 {
            return true;
        }
        if y1 >= SCREEN_HEIGHT - TILE_SIZE {
            return true;
        }

        let x_min = floor_div(x0 - PIPE_WIDTH, TILE_SIZE);
        let x_max = floor_div(x0 + HITBOX_WIDTH, TILE_SIZE);
        (x_min..=x_max).any(|x| {
            let Some(gap_y) = course.pipe_at(x) else {
                return false;
            };
            if x0 >= x * TILE_SIZE + PIPE_WIDTH || x1 < x * TILE_SIZE {
                return false;
            }
            y0 < gap_y * TILE_SIZE || y1 >= (gap_y + PIPE_GAP_Y) * TILE_SIZE
        })
    }

    /// Pipes passed so far
    pub fn score(&self) -> i32 {
        let tile_x = floor_div(floor_div(self.x16, 16), TILE_SIZE);
        if tile_x - PIPE_START_OFFSET_X <= 0 {
            return 0;
        }
        floor_div(tile_x - PIPE_START_OFFSET_X, PIPE_INTERVAL_X)
    }

    /// Snapshot to send to the relay (identity is stamped by the relay)
    pub fn to_user(&self, name: &str) -> User {
        User {
            name: name.to_string(),
            x16: self.x16,
            y16: self.y16,
            vy16: self.vy16,
            running: self.running,
            score: self.score(),
            ..Default::default()
        }
    }
}

impl Default for Flyer {
    fn default() -> Self {
        Self::new()
    }
}
