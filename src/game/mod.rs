//! Game rules: leaderboard upkeep and flyer simulation

pub mod course;
pub mod leaderboard;
pub mod physics;

pub use course::Course;
pub use leaderboard::{Leaderboard, Maintainer};
pub use physics::Flyer;
