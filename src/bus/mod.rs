//! In-process broadcast bus connecting sessions and the leaderboard

pub mod hub;

pub use hub::{Hub, Member, MemberId, Publisher};
