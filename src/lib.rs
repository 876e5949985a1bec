//! Flappy Online - real-time relay and client replica cache
//!
//! The relay fans player updates out to every connected client over a
//! broadcast hub and keeps a top-5 leaderboard. Clients mirror remote
//! players into a concurrent replica cache read by their game loop.

pub mod app;
pub mod bus;
pub mod client;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;

pub use app::{AppState, Relay};
pub use client::{RelayClient, Replica, ReplicaCache};
pub use config::Config;
