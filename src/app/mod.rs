//! Application state and relay lifecycle

pub mod relay;
pub mod state;

pub use relay::Relay;
pub use state::AppState;
