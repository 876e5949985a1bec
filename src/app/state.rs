//! Application state shared across routes

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::bus::Hub;
use crate::config::Config;
use crate::ws::session::SessionOptions;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub hub: Hub,
    connections: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(config: Config, hub: Hub) -> Self {
        Self {
            config: Arc::new(config),
            hub,
            connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            input_rate_limit: self.config.input_rate_limit,
        }
    }

    /// Open websocket sessions
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }

    pub(crate) fn connection_opened(&self) -> usize {
        self.connections.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn connection_closed(&self) -> usize {
        self.connections.fetch_sub(1, Ordering::Relaxed) - 1
    }
}
