//! Relay lifecycle: hub, leaderboard maintainer and HTTP surface

use std::future::Future;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::bus::Hub;
use crate::config::Config;
use crate::game::Maintainer;
use crate::http::build_router;

use super::AppState;

/// A running relay process
pub struct Relay {
    state: AppState,
    maintainer: JoinHandle<()>,
}

impl Relay {
    /// Create the hub and spawn the leaderboard maintainer.
    /// Must be called inside a tokio runtime.
    pub fn start(config: Config) -> Self {
        let hub = Hub::new();
        let maintainer = tokio::spawn(Maintainer::new(&hub).run());

        Self {
            state: AppState::new(config, hub),
            maintainer,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Serve until `shutdown` resolves, then close every session and stop
    /// the maintainer.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let hub = self.state.hub.clone();
        let router = self.router();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                // upgraded sockets are not tracked by graceful shutdown
                hub.close();
            })
            .await?;

        self.shutdown().await;
        Ok(())
    }

    /// Close the hub, which ends every session, and wait for the
    /// maintainer to drain.
    pub async fn shutdown(self) {
        self.state.hub.close();
        let _ = self.maintainer.await;
        info!("Relay stopped");
    }
}
