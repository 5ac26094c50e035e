//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use geoduel_shared::time::Clock;
use tokio::{net::TcpListener, sync::watch};
use tower_http::trace::TraceLayer;

use crate::domain::{DistanceLookup, LocationGenerator, MessagePusher, RoomPolicy, RoomRepository};

use super::{
    handler::{get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
    sweeper::spawn_sweeper,
};

/// Runtime settings collected from the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServerConfig {
    pub policy: RoomPolicy,
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            policy: RoomPolicy::default(),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Realtime room server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     repository,
///     message_pusher,
///     Arc::new(SystemClock),
///     Arc::new(RandomLocationGenerator),
///     Arc::new(HaversineDistance),
///     ServerConfig::default(),
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    sweep_interval: Duration,
}

impl Server {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        generator: Arc<dyn LocationGenerator>,
        distance: Arc<dyn DistanceLookup>,
        config: ServerConfig,
    ) -> Self {
        let state = AppState::new(
            repository,
            message_pusher,
            clock,
            generator,
            distance,
            config.policy,
        );
        Self {
            state: Arc::new(state),
            sweep_interval: config.sweep_interval,
        }
    }

    fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server until Ctrl+C / SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Room server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// The expiry sweeper runs for exactly as long as the server does.
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        let sweeper = spawn_sweeper(self.state.clone(), self.sweep_interval, stop_rx);

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await;

        let _ = stop_tx.send(true);
        if let Err(e) = sweeper.await {
            tracing::warn!("Sweeper task ended abnormally: {}", e);
        }
        result?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
