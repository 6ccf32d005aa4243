//! `QuizhallServer` builder and server loop.
//!
//! This is the entry point for running a quiz server. It ties together
//! all the layers: transport → protocol → directory → game actors.

use std::sync::{Arc, Weak};
use std::time::Duration;

use quizhall_game::{GameConfig, GameDirectory, QuizRepository};
use quizhall_protocol::{Codec, JsonCodec, PacketCodec};
use quizhall_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::QuizhallError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// directory sits behind one coarse lock; each game's own state lives in
/// its actor and is never behind it.
pub(crate) struct ServerState<R, C> {
    pub(crate) directory: Mutex<GameDirectory<R, C>>,
    pub(crate) codec: PacketCodec<C>,
}

/// Builder for configuring and starting a Quizhall server.
///
/// # Example
///
/// ```rust,ignore
/// let server = QuizhallServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .reap_interval(Duration::from_secs(30))
///     .build(quizzes)
///     .await?;
/// server.run().await
/// ```
pub struct QuizhallServerBuilder {
    bind_addr: String,
    game_config: GameConfig,
    reap_interval: Duration,
}

impl QuizhallServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            game_config: GameConfig::default(),
            reap_interval: Duration::from_secs(10),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration every hosted game uses.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Sets how often finished games are swept from the directory.
    pub fn reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }

    /// Binds the listener and builds the server around `repository`.
    ///
    /// Uses `JsonCodec` payloads and `WebSocketTransport`.
    pub async fn build<R: QuizRepository>(
        self,
        repository: R,
    ) -> Result<QuizhallServer<R, JsonCodec>, QuizhallError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let codec = PacketCodec::json();

        let state = Arc::new(ServerState {
            directory: Mutex::new(GameDirectory::with_codec(
                repository,
                codec,
                self.game_config,
            )),
            codec,
        });

        Ok(QuizhallServer {
            transport,
            state,
            reap_interval: self.reap_interval,
        })
    }
}

impl Default for QuizhallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Quizhall server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct QuizhallServer<R, C> {
    transport: WebSocketTransport,
    state: Arc<ServerState<R, C>>,
    reap_interval: Duration,
}

impl<R, C> QuizhallServer<R, C>
where
    R: QuizRepository,
    C: Codec + Clone,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Spawns the reaper, then a handler task for each accepted
    /// connection. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), QuizhallError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Quizhall server running");

        tokio::spawn(reap_loop(Arc::downgrade(&self.state), self.reap_interval));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Sweeps finished games out of the directory every `period`.
///
/// Exits once the server state is gone.
async fn reap_loop<R, C>(state: Weak<ServerState<R, C>>, period: Duration)
where
    R: QuizRepository,
    C: Codec,
{
    let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        let Some(state) = state.upgrade() else {
            break;
        };
        let mut directory = state.directory.lock().await;
        let reaped = directory.reap();
        if reaped > 0 {
            tracing::debug!(reaped, live = directory.game_count(), "reaped finished games");
        }
    }
}
