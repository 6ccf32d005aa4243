//! Game directory: creates games, tracks connections, routes packets.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use quizhall_protocol::{
    ClientPacket, Codec, GameId, GameState, HostGameReply, JoinCode, JsonCodec, PacketCodec,
    PlayerId, QuizId, ServerPacket,
};
use quizhall_transport::ConnectionId;
use rand::Rng;

use crate::actor::spawn_game;
use crate::registry::Role;
use crate::{
    ConnectionRegistry, Game, GameConfig, GameError, GameHandle, PacketSender, QuizRepository,
};

/// Counter for generating unique game IDs.
static NEXT_GAME_ID: AtomicU64 = AtomicU64::new(1);

/// Owns every live game and the registry of who is connected to which.
///
/// This is the entry point for the server's connection handlers: they
/// hand it raw bytes through [`dispatch`](Self::dispatch) and it does the
/// rest. It is meant to sit behind one `tokio::sync::Mutex`; each game's
/// own state lives in its actor, not here.
pub struct GameDirectory<R, C = JsonCodec> {
    repository: R,
    codec: PacketCodec<C>,
    config: GameConfig,
    games: HashMap<GameId, GameHandle>,
    registry: ConnectionRegistry,
}

impl<R: QuizRepository> GameDirectory<R, JsonCodec> {
    /// Creates an empty directory that speaks JSON payloads.
    pub fn new(repository: R, config: GameConfig) -> Self {
        Self::with_codec(repository, PacketCodec::json(), config)
    }
}

impl<R: QuizRepository, C: Codec> GameDirectory<R, C> {
    pub fn with_codec(repository: R, codec: PacketCodec<C>, config: GameConfig) -> Self {
        Self {
            repository,
            codec,
            config,
            games: HashMap::new(),
            registry: ConnectionRegistry::new(),
        }
    }

    /// Starts a new game of `quiz_id` hosted by `connection`.
    ///
    /// The host receives the join code, then the Lobby state.
    pub async fn host_game(
        &mut self,
        connection: ConnectionId,
        outbound: &PacketSender,
        quiz_id: &QuizId,
    ) -> Result<GameId, GameError> {
        if self.registry.is_bound(connection) {
            return Err(GameError::AlreadyAssigned(connection));
        }
        let quiz = self
            .repository
            .fetch_by_id(quiz_id)
            .await?
            .ok_or_else(|| GameError::QuizNotFound(quiz_id.clone()))?;

        let game_id = GameId(NEXT_GAME_ID.fetch_add(1, Ordering::Relaxed));
        let code = self.generate_code();
        self.registry.register_game(code.clone(), game_id)?;
        self.registry.bind_host(connection, game_id)?;

        let game = Game::new(game_id, quiz, code.clone(), connection, self.config.clone());
        let handle = spawn_game(game, outbound.clone(), &self.config);
        self.games.insert(game_id, handle);
        tracing::info!(%game_id, %code, quiz = %quiz_id, host = %connection, "game created");

        let replies = [
            ServerPacket::HostGame(HostGameReply { code }),
            ServerPacket::state(GameState::Lobby),
        ];
        let failed = replies
            .into_iter()
            .filter(|packet| outbound.send(packet.clone()).is_err())
            .count();
        if failed > 0 {
            return Err(GameError::SendFailed { failed });
        }
        Ok(game_id)
    }

    /// Adds `connection` as a player to the game using `code`.
    pub async fn join_game(
        &mut self,
        connection: ConnectionId,
        outbound: &PacketSender,
        code: &JoinCode,
        name: String,
    ) -> Result<PlayerId, GameError> {
        if self.registry.is_bound(connection) {
            return Err(GameError::AlreadyAssigned(connection));
        }
        let game_id = self
            .registry
            .game_by_code(code)
            .ok_or_else(|| GameError::UnknownJoinCode(code.to_string()))?;
        let handle = self.games.get(&game_id).ok_or(GameError::NotFound(game_id))?;

        let player_id = handle.join(name, connection, outbound.clone()).await?;
        self.registry.bind_player(connection, game_id, player_id)?;
        Ok(player_id)
    }

    /// Forwards a player's answer to their game.
    pub async fn submit_answer(
        &self,
        connection: ConnectionId,
        choice: i32,
    ) -> Result<(), GameError> {
        let (game_id, player_id) = self
            .registry
            .game_by_player(connection)
            .ok_or(GameError::UnknownConnection(connection))?;
        self.handle(game_id)?.answer(player_id, choice).await
    }

    /// Forwards the host's start (or skip) to their game.
    pub async fn start_or_skip(&self, connection: ConnectionId) -> Result<(), GameError> {
        let game_id = self
            .registry
            .game_by_host(connection)
            .ok_or(GameError::UnknownConnection(connection))?;
        self.handle(game_id)?.start_or_skip().await
    }

    /// Handles a closed connection.
    ///
    /// A player leaves their game. A host's game ends at once and is
    /// removed along with its join code. Unknown connections are ignored.
    pub async fn disconnect(&mut self, connection: ConnectionId) -> Result<(), GameError> {
        let Some(membership) = self.registry.unbind(connection) else {
            return Ok(());
        };
        let game_id = membership.game_id;
        match membership.role {
            Role::Player(player_id) => self.handle(game_id)?.leave(player_id).await,
            Role::Host => {
                self.registry.remove_game(game_id);
                let Some(handle) = self.games.remove(&game_id) else {
                    return Ok(());
                };
                tracing::info!(%game_id, "host disconnected, ending game");
                handle.host_left().await
            }
        }
    }

    /// Decodes one incoming message and routes it.
    ///
    /// Nothing here is fatal: undecodable input and routing failures are
    /// logged at debug and dropped.
    pub async fn dispatch(&mut self, connection: ConnectionId, outbound: &PacketSender, data: &[u8]) {
        let packet = match self.codec.decode_client(data) {
            Ok(Some(packet)) => packet,
            Ok(None) => {
                tracing::debug!(%connection, len = data.len(), "dropped message without a packet");
                return;
            }
            Err(e) => {
                tracing::debug!(%connection, error = %e, "dropped malformed packet");
                return;
            }
        };

        let result = match packet {
            ClientPacket::Connect(connect) => self
                .join_game(connection, outbound, &connect.code, connect.name)
                .await
                .map(|_| ()),
            ClientPacket::HostGame(request) => self
                .host_game(connection, outbound, &request.quiz_id)
                .await
                .map(|_| ()),
            ClientPacket::StartGame(_) => self.start_or_skip(connection).await,
            ClientPacket::QuestionAnswer(answer) => {
                self.submit_answer(connection, answer.choice).await
            }
        };

        if let Err(e) = result {
            tracing::debug!(%connection, error = %e, "packet dropped");
        }
    }

    /// Removes games whose actor has exited, and everything registered
    /// for them. Returns how many were removed.
    pub fn reap(&mut self) -> usize {
        let finished: Vec<GameId> = self
            .games
            .iter()
            .filter(|(_, handle)| handle.is_closed())
            .map(|(id, _)| *id)
            .collect();
        for game_id in &finished {
            self.games.remove(game_id);
            self.registry.remove_game(*game_id);
            tracing::info!(%game_id, "game reaped");
        }
        finished.len()
    }

    pub fn game(&self, game_id: GameId) -> Option<&GameHandle> {
        self.games.get(&game_id)
    }

    pub fn game_by_code(&self, code: &JoinCode) -> Option<&GameHandle> {
        self.registry
            .game_by_code(code)
            .and_then(|id| self.games.get(&id))
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    fn handle(&self, game_id: GameId) -> Result<&GameHandle, GameError> {
        self.games.get(&game_id).ok_or(GameError::NotFound(game_id))
    }

    /// Picks a random six-digit code not used by any live game.
    fn generate_code(&self) -> JoinCode {
        let mut rng = rand::rng();
        loop {
            let code = JoinCode::from_number(rng.random_range(100_000..1_000_000));
            if !self.registry.code_in_use(&code) {
                return code;
            }
        }
    }
}
