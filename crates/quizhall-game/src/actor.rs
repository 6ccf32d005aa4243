//! Game actor: an isolated Tokio task that owns one [`Game`].
//!
//! Each game runs in its own task, reached only through a bounded mpsc
//! channel. The countdown clock lives in the same `select!` loop as the
//! command channel, so a tick and a player's answer can never interleave
//! halfway through a transition.

use std::collections::HashMap;
use std::time::Duration;

use quizhall_protocol::{GameId, GameState, JoinCode, PlayerId, Recipient, ServerPacket};
use quizhall_tick::TickScheduler;
use quizhall_transport::ConnectionId;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};

use crate::game::Outbound;
use crate::{Game, GameConfig, GameError};

/// Channel sender for delivering packets to one connection's writer task.
pub type PacketSender = mpsc::UnboundedSender<ServerPacket>;

/// Commands sent to a game actor through its channel.
///
/// Variants carrying a `oneshot::Sender` expect a reply; the rest are
/// fire-and-forget.
pub(crate) enum GameCommand {
    /// Add a player to the roster.
    Join {
        name: String,
        connection: ConnectionId,
        sender: PacketSender,
        reply: oneshot::Sender<Result<PlayerId, GameError>>,
    },

    /// A player picked a choice.
    Answer { player_id: PlayerId, choice: i32 },

    /// The host pressed start (or skip).
    StartOrSkip,

    /// A player's connection went away.
    Leave { player_id: PlayerId },

    /// The host's connection went away. Ends the game and stops the actor.
    HostLeft,

    /// Request a snapshot of the game.
    GetInfo { reply: oneshot::Sender<GameInfo> },

    /// Stop the actor without ending the game for its players.
    Shutdown,
}

/// A snapshot of a running game.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub game_id: GameId,
    pub code: JoinCode,
    pub state: GameState,
    pub question_index: Option<usize>,
    pub countdown: u32,
    pub player_count: usize,
}

/// Handle to a running game actor.
///
/// Cheap to clone. The directory holds one per live game.
#[derive(Clone)]
pub struct GameHandle {
    game_id: GameId,
    code: JoinCode,
    sender: mpsc::Sender<GameCommand>,
}

impl GameHandle {
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    pub fn code(&self) -> &JoinCode {
        &self.code
    }

    /// Returns `true` once the actor has exited.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Adds a player and waits for the id the game assigned.
    pub async fn join(
        &self,
        name: String,
        connection: ConnectionId,
        sender: PacketSender,
    ) -> Result<PlayerId, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(GameCommand::Join {
            name,
            connection,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| GameError::Unavailable(self.game_id))?
    }

    pub async fn answer(&self, player_id: PlayerId, choice: i32) -> Result<(), GameError> {
        self.send(GameCommand::Answer { player_id, choice }).await
    }

    pub async fn start_or_skip(&self) -> Result<(), GameError> {
        self.send(GameCommand::StartOrSkip).await
    }

    pub async fn leave(&self, player_id: PlayerId) -> Result<(), GameError> {
        self.send(GameCommand::Leave { player_id }).await
    }

    pub async fn host_left(&self) -> Result<(), GameError> {
        self.send(GameCommand::HostLeft).await
    }

    pub async fn info(&self) -> Result<GameInfo, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(GameCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| GameError::Unavailable(self.game_id))
    }

    pub async fn shutdown(&self) -> Result<(), GameError> {
        self.send(GameCommand::Shutdown).await
    }

    async fn send(&self, cmd: GameCommand) -> Result<(), GameError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| GameError::Unavailable(self.game_id))
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct GameActor {
    game: Game,
    host: PacketSender,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, PacketSender>,
    clock: TickScheduler,
    end_grace: Duration,
    /// Set once the game ends; the actor exits at this instant.
    linger_until: Option<Instant>,
    receiver: mpsc::Receiver<GameCommand>,
}

enum Flow {
    Continue,
    Stop,
}

impl GameActor {
    async fn run(mut self) {
        tracing::info!(
            game_id = %self.game.id(),
            code = %self.game.code(),
            quiz = %self.game.quiz().id,
            "game actor started"
        );

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if let Flow::Stop = self.handle(cmd) {
                        break;
                    }
                }
                _ = self.clock.wait_for_tick() => {
                    let out = self.game.tick();
                    self.deliver(out);
                    self.clock.record_tick_end();
                }
                _ = linger(self.linger_until) => {
                    tracing::debug!(game_id = %self.game.id(), "end grace elapsed");
                    break;
                }
            }
            self.sync_clock();
        }

        tracing::info!(game_id = %self.game.id(), "game actor stopped");
    }

    fn handle(&mut self, cmd: GameCommand) -> Flow {
        match cmd {
            GameCommand::Join {
                name,
                connection,
                sender,
                reply,
            } => {
                let result = self.game.join(name, connection).map(|(player_id, out)| {
                    self.senders.insert(player_id, sender);
                    self.deliver(out);
                    player_id
                });
                let _ = reply.send(result);
            }
            GameCommand::Answer { player_id, choice } => {
                let out = self.game.answer(player_id, choice);
                self.deliver(out);
            }
            GameCommand::StartOrSkip => {
                let out = self.game.start_or_skip();
                self.deliver(out);
            }
            GameCommand::Leave { player_id } => {
                self.senders.remove(&player_id);
                let out = self.game.leave(player_id);
                self.deliver(out);
            }
            GameCommand::HostLeft => {
                tracing::info!(game_id = %self.game.id(), "host left");
                let out = self.game.end();
                self.deliver(out);
                return Flow::Stop;
            }
            GameCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            GameCommand::Shutdown => {
                tracing::info!(game_id = %self.game.id(), "game shutting down");
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    /// Keeps the clock in step with the game: ticking while a phase is
    /// counting down, paused in the lobby and after the end.
    fn sync_clock(&mut self) {
        if self.game.is_running() {
            self.clock.resume();
        } else {
            self.clock.pause();
        }
        if self.game.is_ended() && self.linger_until.is_none() {
            self.linger_until = Some(Instant::now() + self.end_grace);
        }
    }

    fn deliver(&self, out: Outbound) {
        if let Err(e) = self.dispatch(out) {
            tracing::debug!(game_id = %self.game.id(), error = %e, "send failed");
        }
    }

    /// Sends each packet to its recipients.
    ///
    /// Player copies go through [`ServerPacket::for_player`]. A failed send
    /// is counted and the fan-out carries on.
    fn dispatch(&self, out: Outbound) -> Result<(), GameError> {
        let mut failed = 0;
        for (recipient, packet) in out {
            match recipient {
                Recipient::Host => {
                    failed += usize::from(self.host.send(packet).is_err());
                }
                Recipient::Player(player_id) => {
                    failed += usize::from(!self.send_to(player_id, packet.for_player()));
                }
                Recipient::Everyone => {
                    let player_copy = packet.for_player();
                    for player in self.game.players() {
                        failed += usize::from(!self.send_to(player.id, player_copy.clone()));
                    }
                    failed += usize::from(self.host.send(packet).is_err());
                }
            }
        }
        if failed > 0 {
            return Err(GameError::SendFailed { failed });
        }
        Ok(())
    }

    fn send_to(&self, player_id: PlayerId, packet: ServerPacket) -> bool {
        self.senders
            .get(&player_id)
            .is_some_and(|sender| sender.send(packet).is_ok())
    }

    fn info(&self) -> GameInfo {
        GameInfo {
            game_id: self.game.id(),
            code: self.game.code().clone(),
            state: self.game.state(),
            question_index: self.game.question_index(),
            countdown: self.game.countdown(),
            player_count: self.game.players().len(),
        }
    }
}

async fn linger(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Spawns a game actor task and returns a handle to it.
///
/// `host` receives every packet addressed to the host, including the
/// full question with its correctness flags.
pub(crate) fn spawn_game(game: Game, host: PacketSender, config: &GameConfig) -> GameHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let handle = GameHandle {
        game_id: game.id(),
        code: game.code().clone(),
        sender: tx,
    };

    let actor = GameActor {
        game,
        host,
        senders: HashMap::new(),
        clock: TickScheduler::idle(config.tick.clone()),
        end_grace: config.end_grace,
        linger_until: None,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    handle
}
