//! The quiz state machine.
//!
//! [`Game`] is plain synchronous data. Every operation mutates the game and
//! returns the packets it wants sent, each paired with a [`Recipient`]. The
//! game never touches a channel or a clock itself; the actor in
//! [`crate::actor`] feeds it commands and ticks and delivers what comes out.
//! That keeps every rule below testable without a runtime.
//!
//! ```text
//! Lobby ──start──▶ Play ──0s / all answered──▶ Reveal ──0s──▶ Intermission
//!                   ▲                                              │
//!                   └───────────────0s, questions left─────────────┤
//!                                                                  ▼
//!                                                   0s, no questions: End
//! ```
//!
//! Skipping from the host jumps straight to the next question (or End)
//! from any non-terminal state.

use std::sync::atomic::{AtomicU64, Ordering};

use quizhall_protocol::{
    GameId, GameState, JoinCode, LeaderboardEntry, Leaderboard, PlayerDisconnect, PlayerId,
    PlayerInfo, PlayerJoin, PlayerReveal, Question, QuestionShow, Quiz, Recipient, ServerPacket,
    Tick,
};
use quizhall_transport::ConnectionId;

use crate::{GameConfig, GameError};

/// Counter for generating unique player IDs.
static NEXT_PLAYER_ID: AtomicU64 = AtomicU64::new(1);

/// Packets produced by one game operation, in send order.
pub type Outbound = Vec<(Recipient, ServerPacket)>;

/// Points for a correct answer.
///
/// `answered_before` is how many players answered this question before
/// this one; `remaining` is the countdown in seconds at answer time.
/// Saturates at `u32::MAX` for absurdly long answer windows.
pub fn points_for(answered_before: usize, remaining: u32) -> u32 {
    let order_bonus = 5000 - 1000 * answered_before.min(4) as u32;
    let time_bonus = u32::try_from(u64::from(remaining) * 1000 / 60).unwrap_or(u32::MAX);
    order_bonus.saturating_add(time_bonus)
}

/// One player in a game's roster.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub connection: ConnectionId,
    /// Total over the whole game.
    pub points: u32,
    /// Points from the most recently closed question.
    pub last_awarded: u32,
    pub answered: bool,
}

impl Player {
    fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// One hosted quiz session.
#[derive(Debug)]
pub struct Game {
    id: GameId,
    quiz: Quiz,
    code: JoinCode,
    host: ConnectionId,
    state: GameState,
    /// `None` until the first question is shown. Never points past the
    /// last question.
    question_index: Option<usize>,
    /// Whole seconds left in the current phase.
    countdown: u32,
    /// In join order.
    players: Vec<Player>,
    ended: bool,
    config: GameConfig,
}

impl Game {
    pub fn new(
        id: GameId,
        quiz: Quiz,
        code: JoinCode,
        host: ConnectionId,
        config: GameConfig,
    ) -> Self {
        Self {
            id,
            quiz,
            code,
            host,
            state: GameState::Lobby,
            question_index: None,
            countdown: 0,
            players: Vec::new(),
            ended: false,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn code(&self) -> &JoinCode {
        &self.code
    }

    pub fn host(&self) -> ConnectionId {
        self.host
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn question_index(&self) -> Option<usize> {
        self.question_index
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Whether the countdown should be ticking.
    pub fn is_running(&self) -> bool {
        !self.ended && self.state != GameState::Lobby
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.question_index.and_then(|i| self.quiz.questions.get(i))
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Host pressed start: starts the game from the lobby, otherwise skips
    /// to the next question.
    pub fn start_or_skip(&mut self) -> Outbound {
        if self.state == GameState::Lobby {
            self.start()
        } else {
            self.next_question()
        }
    }

    /// Leaves the lobby and shows the first question.
    pub fn start(&mut self) -> Outbound {
        if self.state != GameState::Lobby || self.ended {
            return Vec::new();
        }
        tracing::info!(game_id = %self.id, players = self.players.len(), "game started");
        self.next_question()
    }

    /// Advances to the next question, or ends the game after the last one.
    pub fn next_question(&mut self) -> Outbound {
        if self.ended {
            return Vec::new();
        }
        let next = self.question_index.map_or(0, |i| i + 1);
        let Some(question) = self.quiz.questions.get(next) else {
            return self.end();
        };

        let show = ServerPacket::QuestionShow(QuestionShow {
            question: question.clone(),
        });
        self.question_index = Some(next);
        self.countdown = question.time_limit;
        for player in &mut self.players {
            player.answered = false;
        }
        self.state = GameState::Play;

        tracing::debug!(game_id = %self.id, question = next, "question shown");
        vec![
            (Recipient::Everyone, ServerPacket::state(GameState::Play)),
            (Recipient::Host, show),
        ]
    }

    /// Closes the answer window and tells every player what they earned.
    pub fn reveal(&mut self) -> Outbound {
        if self.state != GameState::Play || self.ended {
            return Vec::new();
        }
        self.countdown = self.config.reveal_secs;

        let mut out = Vec::with_capacity(self.players.len() + 1);
        for player in &mut self.players {
            if !player.answered {
                player.last_awarded = 0;
            }
            out.push((
                Recipient::Player(player.id),
                ServerPacket::PlayerReveal(PlayerReveal {
                    points: player.last_awarded,
                }),
            ));
        }
        self.state = GameState::Reveal;
        out.push((Recipient::Everyone, ServerPacket::state(GameState::Reveal)));
        out
    }

    /// Shows the leaderboard between questions.
    pub fn intermission(&mut self) -> Outbound {
        if self.state != GameState::Reveal || self.ended {
            return Vec::new();
        }
        self.countdown = self.config.intermission_secs;
        self.state = GameState::Intermission;
        vec![
            (
                Recipient::Everyone,
                ServerPacket::state(GameState::Intermission),
            ),
            (
                Recipient::Host,
                ServerPacket::Leaderboard(Leaderboard {
                    entries: self.leaderboard(),
                }),
            ),
        ]
    }

    /// Ends the game. Terminal: nothing transitions out of End.
    pub fn end(&mut self) -> Outbound {
        if self.ended {
            return Vec::new();
        }
        self.ended = true;
        self.state = GameState::End;
        self.countdown = 0;
        tracing::info!(game_id = %self.id, code = %self.code, "game ended");
        vec![(Recipient::Everyone, ServerPacket::state(GameState::End))]
    }

    /// One second passed.
    ///
    /// Sends the remaining time to the host and, when the countdown hits
    /// zero, moves on to whatever follows the current phase.
    pub fn tick(&mut self) -> Outbound {
        if !self.is_running() {
            return Vec::new();
        }
        self.countdown = self.countdown.saturating_sub(1);
        let mut out = vec![(
            Recipient::Host,
            ServerPacket::Tick(Tick {
                tick: self.countdown,
            }),
        )];

        if self.countdown == 0 {
            let next = match self.state {
                GameState::Play => self.reveal(),
                GameState::Reveal => self.intermission(),
                GameState::Intermission => self.next_question(),
                GameState::Lobby | GameState::End => Vec::new(),
            };
            out.extend(next);
        }
        out
    }

    // -----------------------------------------------------------------------
    // Roster
    // -----------------------------------------------------------------------

    /// Adds a player at the end of the roster.
    pub fn join(
        &mut self,
        name: String,
        connection: ConnectionId,
    ) -> Result<(PlayerId, Outbound), GameError> {
        if self.ended {
            return Err(GameError::GameEnded);
        }
        let player = Player {
            id: PlayerId(NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed)),
            name,
            connection,
            points: 0,
            last_awarded: 0,
            answered: false,
        };
        let id = player.id;
        let out = vec![
            (Recipient::Player(id), ServerPacket::state(self.state)),
            (
                Recipient::Host,
                ServerPacket::PlayerJoin(PlayerJoin {
                    player: player.info(),
                }),
            ),
        ];
        tracing::info!(
            game_id = %self.id,
            player_id = %id,
            name = %player.name,
            players = self.players.len() + 1,
            "player joined"
        );
        self.players.push(player);
        Ok((id, out))
    }

    /// Removes a player. Unknown ids are ignored.
    ///
    /// If everyone still in the game has already answered, the question
    /// is revealed right away.
    pub fn leave(&mut self, player_id: PlayerId) -> Outbound {
        let Some(pos) = self.players.iter().position(|p| p.id == player_id) else {
            return Vec::new();
        };
        let player = self.players.remove(pos);
        tracing::info!(
            game_id = %self.id,
            %player_id,
            name = %player.name,
            players = self.players.len(),
            "player left"
        );

        let mut out = vec![(
            Recipient::Host,
            ServerPacket::PlayerDisconnect(PlayerDisconnect { player_id }),
        )];
        if self.everyone_answered() {
            out.extend(self.reveal());
        }
        out
    }

    // -----------------------------------------------------------------------
    // Answers and scoring
    // -----------------------------------------------------------------------

    /// Records a player's answer to the open question.
    ///
    /// Only the first answer per player per question counts, and only
    /// while the question is open.
    pub fn answer(&mut self, player_id: PlayerId, choice: i32) -> Outbound {
        if self.state != GameState::Play || self.ended {
            return Vec::new();
        }
        let answered_before = self.players.iter().filter(|p| p.answered).count();
        let correct = self
            .current_question()
            .is_some_and(|q| q.is_correct(choice));
        let remaining = self.countdown;

        let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) else {
            return Vec::new();
        };
        if player.answered {
            return Vec::new();
        }

        player.last_awarded = if correct {
            points_for(answered_before, remaining)
        } else {
            0
        };
        player.points = player.points.saturating_add(player.last_awarded);
        player.answered = true;
        tracing::debug!(
            game_id = %self.id,
            %player_id,
            correct,
            points = player.last_awarded,
            "answer recorded"
        );

        if self.everyone_answered() {
            self.reveal()
        } else {
            Vec::new()
        }
    }

    /// Top players by total points.
    ///
    /// Ties keep join order. The roster itself is left untouched.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut ranked: Vec<&Player> = self.players.iter().collect();
        ranked.sort_by(|a, b| b.points.cmp(&a.points));
        ranked
            .into_iter()
            .take(self.config.leaderboard_size)
            .map(|p| LeaderboardEntry {
                name: p.name.clone(),
                points: p.points,
            })
            .collect()
    }

    fn everyone_answered(&self) -> bool {
        self.state == GameState::Play
            && !self.players.is_empty()
            && self.players.iter().all(|p| p.answered)
    }
}

// =========================================================================
// Tests
// =========================================================================
