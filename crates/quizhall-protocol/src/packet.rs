//! The packet catalog.
//!
//! Every message on a connection is one byte of tag followed by a JSON
//! object. The tag space is shared by both directions, so tag `1` is a
//! host's "host this quiz" request on the way in and the server's "here
//! is your join code" reply on the way out.
//!
//! | Tag | Packet | Direction |
//! |----:|--------|-----------|
//! | 0 | Connect | player → server |
//! | 1 | HostGame | host ↔ server |
//! | 2 | QuestionShow | server → host |
//! | 3 | ChangeGameState | server → everyone |
//! | 4 | PlayerJoin | server → host |
//! | 5 | StartGame | host → server |
//! | 6 | Tick | server → host |
//! | 7 | QuestionAnswer | player → server |
//! | 8 | PlayerReveal | server → player |
//! | 9 | Leaderboard | server → host |
//! | 10 | PlayerDisconnect | server → host |
//!
//! The two directions are separate closed enums, [`ClientPacket`] and
//! [`ServerPacket`]. Adding a packet means adding a variant, and every
//! `match` that must handle it stops compiling until it does.

use serde::{Deserialize, Serialize};

use crate::{GameState, JoinCode, LeaderboardEntry, PlayerId, PlayerInfo, Question, QuizId};

/// Tag bytes, one per packet kind.
pub mod tag {
    pub const CONNECT: u8 = 0;
    pub const HOST_GAME: u8 = 1;
    pub const QUESTION_SHOW: u8 = 2;
    pub const CHANGE_GAME_STATE: u8 = 3;
    pub const PLAYER_JOIN: u8 = 4;
    pub const START_GAME: u8 = 5;
    pub const TICK: u8 = 6;
    pub const QUESTION_ANSWER: u8 = 7;
    pub const PLAYER_REVEAL: u8 = 8;
    pub const LEADERBOARD: u8 = 9;
    pub const PLAYER_DISCONNECT: u8 = 10;
}

// ---------------------------------------------------------------------------
// Client → server payloads
// ---------------------------------------------------------------------------

/// A player asks to join the game with the given code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connect {
    pub code: JoinCode,
    pub name: String,
}

/// A host asks to start hosting a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostGameRequest {
    pub quiz_id: QuizId,
}

/// The host starts the game, or skips to the next question.
///
/// A braced struct rather than a unit struct so it encodes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartGame {}

/// A player picks a choice for the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    /// Index into the current question's choices. Kept signed: a negative
    /// index is a valid (wrong) answer, not a malformed packet.
    #[serde(rename = "question")]
    pub choice: i32,
}

// ---------------------------------------------------------------------------
// Server → client payloads
// ---------------------------------------------------------------------------

/// Reply to [`HostGameRequest`]: the join code of the new game.
///
/// Shares tag and field name with the request; the field carries the
/// join code instead of a quiz id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostGameReply {
    #[serde(rename = "quizId")]
    pub code: JoinCode,
}

/// The question now on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionShow {
    pub question: Question,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeGameState {
    pub state: GameState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerJoin {
    pub player: PlayerInfo,
}

/// Seconds left in the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub tick: u32,
}

/// Points a player earned on the question that just closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerReveal {
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    #[serde(rename = "points")]
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDisconnect {
    pub player_id: PlayerId,
}

// ---------------------------------------------------------------------------
// Direction enums
// ---------------------------------------------------------------------------

/// Everything a server accepts from a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientPacket {
    Connect(Connect),
    HostGame(HostGameRequest),
    StartGame(StartGame),
    QuestionAnswer(QuestionAnswer),
}

impl ClientPacket {
    pub fn tag(&self) -> u8 {
        match self {
            Self::Connect(_) => tag::CONNECT,
            Self::HostGame(_) => tag::HOST_GAME,
            Self::StartGame(_) => tag::START_GAME,
            Self::QuestionAnswer(_) => tag::QUESTION_ANSWER,
        }
    }
}

/// Everything a server sends to a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerPacket {
    HostGame(HostGameReply),
    QuestionShow(QuestionShow),
    ChangeGameState(ChangeGameState),
    PlayerJoin(PlayerJoin),
    Tick(Tick),
    PlayerReveal(PlayerReveal),
    Leaderboard(Leaderboard),
    PlayerDisconnect(PlayerDisconnect),
}

impl ServerPacket {
    pub fn tag(&self) -> u8 {
        match self {
            Self::HostGame(_) => tag::HOST_GAME,
            Self::QuestionShow(_) => tag::QUESTION_SHOW,
            Self::ChangeGameState(_) => tag::CHANGE_GAME_STATE,
            Self::PlayerJoin(_) => tag::PLAYER_JOIN,
            Self::Tick(_) => tag::TICK,
            Self::PlayerReveal(_) => tag::PLAYER_REVEAL,
            Self::Leaderboard(_) => tag::LEADERBOARD,
            Self::PlayerDisconnect(_) => tag::PLAYER_DISCONNECT,
        }
    }

    /// Returns the copy of this packet that may go to a player connection.
    ///
    /// Choice correctness flags never leave the server except on the
    /// host's connection. Anything sent to a player passes through here.
    pub fn for_player(&self) -> ServerPacket {
        match self {
            Self::QuestionShow(show) => Self::QuestionShow(QuestionShow {
                question: show.question.redacted(),
            }),
            other => other.clone(),
        }
    }

    pub fn state(state: GameState) -> Self {
        Self::ChangeGameState(ChangeGameState { state })
    }
}
