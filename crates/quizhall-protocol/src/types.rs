//! Core types that appear inside Quizhall packets.
//!
//! Field names on the wire follow the quiz editor's JSON documents
//! (`name`, `time`, `choices`, `correct`), so the Rust field names and the
//! JSON keys differ in a few places. The `serde` attributes are the
//! source of truth for the wire shape.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player, generated by the server on join.
///
/// `#[serde(transparent)]` keeps it a plain number on the wire, so
/// `PlayerId(42)` is `42`, not `{"0":42}`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for one hosted game session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

/// Identifier of a quiz in the quiz repository.
///
/// Opaque to the engine; the repository decides its format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizId(pub String);

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuizId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The short numeric code players type to join a game.
///
/// Server-generated codes are always six ASCII digits. Codes arriving in
/// a `Connect` packet are whatever the player typed; they are only ever
/// compared, never trusted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinCode(String);

impl JoinCode {
    /// Number of digits in a server-generated code.
    pub const LEN: usize = 6;

    /// Wraps a code string as-is.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Builds the canonical code for a number in `100000..=999999`.
    pub fn from_number(n: u32) -> Self {
        Self(n.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for exactly [`Self::LEN`] ASCII digits.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == Self::LEN && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Display for JoinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The phase a game is in.
///
/// ```text
/// Lobby → Play → Reveal → Intermission → Play → … → End
/// ```
///
/// Serialized as its wire number (`Lobby = 0`, `Play = 1`,
/// `Intermission = 2`, `Reveal = 3`, `End = 4`). The numbering is part of
/// the protocol and does not follow the order in which states are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum GameState {
    /// Waiting for the host to start; players may join.
    Lobby,
    /// A question is open for answers.
    Play,
    /// Break between questions, leaderboard on the host screen.
    Intermission,
    /// The answer window closed; players see their points.
    Reveal,
    /// Terminal. No further transitions.
    End,
}

impl GameState {
    /// The number this state is encoded as.
    pub fn wire_value(self) -> u8 {
        match self {
            Self::Lobby => 0,
            Self::Play => 1,
            Self::Intermission => 2,
            Self::Reveal => 3,
            Self::End => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::End)
    }
}

impl From<GameState> for u8 {
    fn from(state: GameState) -> u8 {
        state.wire_value()
    }
}

impl TryFrom<u8> for GameState {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Lobby),
            1 => Ok(Self::Play),
            2 => Ok(Self::Intermission),
            3 => Ok(Self::Reveal),
            4 => Ok(Self::End),
            other => Err(ProtocolError::InvalidMessage(format!(
                "unknown game state {other}"
            ))),
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Play => write!(f, "Play"),
            Self::Intermission => write!(f, "Intermission"),
            Self::Reveal => write!(f, "Reveal"),
            Self::End => write!(f, "End"),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who a server packet is addressed to.
///
/// These are the only three audiences a game ever addresses. There is no
/// way to pick an arbitrary subset of players.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// The connection that hosts the game.
    Host,
    /// Every player in the roster, then the host.
    Everyone,
    /// One specific player.
    Player(PlayerId),
}

// ---------------------------------------------------------------------------
// Quiz data model
// ---------------------------------------------------------------------------

/// A quiz as stored in the quiz repository.
///
/// A game copies the whole quiz when it is hosted; later edits in the
/// repository do not reach running games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub name: String,
    pub questions: Vec<Question>,
}

/// One question with its answer window and choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "name")]
    pub text: String,
    /// Seconds players get to answer.
    #[serde(rename = "time")]
    pub time_limit: u32,
    pub choices: Vec<Choice>,
}

/// One answer choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    #[serde(rename = "name")]
    pub text: String,
    pub correct: bool,
}

impl Question {
    /// Returns `true` if `index` names a choice flagged correct.
    ///
    /// Negative and out-of-range indices are simply wrong answers.
    pub fn is_correct(&self, index: i32) -> bool {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.choices.get(i))
            .is_some_and(|c| c.correct)
    }

    /// A copy with every correctness flag cleared, safe to show players.
    pub fn redacted(&self) -> Question {
        Question {
            choices: self
                .choices
                .iter()
                .map(|c| Choice {
                    correct: false,
                    ..c.clone()
                })
                .collect(),
            ..self.clone()
        }
    }
}

/// A player's public identity, as announced to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
}

/// One row of the intermission leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub points: u32,
}

// =========================================================================
// Tests
// =========================================================================
