//! Error types for the game layer.

use quizhall_protocol::{GameId, JoinCode, QuizId};
use quizhall_transport::ConnectionId;

/// Errors that can occur while routing to or running a game.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// No live game has this id.
    #[error("game {0} not found")]
    NotFound(GameId),

    /// The game's command channel is full or closed.
    #[error("game {0} is unavailable")]
    Unavailable(GameId),

    /// The game reached its End state and takes no new players.
    #[error("game has ended")]
    GameEnded,

    /// The repository has no quiz with this id.
    #[error("quiz {0} not found")]
    QuizNotFound(QuizId),

    /// No live game uses this join code.
    #[error("unknown join code {0:?}")]
    UnknownJoinCode(String),

    /// The connection already hosts or plays in a game.
    #[error("{0} already belongs to a game")]
    AlreadyAssigned(ConnectionId),

    /// The connection is not part of any game.
    #[error("{0} is not part of any game")]
    UnknownConnection(ConnectionId),

    /// One or more recipients could not be reached. Every other
    /// recipient still got its packet.
    #[error("{failed} recipient(s) unreachable")]
    SendFailed { failed: usize },

    /// Another live game already holds this join code.
    #[error("join code {0} is already in use")]
    CodeInUse(JoinCode),

    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors reported by a [`QuizRepository`](crate::QuizRepository).
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("quiz {0} not found")]
    NotFound(QuizId),

    /// The backing store could not be read.
    #[error("invalid quiz data: {0}")]
    InvalidData(#[from] serde_json::Error),
}
