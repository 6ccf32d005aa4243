//! Unified error type for the Quizhall server.

use quizhall_game::{GameError, RepositoryError};
use quizhall_protocol::ProtocolError;
use quizhall_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls,
/// so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum QuizhallError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A game-level error (unknown code, ended game, unreachable actor).
    #[error(transparent)]
    Game(#[from] GameError),

    /// Quizzes could not be loaded.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizhall_protocol::GameId;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let quizhall_err: QuizhallError = err.into();
        assert!(matches!(quizhall_err, QuizhallError::Transport(_)));
        assert!(quizhall_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let quizhall_err: QuizhallError = err.into();
        assert!(matches!(quizhall_err, QuizhallError::Protocol(_)));
    }

    #[test]
    fn test_from_game_error() {
        let err = GameError::NotFound(GameId(1));
        let quizhall_err: QuizhallError = err.into();
        assert!(matches!(quizhall_err, QuizhallError::Game(_)));
        assert_eq!(quizhall_err.to_string(), "game G-1 not found");
    }

    #[test]
    fn test_from_repository_error() {
        let err = RepositoryError::NotFound("abc".into());
        let quizhall_err: QuizhallError = err.into();
        assert!(matches!(quizhall_err, QuizhallError::Repository(_)));
    }
}
