//! Connection registry: which connection belongs to which game.
//!
//! Plain in-memory maps, no locking of its own. The directory is its only
//! writer and guards it together with the game handles.

use std::collections::HashMap;

use quizhall_protocol::{GameId, JoinCode, PlayerId};
use quizhall_transport::ConnectionId;

use crate::GameError;

/// The part a connection plays in its game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Player(PlayerId),
}

/// A connection's seat in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    pub game_id: GameId,
    pub role: Role,
}

/// Join codes and connection memberships of every live game.
///
/// A connection belongs to at most one game, as either its host or one
/// of its players.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    codes: HashMap<JoinCode, GameId>,
    members: HashMap<ConnectionId, Membership>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a join code for a game. Returns `false` if the code is
    /// already taken by a live game.
    pub fn register_game(&mut self, code: JoinCode, game_id: GameId) -> Result<(), GameError> {
        if self.codes.contains_key(&code) {
            return Err(GameError::CodeInUse(code));
        }
        self.codes.insert(code, game_id);
        Ok(())
    }

    pub fn code_in_use(&self, code: &JoinCode) -> bool {
        self.codes.contains_key(code)
    }

    pub fn bind_host(&mut self, connection: ConnectionId, game_id: GameId) -> Result<(), GameError> {
        self.bind(connection, Membership {
            game_id,
            role: Role::Host,
        })
    }

    pub fn bind_player(
        &mut self,
        connection: ConnectionId,
        game_id: GameId,
        player_id: PlayerId,
    ) -> Result<(), GameError> {
        self.bind(connection, Membership {
            game_id,
            role: Role::Player(player_id),
        })
    }

    fn bind(&mut self, connection: ConnectionId, membership: Membership) -> Result<(), GameError> {
        if self.members.contains_key(&connection) {
            return Err(GameError::AlreadyAssigned(connection));
        }
        self.members.insert(connection, membership);
        Ok(())
    }

    pub fn game_by_code(&self, code: &JoinCode) -> Option<GameId> {
        self.codes.get(code).copied()
    }

    pub fn game_by_host(&self, connection: ConnectionId) -> Option<GameId> {
        match self.members.get(&connection) {
            Some(Membership {
                game_id,
                role: Role::Host,
            }) => Some(*game_id),
            _ => None,
        }
    }

    pub fn game_by_player(&self, connection: ConnectionId) -> Option<(GameId, PlayerId)> {
        match self.members.get(&connection) {
            Some(Membership {
                game_id,
                role: Role::Player(player_id),
            }) => Some((*game_id, *player_id)),
            _ => None,
        }
    }

    pub fn lookup(&self, connection: ConnectionId) -> Option<Membership> {
        self.members.get(&connection).copied()
    }

    pub fn is_bound(&self, connection: ConnectionId) -> bool {
        self.members.contains_key(&connection)
    }

    /// Forgets a connection. Returns the seat it held, if any.
    pub fn unbind(&mut self, connection: ConnectionId) -> Option<Membership> {
        self.members.remove(&connection)
    }

    /// Drops a game's join code and every connection bound to it.
    pub fn remove_game(&mut self, game_id: GameId) {
        self.codes.retain(|_, id| *id != game_id);
        self.members.retain(|_, m| m.game_id != game_id);
    }

    pub fn connection_count(&self) -> usize {
        self.members.len()
    }
}
