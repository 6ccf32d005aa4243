//! Wire protocol for Quizhall.
//!
//! This crate defines the "language" spoken between the quiz server, the
//! host screen, and player devices:
//!
//! - **Types** ([`Quiz`], [`GameState`], [`PlayerId`], [`Recipient`], etc.):
//!   the quiz data model and identifiers that appear inside packets.
//! - **Packets** ([`ClientPacket`], [`ServerPacket`]): the closed catalog
//!   of messages, one enum per direction.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`], [`PacketCodec`]): how
//!   packets become `[tag byte][payload]` frames and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw bytes) and the game
//! directory (routing). It knows nothing about connections or games; it
//! only knows how to frame and unframe packets.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientPacket) → Directory → Game
//! Game → ServerPacket → Protocol (bytes) → Transport
//! ```

mod codec;
mod error;
mod packet;
mod types;

pub use codec::{Codec, MIN_MESSAGE_LEN, PacketCodec};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use packet::{
    ChangeGameState, ClientPacket, Connect, HostGameReply, HostGameRequest,
    Leaderboard, PlayerDisconnect, PlayerJoin, PlayerReveal, QuestionAnswer,
    QuestionShow, ServerPacket, StartGame, Tick, tag,
};
pub use types::{
    Choice, GameId, GameState, JoinCode, LeaderboardEntry, PlayerId,
    PlayerInfo, Question, Quiz, QuizId, Recipient,
};
