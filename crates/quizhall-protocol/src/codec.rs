//! Payload codecs and tag-byte framing.
//!
//! Two layers:
//!
//! - A [`Codec`] turns one payload struct into bytes and back. The protocol
//!   doesn't care HOW; [`JsonCodec`] is what the reference clients speak.
//! - [`PacketCodec`] wraps a `Codec` and adds the leading tag byte,
//!   choosing the payload type from the tag on the way in.

use serde::{Serialize, de::DeserializeOwned};

use crate::packet::{
    ChangeGameState, Connect, HostGameReply, HostGameRequest, Leaderboard,
    PlayerDisconnect, PlayerJoin, PlayerReveal, QuestionAnswer, QuestionShow,
    StartGame, Tick, tag,
};
use crate::{ClientPacket, ProtocolError, ServerPacket};

/// Frames shorter than this carry no payload and are dropped.
pub const MIN_MESSAGE_LEN: usize = 2;

/// Encodes payload values to bytes and decodes them back.
///
/// - `Send + Sync` → one codec is shared by every connection task.
/// - `'static` → it lives as long as the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Browser clients can build and read these payloads with nothing but
/// `JSON.stringify` / `JSON.parse`.
///
/// ## Example
///
/// ```rust
/// use quizhall_protocol::{Codec, JsonCodec, StartGame};
///
/// let bytes = JsonCodec.encode(&StartGame {}).unwrap();
/// assert_eq!(bytes, b"{}");
/// let back: StartGame = JsonCodec.decode(&bytes).unwrap();
/// assert_eq!(back, StartGame {});
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// PacketCodec
// ---------------------------------------------------------------------------

/// Frames packets as `[tag byte][payload]`.
///
/// Decoding returns `Ok(None)` for frames that should be ignored without
/// comment (too short, or a tag this direction never carries) and
/// `Err(_)` when a known tag is followed by an unreadable payload.
///
/// ```rust
/// use quizhall_protocol::{ClientPacket, PacketCodec, StartGame};
///
/// let codec = PacketCodec::json();
/// let bytes = codec.encode_client(&ClientPacket::StartGame(StartGame {})).unwrap();
/// assert_eq!(bytes, b"\x05{}");
/// assert_eq!(
///     codec.decode_client(&bytes).unwrap(),
///     Some(ClientPacket::StartGame(StartGame {})),
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketCodec<C> {
    codec: C,
}

#[cfg(feature = "json")]
impl PacketCodec<JsonCodec> {
    /// A packet codec with JSON payloads.
    pub fn json() -> Self {
        Self { codec: JsonCodec }
    }
}

impl<C: Codec> PacketCodec<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Encodes a packet the server sends.
    pub fn encode_server(&self, packet: &ServerPacket) -> Result<Vec<u8>, ProtocolError> {
        match packet {
            ServerPacket::HostGame(p) => self.frame(packet.tag(), p),
            ServerPacket::QuestionShow(p) => self.frame(packet.tag(), p),
            ServerPacket::ChangeGameState(p) => self.frame(packet.tag(), p),
            ServerPacket::PlayerJoin(p) => self.frame(packet.tag(), p),
            ServerPacket::Tick(p) => self.frame(packet.tag(), p),
            ServerPacket::PlayerReveal(p) => self.frame(packet.tag(), p),
            ServerPacket::Leaderboard(p) => self.frame(packet.tag(), p),
            ServerPacket::PlayerDisconnect(p) => self.frame(packet.tag(), p),
        }
    }

    /// Decodes a frame received by the server.
    ///
    /// Only `Connect`, `HostGame`, `StartGame` and `QuestionAnswer` are
    /// accepted; every other tag yields `Ok(None)`.
    pub fn decode_client(&self, data: &[u8]) -> Result<Option<ClientPacket>, ProtocolError> {
        let Some((tag, payload)) = split_frame(data) else {
            return Ok(None);
        };
        let packet = match tag {
            tag::CONNECT => ClientPacket::Connect(self.codec.decode::<Connect>(payload)?),
            tag::HOST_GAME => {
                ClientPacket::HostGame(self.codec.decode::<HostGameRequest>(payload)?)
            }
            tag::START_GAME => ClientPacket::StartGame(self.codec.decode::<StartGame>(payload)?),
            tag::QUESTION_ANSWER => {
                ClientPacket::QuestionAnswer(self.codec.decode::<QuestionAnswer>(payload)?)
            }
            _ => return Ok(None),
        };
        Ok(Some(packet))
    }

    /// Encodes a packet a client sends. Used by client tooling and tests.
    pub fn encode_client(&self, packet: &ClientPacket) -> Result<Vec<u8>, ProtocolError> {
        match packet {
            ClientPacket::Connect(p) => self.frame(packet.tag(), p),
            ClientPacket::HostGame(p) => self.frame(packet.tag(), p),
            ClientPacket::StartGame(p) => self.frame(packet.tag(), p),
            ClientPacket::QuestionAnswer(p) => self.frame(packet.tag(), p),
        }
    }

    /// Decodes a frame received by a client.
    pub fn decode_server(&self, data: &[u8]) -> Result<Option<ServerPacket>, ProtocolError> {
        let Some((tag, payload)) = split_frame(data) else {
            return Ok(None);
        };
        let packet = match tag {
            tag::HOST_GAME => ServerPacket::HostGame(self.codec.decode::<HostGameReply>(payload)?),
            tag::QUESTION_SHOW => {
                ServerPacket::QuestionShow(self.codec.decode::<QuestionShow>(payload)?)
            }
            tag::CHANGE_GAME_STATE => {
                ServerPacket::ChangeGameState(self.codec.decode::<ChangeGameState>(payload)?)
            }
            tag::PLAYER_JOIN => ServerPacket::PlayerJoin(self.codec.decode::<PlayerJoin>(payload)?),
            tag::TICK => ServerPacket::Tick(self.codec.decode::<Tick>(payload)?),
            tag::PLAYER_REVEAL => {
                ServerPacket::PlayerReveal(self.codec.decode::<PlayerReveal>(payload)?)
            }
            tag::LEADERBOARD => {
                ServerPacket::Leaderboard(self.codec.decode::<Leaderboard>(payload)?)
            }
            tag::PLAYER_DISCONNECT => {
                ServerPacket::PlayerDisconnect(self.codec.decode::<PlayerDisconnect>(payload)?)
            }
            _ => return Ok(None),
        };
        Ok(Some(packet))
    }

    fn frame<T: Serialize>(&self, tag: u8, payload: &T) -> Result<Vec<u8>, ProtocolError> {
        let body = self.codec.encode(payload)?;
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(tag);
        out.extend_from_slice(&body);
        Ok(out)
    }
}

fn split_frame(data: &[u8]) -> Option<(u8, &[u8])> {
    if data.len() < MIN_MESSAGE_LEN {
        return None;
    }
    data.split_first().map(|(tag, payload)| (*tag, payload))
}
