//! Error types for the protocol layer.
//!
//! Each crate in Quizhall defines its own error enum. A `ProtocolError`
//! always means a framing or payload problem, never a networking or game
//! rule problem.

/// Errors that can occur in the protocol layer.
///
/// Note what is *not* here: an unknown tag byte or a frame that is too
/// short is not an error. The decoder reports those as "no packet" and
/// the caller drops them silently.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of a payload failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The payload after a known tag byte could not be parsed.
    ///
    /// Common causes: malformed JSON, missing required fields, wrong
    /// field types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The value is outside what the protocol allows, e.g. a game state
    /// number with no matching state.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
