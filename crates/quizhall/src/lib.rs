//! # Quizhall
//!
//! Real-time engine for multiplayer quiz games.
//!
//! A host picks a quiz and gets a six-digit join code; players type the
//! code on their phones and join. The server then drives every game
//! through its questions on a one-second countdown, scores the answers,
//! and keeps everybody's screen in step.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quizhall::prelude::*;
//!
//! # async fn run() -> Result<(), QuizhallError> {
//! let quizzes = InMemoryQuizRepository::from_json(r#"[]"#)?;
//! let server = QuizhallServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(quizzes)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::QuizhallError;
pub use server::{QuizhallServer, QuizhallServerBuilder};

pub mod prelude {
    pub use crate::{QuizhallError, QuizhallServer, QuizhallServerBuilder};
    pub use quizhall_game::{
        GameConfig, GameDirectory, GameError, GameHandle, GameInfo, InMemoryQuizRepository,
        QuizRepository, RepositoryError,
    };
    pub use quizhall_protocol::{
        ClientPacket, GameState, JoinCode, PacketCodec, PlayerId, Quiz, QuizId, ServerPacket,
    };
    pub use quizhall_tick::{TickConfig, TickPolicy};
    pub use quizhall_transport::{Connection, ConnectionId, Transport, WebSocketTransport};
}
