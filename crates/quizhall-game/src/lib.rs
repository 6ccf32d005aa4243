//! Game engine for Quizhall.
//!
//! Each hosted quiz runs as an isolated Tokio task (actor model) that owns
//! its [`Game`]: the roster, the current question, the countdown, and the
//! scores. The [`GameDirectory`] in front of them turns decoded packets
//! into commands for the right game.
//!
//! # Key types
//!
//! - [`Game`]: the synchronous state machine and scoring rules
//! - [`GameHandle`]: send commands to a running game actor
//! - [`GameDirectory`]: creates games, routes packets, reaps finished games
//! - [`ConnectionRegistry`]: join codes and connection memberships
//! - [`QuizRepository`]: where quizzes come from
//! - [`GameConfig`]: phase lengths, leaderboard size, clock settings

mod actor;
mod config;
mod directory;
mod error;
mod game;
mod registry;
mod repository;

pub use actor::{GameHandle, GameInfo, PacketSender};
pub use config::GameConfig;
pub use directory::GameDirectory;
pub use error::{GameError, RepositoryError};
pub use game::{Game, Outbound, Player, points_for};
pub use registry::{ConnectionRegistry, Membership, Role};
pub use repository::{InMemoryQuizRepository, QuizRepository};
