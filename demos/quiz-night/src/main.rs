use std::path::PathBuf;

use clap::Parser;
use quizhall::prelude::*;
use tracing_subscriber::EnvFilter;

/// Quizzes served when no `--quizzes` file is given.
const BUNDLED_QUIZZES: &str = include_str!("../quizzes.json");

#[derive(Debug, Parser)]
#[command(name = "quiz-night", about = "Host live quiz games over WebSocket")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// JSON file holding an array of quizzes.
    #[arg(long)]
    quizzes: Option<PathBuf>,

    /// Seconds of leaderboard between questions.
    #[arg(long, default_value_t = 30)]
    intermission_secs: u32,

    /// Rows shown on each leaderboard.
    #[arg(long, default_value_t = 3)]
    leaderboard_size: usize,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            intermission_secs: self.intermission_secs,
            leaderboard_size: self.leaderboard_size,
            ..GameConfig::default()
        }
    }
}

async fn load_quizzes(path: Option<&PathBuf>) -> Result<InMemoryQuizRepository, Box<dyn std::error::Error>> {
    let json = match path {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => BUNDLED_QUIZZES.to_string(),
    };
    Ok(InMemoryQuizRepository::from_json(&json)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let quizzes = load_quizzes(args.quizzes.as_ref()).await?;
    for quiz in quizzes.list().await? {
        tracing::info!(quiz = %quiz.id, name = %quiz.name, questions = quiz.questions.len(), "quiz loaded");
    }

    let server = QuizhallServerBuilder::new()
        .bind(&args.bind)
        .game_config(args.game_config())
        .build(quizzes)
        .await?;

    server.run().await?;
    Ok(())
}
