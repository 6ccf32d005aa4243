//! Game configuration.

use std::time::Duration;

use quizhall_tick::TickConfig;

/// Settings shared by every game a directory hosts.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Seconds players see their points before the intermission.
    pub reveal_secs: u32,

    /// Seconds of leaderboard between two questions.
    pub intermission_secs: u32,

    /// Rows sent in each leaderboard.
    pub leaderboard_size: usize,

    /// How long an ended game's actor stays reachable before it exits.
    pub end_grace: Duration,

    /// Capacity of each game actor's command channel.
    pub channel_size: usize,

    /// Countdown clock settings.
    pub tick: TickConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            reveal_secs: 5,
            intermission_secs: 30,
            leaderboard_size: 3,
            end_grace: Duration::from_secs(60),
            channel_size: 64,
            tick: TickConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_config_default() {
        let config = GameConfig::default();
        assert_eq!(config.reveal_secs, 5);
        assert_eq!(config.intermission_secs, 30);
        assert_eq!(config.leaderboard_size, 3);
        assert_eq!(config.end_grace, Duration::from_secs(60));
        assert_eq!(config.tick.period, Duration::from_secs(1));
    }
}
