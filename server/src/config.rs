use shared::{ServerMessage, MAX_STRING_LEN};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be at least 1")]
    Zero(&'static str),
    #[error("server name is {0} bytes, at most 255 fit on the wire")]
    NameTooLong(usize),
}

/// Everything the server needs to know to run games.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_name: String,
    pub port: u16,
    /// Accepted players needed before a game starts.
    pub players_count: u8,
    pub size_x: u16,
    pub size_y: u16,
    /// Turns per game, not counting turn 0.
    pub game_length: u16,
    pub bomb_timer: u16,
    pub explosion_radius: u16,
    pub initial_blocks: u16,
    pub turn_duration: Duration,
    pub seed: u32,
}

impl ServerConfig {
    /// Checks the values a game cannot run without.
    ///
    /// Board sizes are divisors when picking random cells, so they must be
    /// positive. The server name must fit a one-byte length prefix.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size_x == 0 {
            return Err(ConfigError::Zero("size_x"));
        }
        if self.size_y == 0 {
            return Err(ConfigError::Zero("size_y"));
        }
        if self.players_count == 0 {
            return Err(ConfigError::Zero("players_count"));
        }
        if self.turn_duration.is_zero() {
            return Err(ConfigError::Zero("turn_duration"));
        }
        if self.server_name.len() > MAX_STRING_LEN {
            return Err(ConfigError::NameTooLong(self.server_name.len()));
        }
        Ok(())
    }

    /// First message every new connection receives.
    pub fn hello(&self) -> ServerMessage {
        ServerMessage::Hello {
            server_name: self.server_name.clone(),
            players_count: self.players_count,
            size_x: self.size_x,
            size_y: self.size_y,
            game_length: self.game_length,
            explosion_radius: self.explosion_radius,
            bomb_timer: self.bomb_timer,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: "robots".to_string(),
            port: 0,
            players_count: 2,
            size_x: 10,
            size_y: 10,
            game_length: 100,
            bomb_timer: 3,
            explosion_radius: 2,
            initial_blocks: 10,
            turn_duration: Duration::from_millis(500),
            seed: 0,
        }
    }
}
