//! Game configuration
//!
//! Balance values for the simulation plus network endpoints. Persisted to
//! LocalStorage on the web, defaults everywhere else.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::ProgressionPolicy;

/// Reasons a configuration is rejected
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("track must be wider than both car types (width {0})")]
    TrackTooNarrow(f32),
    #[error("track must be taller than the player car (height {0})")]
    TrackTooShort(f32),
    #[error("lane count must be between 1 and 8, got {0}")]
    LaneCount(u32),
    #[error("lanes of width {lane_width} cannot fit obstacles of width {obstacle_width}")]
    LaneTooNarrow { lane_width: f32, obstacle_width: f32 },
    #[error("continuous factor ({continuous}) must be smaller than discrete factor ({discrete})")]
    MovementFactors { continuous: f32, discrete: f32 },
    #[error("spawn interval must be at least the minimum ({min}), got {interval}")]
    SpawnInterval { interval: u32, min: u32 },
    #[error("minimum spawn interval must be positive")]
    ZeroMinSpawnInterval,
    #[error("difficulty threshold must be positive")]
    ZeroDifficultyStep,
    #[error("{0} must be a positive finite number")]
    NotPositive(&'static str),
    #[error("invalid config JSON: {0}")]
    Json(String),
}

/// Simulation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub track_width: f32,
    pub track_height: f32,
    pub lane_count: u32,

    pub player_width: f32,
    pub player_height: f32,
    pub player_bottom_margin: f32,
    pub player_speed: f32,
    pub discrete_factor: f32,
    pub continuous_factor: f32,

    pub obstacle_width: f32,
    pub obstacle_height: f32,
    pub obstacle_reward: u64,

    pub start_obstacle_speed: f32,
    pub start_spawn_interval: u32,
    pub min_spawn_interval: u32,
    pub speed_increment: f32,
    pub spawn_interval_decrement: u32,
    pub progression: ProgressionPolicy,

    /// Whether obstacles received from peers score when they leave the track
    pub remote_obstacles_score: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            track_width: TRACK_WIDTH,
            track_height: TRACK_HEIGHT,
            lane_count: LANE_COUNT,

            player_width: PLAYER_WIDTH,
            player_height: PLAYER_HEIGHT,
            player_bottom_margin: PLAYER_BOTTOM_MARGIN,
            player_speed: PLAYER_SPEED,
            discrete_factor: DISCRETE_FACTOR,
            continuous_factor: CONTINUOUS_FACTOR,

            obstacle_width: OBSTACLE_WIDTH,
            obstacle_height: OBSTACLE_HEIGHT,
            obstacle_reward: OBSTACLE_REWARD,

            start_obstacle_speed: START_OBSTACLE_SPEED,
            start_spawn_interval: START_SPAWN_INTERVAL,
            min_spawn_interval: MIN_SPAWN_INTERVAL,
            speed_increment: SPEED_INCREMENT,
            spawn_interval_decrement: SPAWN_INTERVAL_DECREMENT,
            progression: ProgressionPolicy::default(),

            remote_obstacles_score: true,
        }
    }
}

impl GameConfig {
    /// Width of a single lane
    pub fn lane_width(&self) -> f32 {
        self.track_width / self.lane_count as f32
    }

    /// Rightmost legal player x
    pub fn player_max_x(&self) -> f32 {
        self.track_width - self.player_width
    }

    /// Fixed player y (bottom of the track)
    pub fn player_y(&self) -> f32 {
        self.track_height - self.player_height - self.player_bottom_margin
    }

    /// Check that the values describe a playable track
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("track_width", self.track_width),
            ("track_height", self.track_height),
            ("player_width", self.player_width),
            ("player_height", self.player_height),
            ("player_speed", self.player_speed),
            ("discrete_factor", self.discrete_factor),
            ("continuous_factor", self.continuous_factor),
            ("obstacle_width", self.obstacle_width),
            ("obstacle_height", self.obstacle_height),
            ("start_obstacle_speed", self.start_obstacle_speed),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive(name));
            }
        }
        if !(self.speed_increment.is_finite() && self.speed_increment >= 0.0) {
            return Err(ConfigError::NotPositive("speed_increment"));
        }
        if self.player_bottom_margin < 0.0 || !self.player_bottom_margin.is_finite() {
            return Err(ConfigError::NotPositive("player_bottom_margin"));
        }

        if self.track_width <= self.player_width || self.track_width < self.obstacle_width {
            return Err(ConfigError::TrackTooNarrow(self.track_width));
        }
        if self.player_y() < 0.0 {
            return Err(ConfigError::TrackTooShort(self.track_height));
        }
        if !(1..=8).contains(&self.lane_count) {
            return Err(ConfigError::LaneCount(self.lane_count));
        }
        if self.lane_width() < self.obstacle_width {
            return Err(ConfigError::LaneTooNarrow {
                lane_width: self.lane_width(),
                obstacle_width: self.obstacle_width,
            });
        }
        if self.continuous_factor >= self.discrete_factor {
            return Err(ConfigError::MovementFactors {
                continuous: self.continuous_factor,
                discrete: self.discrete_factor,
            });
        }
        if self.min_spawn_interval == 0 {
            return Err(ConfigError::ZeroMinSpawnInterval);
        }
        if self.start_spawn_interval < self.min_spawn_interval {
            return Err(ConfigError::SpawnInterval {
                interval: self.start_spawn_interval,
                min: self.min_spawn_interval,
            });
        }
        if self.progression.every() == 0 {
            return Err(ConfigError::ZeroDifficultyStep);
        }
        Ok(())
    }
}

/// Backend endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Base URL of the relay/leaderboard server (no trailing slash)
    pub server_url: String,
    /// Path of the high score resource
    pub highscores_path: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3000".to_string(),
            highscores_path: "/api/highscores".to_string(),
        }
    }
}

impl NetworkConfig {
    /// Full URL of the high score endpoint
    pub fn highscores_url(&self) -> String {
        format!(
            "{}{}",
            self.server_url.trim_end_matches('/'),
            self.highscores_path
        )
    }
}

/// All configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
    pub network: NetworkConfig,
}

impl Config {
    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "dodge_cars_config";

    /// Parse and validate a JSON document; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.game.validate()?;
        Ok(config)
    }

    /// Load config from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(config) => {
                        log::info!("Loaded config from LocalStorage");
                        return config;
                    }
                    Err(e) => log::warn!("Ignoring stored config: {}", e),
                }
            }
        }

        log::info!("Using default config");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
