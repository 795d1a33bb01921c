//! Dodge Cars - a three-lane dodging arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, spawning, collisions, difficulty)
//! - `config`: Data-driven game balance and network endpoints
//! - `leaderboard`: Shared high score list and its HTTP client

pub mod config;
pub mod leaderboard;
pub mod sim;

pub use config::{Config, GameConfig, NetworkConfig};
pub use leaderboard::{Leaderboard, LeaderboardEntry, LeaderboardView};
pub use sim::{Intent, Simulation, StateSnapshot};

/// Game configuration constants
pub mod consts {
    /// Track dimensions (pixels)
    pub const TRACK_WIDTH: f32 = 400.0;
    pub const TRACK_HEIGHT: f32 = 870.0;
    /// Number of lanes obstacles spawn in
    pub const LANE_COUNT: u32 = 3;

    /// Player car
    pub const PLAYER_WIDTH: f32 = 50.0;
    pub const PLAYER_HEIGHT: f32 = 80.0;
    /// Gap between the player car and the bottom edge
    pub const PLAYER_BOTTOM_MARGIN: f32 = 10.0;
    /// Base lateral displacement unit
    pub const PLAYER_SPEED: f32 = 5.0;
    /// Multiplier for a single key press
    pub const DISCRETE_FACTOR: f32 = 10.0;
    /// Multiplier for a held direction, applied every frame
    pub const CONTINUOUS_FACTOR: f32 = 5.0;

    /// Obstacle cars
    pub const OBSTACLE_WIDTH: f32 = 60.0;
    pub const OBSTACLE_HEIGHT: f32 = 100.0;
    /// Points for each obstacle leaving the bottom edge
    pub const OBSTACLE_REWARD: u64 = 10;

    /// Difficulty defaults
    pub const START_OBSTACLE_SPEED: f32 = 5.0;
    pub const START_SPAWN_INTERVAL: u32 = 90;
    pub const MIN_SPAWN_INTERVAL: u32 = 20;
    pub const SPEED_INCREMENT: f32 = 0.5;
    pub const SPAWN_INTERVAL_DECREMENT: u32 = 5;
    /// Points (score-based) or frames (time-based) between difficulty steps
    pub const DIFFICULTY_EVERY: u64 = 500;

    /// Road marker animation
    pub const ROAD_MARKER_LENGTH: f32 = 50.0;
    pub const ROAD_MARKER_GAP: f32 = 30.0;
    pub const ROAD_SCROLL_SPEED: f32 = 2.0;
}

/// Clamp `x` into `[0, max]`, treating a negative `max` as zero
#[inline]
pub fn clamp_to_track(x: f32, max: f32) -> f32 {
    x.clamp(0.0, max.max(0.0))
}
