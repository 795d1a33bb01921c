//! Game state and core simulation types
//!
//! Everything a run needs lives in one `GameState`, owned by the engine.

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::collision::Rect;
use super::difficulty::Difficulty;
use super::events::OutboundEvent;
use crate::config::GameConfig;

/// Run lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Nothing started yet
    Idle,
    /// Active gameplay
    Running,
    /// Collided; frozen until restarted
    Over,
}

/// The local player's car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    /// Base lateral displacement per input
    pub speed: f32,
}

impl Player {
    /// Player centered horizontally at the bottom of the track
    pub fn spawn(config: &GameConfig) -> Self {
        Self {
            pos: Vec2::new(
                config.track_width / 2.0 - config.player_width / 2.0,
                config.player_y(),
            ),
            speed: config.player_speed,
        }
    }

    pub fn rect(&self, config: &GameConfig) -> Rect {
        Rect::new(self.pos.x, self.pos.y, config.player_width, config.player_height)
    }
}

/// Globally unique obstacle id
///
/// `origin` is a random per-engine nonce and `seq` a counter owned by that
/// engine, so ids from different peers or different runs never clash. Both
/// stay below 2^53 so they survive a trip through JavaScript numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId {
    pub origin: u32,
    pub seq: u64,
}

impl fmt::Display for ObstacleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}-{}", self.origin, self.seq)
    }
}

/// Where an obstacle came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObstacleOrigin {
    #[default]
    Local,
    Remote,
}

/// 24-bit RGB color, `#rrggbb` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const MAX: u32 = 0xFF_FFFF;

    pub fn new(rgb: u32) -> Self {
        Self(rgb & Self::MAX)
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// Error for a color string that is not `#` plus 1-6 hex digits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| ParseColorError(s.to_string()))?;
        // Unpadded values are accepted; some peers format without leading zeros
        if hex.is_empty() || hex.len() > 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseColorError(s.to_string()));
        }
        u32::from_str_radix(hex, 16)
            .map(Color::new)
            .map_err(|_| ParseColorError(s.to_string()))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A descending obstacle car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    /// Top-left corner; x never changes after spawn
    pub pos: Vec2,
    pub color: Color,
    #[serde(skip)]
    pub origin: ObstacleOrigin,
}

impl Obstacle {
    pub fn rect(&self, config: &GameConfig) -> Rect {
        Rect::new(
            self.pos.x,
            self.pos.y,
            config.obstacle_width,
            config.obstacle_height,
        )
    }
}

/// Complete game state for one engine
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed of the current run
    pub seed: u64,
    /// Run RNG (lanes, colors)
    pub rng: Pcg32,
    pub phase: RunPhase,
    pub player: Player,
    /// Active obstacles in spawn/merge order
    pub obstacles: Vec<Obstacle>,
    pub score: u64,
    /// Frames elapsed in the current run
    pub frame: u64,
    pub difficulty: Difficulty,
    /// Namespace for ids minted by this engine
    origin: u32,
    /// Next obstacle sequence number; survives restarts
    next_seq: u64,
    /// Events waiting for the relay
    pub(crate) outbox: Vec<OutboundEvent>,
}

impl GameState {
    /// Create an idle state with the given seed
    pub fn new(seed: u64, origin: u32, config: &GameConfig) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: RunPhase::Idle,
            player: Player::spawn(config),
            obstacles: Vec::new(),
            score: 0,
            frame: 0,
            difficulty: Difficulty::new(config),
            origin,
            next_seq: 1,
            outbox: Vec::new(),
        }
    }

    /// Reinitialise every run and difficulty field and enter `Running`
    pub fn restart(&mut self, seed: u64, config: &GameConfig) {
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self.player = Player::spawn(config);
        self.obstacles.clear();
        self.score = 0;
        self.frame = 0;
        self.difficulty = Difficulty::new(config);
        self.outbox.clear();
        self.phase = RunPhase::Running;
    }

    /// The id namespace of this engine
    pub fn origin(&self) -> u32 {
        self.origin
    }

    /// Allocate a new obstacle id
    pub fn next_obstacle_id(&mut self) -> ObstacleId {
        let id = ObstacleId {
            origin: self.origin,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        id
    }

    pub fn contains_obstacle(&self, id: ObstacleId) -> bool {
        self.obstacles.iter().any(|o| o.id == id)
    }

    pub fn is_over(&self) -> bool {
        self.phase == RunPhase::Over
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_spawns_centered() {
        let config = GameConfig::default();
        let player = Player::spawn(&config);
        assert_eq!(player.pos, Vec2::new(175.0, 780.0));
        assert_eq!(player.speed, 5.0);
    }

    #[test]
    fn test_ids_are_unique_across_restarts() {
        let config = GameConfig::default();
        let mut state = GameState::new(1, 42, &config);
        let a = state.next_obstacle_id();
        state.restart(2, &config);
        let b = state.next_obstacle_id();
        assert_ne!(a, b);
        assert_eq!(a.origin, 42);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_restart_clears_run_state() {
        let config = GameConfig::default();
        let mut state = GameState::new(1, 42, &config);
        state.score = 120;
        state.frame = 77;
        state.phase = RunPhase::Over;
        state.player.pos.x = 0.0;
        state.restart(1, &config);
        assert_eq!(state.phase, RunPhase::Running);
        assert_eq!(state.score, 0);
        assert_eq!(state.frame, 0);
        assert_eq!(state.player, Player::spawn(&config));
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn test_color_format_and_parse() {
        let color = Color::new(0x00_0a_ff);
        assert_eq!(color.to_string(), "#000aff");
        assert_eq!("#000aff".parse::<Color>(), Ok(color));
        // Unpadded form
        assert_eq!("#aff".parse::<Color>(), Ok(Color::new(0xaff)));
        assert_eq!(color.rgb(), (0x00, 0x0a, 0xff));
    }

    #[test]
    fn test_color_rejects_garbage() {
        assert!("000aff".parse::<Color>().is_err());
        assert!("#".parse::<Color>().is_err());
        assert!("#1234567".parse::<Color>().is_err());
        assert!("#zzzzzz".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_serde() {
        let json = serde_json::to_string(&Color::new(0xff0000)).unwrap();
        assert_eq!(json, "\"#ff0000\"");
        let back: Color = serde_json::from_str("\"#1\"").unwrap();
        assert_eq!(back, Color::new(1));
    }
}
