//! Difficulty progression
//!
//! Obstacle speed only goes up, the spawn interval only goes down (to a
//! floor). A marker records the score or frame of the last step; the next
//! step fires once the tracked value reaches `marker + every`, and the marker
//! then jumps to the current value so a large jump fires exactly once.

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::consts::DIFFICULTY_EVERY;

/// What drives difficulty up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressionPolicy {
    /// Step every `every_points` points scored
    ScoreBased { every_points: u64 },
    /// Step every `every_frames` frames survived
    TimeBased { every_frames: u64 },
}

impl Default for ProgressionPolicy {
    fn default() -> Self {
        ProgressionPolicy::ScoreBased {
            every_points: DIFFICULTY_EVERY,
        }
    }
}

impl ProgressionPolicy {
    /// Threshold distance between steps
    pub fn every(&self) -> u64 {
        match *self {
            ProgressionPolicy::ScoreBased { every_points } => every_points,
            ProgressionPolicy::TimeBased { every_frames } => every_frames,
        }
    }

    /// Pick the tracked value for this policy
    pub fn tracked(&self, score: u64, frame: u64) -> u64 {
        match self {
            ProgressionPolicy::ScoreBased { .. } => score,
            ProgressionPolicy::TimeBased { .. } => frame,
        }
    }
}

/// Difficulty parameters of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    /// Obstacle descent per frame (pixels)
    pub obstacle_speed: f32,
    /// Frames between spawns
    pub spawn_interval: u32,
    /// Number of steps taken (display only)
    pub stage: u32,
    /// Tracked value at the last step
    pub marker: u64,
}

impl Difficulty {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            obstacle_speed: config.start_obstacle_speed,
            spawn_interval: config.start_spawn_interval,
            stage: 0,
            marker: 0,
        }
    }

    /// Stage as shown to the player (1-based)
    pub fn display_stage(&self) -> u32 {
        self.stage + 1
    }

    /// Step difficulty if the tracked value crossed the next threshold
    ///
    /// Returns true when a step was applied.
    pub fn update(&mut self, score: u64, frame: u64, config: &GameConfig) -> bool {
        let policy = config.progression;
        let value = policy.tracked(score, frame);
        if value < self.marker.saturating_add(policy.every()) {
            return false;
        }

        self.marker = value;
        self.obstacle_speed += config.speed_increment;
        self.spawn_interval = self
            .spawn_interval
            .saturating_sub(config.spawn_interval_decrement)
            .max(config.min_spawn_interval);
        self.stage += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score_config() -> GameConfig {
        GameConfig::default()
    }

    fn time_config() -> GameConfig {
        GameConfig {
            progression: ProgressionPolicy::TimeBased { every_frames: 500 },
            ..Default::default()
        }
    }

    #[test]
    fn test_score_threshold() {
        let config = score_config();
        let mut d = Difficulty::new(&config);
        assert!(!d.update(490, 10_000, &config));
        assert!(d.update(500, 0, &config));
        assert_eq!(d.stage, 1);
        assert_eq!(d.obstacle_speed, 5.5);
        assert_eq!(d.spawn_interval, 85);
        assert_eq!(d.marker, 500);
        // Same score again must not re-trigger
        assert!(!d.update(500, 0, &config));
    }

    #[test]
    fn test_large_jump_fires_once_and_rebases() {
        let config = score_config();
        let mut d = Difficulty::new(&config);
        assert!(d.update(1_730, 0, &config));
        assert_eq!(d.stage, 1);
        assert_eq!(d.marker, 1_730);
        assert!(!d.update(1_740, 0, &config));
        assert!(!d.update(2_229, 0, &config));
        assert!(d.update(2_230, 0, &config));
        assert_eq!(d.stage, 2);
    }

    #[test]
    fn test_time_based_ignores_score() {
        let config = time_config();
        let mut d = Difficulty::new(&config);
        assert!(!d.update(100_000, 499, &config));
        assert!(d.update(0, 500, &config));
        assert!(!d.update(0, 999, &config));
        assert!(d.update(0, 1_000, &config));
        assert_eq!(d.stage, 2);
    }

    #[test]
    fn test_spawn_interval_floor() {
        let config = time_config();
        let mut d = Difficulty::new(&config);
        let mut last_speed = d.obstacle_speed;
        let mut last_interval = d.spawn_interval;
        for step in 1..=40u64 {
            assert!(d.update(0, step * 500, &config));
            assert!(d.obstacle_speed >= last_speed);
            assert!(d.spawn_interval <= last_interval);
            assert!(d.spawn_interval >= config.min_spawn_interval);
            last_speed = d.obstacle_speed;
            last_interval = d.spawn_interval;
        }
        assert_eq!(d.spawn_interval, 20);
        assert_eq!(d.stage, 40);
    }

    #[test]
    fn test_policy_serde() {
        let json = serde_json::to_string(&ProgressionPolicy::TimeBased { every_frames: 300 })
            .unwrap();
        assert_eq!(json, r#"{"kind":"time_based","every_frames":300}"#);
        let back: ProgressionPolicy =
            serde_json::from_str(r#"{"kind":"score_based","every_points":250}"#).unwrap();
        assert_eq!(back, ProgressionPolicy::ScoreBased { every_points: 250 });
    }
}
