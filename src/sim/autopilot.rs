//! Demo autopilot
//!
//! Picks the closest lane with no obstacle bearing down on the player and
//! steers toward it with held-direction intents. Used for attract mode and
//! the headless demo.

use super::intent::{Direction, Intent};
use super::state::GameState;
use crate::config::GameConfig;

/// How far above the player an obstacle counts as a threat (pixels)
pub const LOOKAHEAD: f32 = 260.0;

/// Player x that centers the car in a lane
pub fn lane_target_x(lane: u32, config: &GameConfig) -> f32 {
    let lane_width = config.lane_width();
    lane as f32 * lane_width + lane_width / 2.0 - config.player_width / 2.0
}

/// Lowest threatening obstacle top in a lane, if any
fn lane_threat(lane: u32, state: &GameState, config: &GameConfig) -> Option<f32> {
    let lane_width = config.lane_width();
    let left = lane as f32 * lane_width;
    let right = left + lane_width;
    let player_top = state.player.pos.y;
    let player_bottom = player_top + config.player_height;

    state
        .obstacles
        .iter()
        .filter(|o| o.pos.x < right && o.pos.x + config.obstacle_width > left)
        .filter(|o| {
            o.pos.y + config.obstacle_height > player_top - LOOKAHEAD && o.pos.y < player_bottom
        })
        .map(|o| o.pos.y)
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
}

/// Choose this frame's intent
pub fn autopilot_intent(state: &GameState, config: &GameConfig) -> Intent {
    let lane_width = config.lane_width();
    let player_center = state.player.pos.x + config.player_width / 2.0;
    let current_lane =
        ((player_center / lane_width).floor() as i64).clamp(0, config.lane_count as i64 - 1) as u32;

    let threats: Vec<Option<f32>> = (0..config.lane_count)
        .map(|lane| lane_threat(lane, state, config))
        .collect();

    // Closest safe lane; otherwise the lane whose threat is furthest away
    let target = (0..config.lane_count)
        .filter(|lane| threats[*lane as usize].is_none())
        .min_by_key(|lane| lane.abs_diff(current_lane))
        .unwrap_or_else(|| {
            (0..config.lane_count)
                .min_by(|a, b| {
                    let ya = threats[*a as usize].unwrap_or(f32::MIN);
                    let yb = threats[*b as usize].unwrap_or(f32::MIN);
                    ya.partial_cmp(&yb).unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(current_lane)
        });

    let dx = lane_target_x(target, config) - state.player.pos.x;
    let step = state.player.speed * config.continuous_factor;
    if dx.abs() <= step / 2.0 {
        Intent::NONE
    } else if dx < 0.0 {
        Intent::continuous(Direction::Left)
    } else {
        Intent::continuous(Direction::Right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spawn::lane_positions;
    use crate::sim::state::{Color, Obstacle, ObstacleOrigin};
    use crate::sim::tick::tick;
    use glam::Vec2;

    fn running(config: &GameConfig) -> GameState {
        let mut state = GameState::new(1, 1, config);
        state.restart(1, config);
        state
    }

    fn place(state: &mut GameState, x: f32, y: f32) {
        let id = state.next_obstacle_id();
        state.obstacles.push(Obstacle {
            id,
            pos: Vec2::new(x, y),
            color: Color::new(0),
            origin: ObstacleOrigin::Local,
        });
    }

    #[test]
    fn test_holds_when_safe() {
        let config = GameConfig::default();
        let state = running(&config);
        assert!(autopilot_intent(&state, &config).is_none());
    }

    #[test]
    fn test_dodges_incoming() {
        let config = GameConfig::default();
        let mut state = running(&config);
        let lanes = lane_positions(&config);
        place(&mut state, lanes[1], 600.0);
        place(&mut state, lanes[2], 600.0);
        assert_eq!(
            autopilot_intent(&state, &config),
            Intent::continuous(Direction::Left)
        );
    }

    #[test]
    fn test_survives_a_long_run() {
        let config = GameConfig::default();
        let mut state = running(&config);
        for _ in 0..3_000 {
            let intent = autopilot_intent(&state, &config);
            tick(&mut state, &intent, &config);
        }
        assert!(state.score > 0);
    }
}
