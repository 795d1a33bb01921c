//! Obstacle spawning and lane geometry

use glam::Vec2;
use rand::Rng;

use super::events::OutboundEvent;
use super::state::{Color, GameState, Obstacle, ObstacleOrigin};
use crate::config::GameConfig;

/// Obstacle x for a lane, centering the car in it
pub fn lane_x(lane: u32, config: &GameConfig) -> f32 {
    let lane_width = config.lane_width();
    lane as f32 * lane_width + lane_width / 2.0 - config.obstacle_width / 2.0
}

/// All legal obstacle x positions, left to right
pub fn lane_positions(config: &GameConfig) -> Vec<f32> {
    (0..config.lane_count).map(|lane| lane_x(lane, config)).collect()
}

/// Lane whose obstacle position is closest to `x`
pub fn nearest_lane(x: f32, config: &GameConfig) -> u32 {
    let lane = ((x + config.obstacle_width / 2.0) / config.lane_width()).floor();
    lane.clamp(0.0, (config.lane_count - 1) as f32) as u32
}

/// Whether this frame is a spawn frame
pub fn is_spawn_frame(frame: u64, spawn_interval: u32) -> bool {
    spawn_interval > 0 && frame % spawn_interval as u64 == 0
}

/// Random opaque color
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Color {
    Color::new(rng.random_range(0..=Color::MAX))
}

/// Spawn one obstacle at the top of a random lane and queue its relay event
pub fn spawn_obstacle(state: &mut GameState, config: &GameConfig) -> Obstacle {
    let lane = state.rng.random_range(0..config.lane_count);
    let color = random_color(&mut state.rng);
    let obstacle = Obstacle {
        id: state.next_obstacle_id(),
        pos: Vec2::new(lane_x(lane, config), -config.obstacle_height),
        color,
        origin: ObstacleOrigin::Local,
    };

    log::trace!("Spawned {} in lane {} at frame {}", obstacle.id, lane, state.frame);
    state
        .outbox
        .push(OutboundEvent::obstacle_spawned(&obstacle));
    state.obstacles.push(obstacle.clone());
    obstacle
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_lane_positions_three_lanes() {
        let config = GameConfig::default();
        let lanes = lane_positions(&config);
        assert_eq!(lanes.len(), 3);
        let lane_width = 400.0 / 3.0;
        for (i, x) in lanes.iter().enumerate() {
            let expected = i as f32 * lane_width + lane_width / 2.0 - 30.0;
            assert!((x - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn test_nearest_lane() {
        let config = GameConfig::default();
        for (i, x) in lane_positions(&config).into_iter().enumerate() {
            assert_eq!(nearest_lane(x, &config), i as u32);
            assert_eq!(nearest_lane(x + 20.0, &config), i as u32);
            assert_eq!(nearest_lane(x - 20.0, &config), i as u32);
        }
        assert_eq!(nearest_lane(-500.0, &config), 0);
        assert_eq!(nearest_lane(10_000.0, &config), 2);
    }

    #[test]
    fn test_spawn_frames() {
        assert!(is_spawn_frame(0, 90));
        assert!(!is_spawn_frame(1, 90));
        assert!(!is_spawn_frame(89, 90));
        assert!(is_spawn_frame(90, 90));
        assert!(!is_spawn_frame(5, 0));
    }

    #[test]
    fn test_spawn_uses_lane_and_top_edge() {
        let config = GameConfig::default();
        let mut state = GameState::new(7, 3, &config);
        let lanes = lane_positions(&config);
        for _ in 0..50 {
            let obstacle = spawn_obstacle(&mut state, &config);
            assert!(lanes.contains(&obstacle.pos.x));
            assert_eq!(obstacle.pos.y, -config.obstacle_height);
        }
        assert_eq!(state.obstacles.len(), 50);
        assert_eq!(state.outbox.len(), 50);
    }

    #[test]
    fn test_all_lanes_get_used() {
        let config = GameConfig::default();
        let mut state = GameState::new(11, 3, &config);
        let mut seen = [false; 3];
        for _ in 0..100 {
            let obstacle = spawn_obstacle(&mut state, &config);
            seen[nearest_lane(obstacle.pos.x, &config) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_random_color_in_range() {
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..100 {
            assert!(random_color(&mut rng).0 <= Color::MAX);
        }
    }
}
