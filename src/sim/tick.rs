//! Per-frame simulation tick
//!
//! One call advances the run by exactly one rendered frame:
//! movement, obstacle descent and removal, spawning, collision, difficulty.

use super::collision::find_collision;
use super::events::OutboundEvent;
use super::intent::{Intent, MoveMode};
use super::spawn::{is_spawn_frame, spawn_obstacle};
use super::state::{GameState, ObstacleId, ObstacleOrigin, RunPhase};
use crate::clamp_to_track;
use crate::config::GameConfig;

/// What happened during a tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Obstacles that left the bottom edge
    pub removed: usize,
    /// Points awarded for them
    pub points: u64,
    /// Obstacle spawned this frame
    pub spawned: Option<ObstacleId>,
    /// The player car moved
    pub moved: bool,
    /// Difficulty stepped up
    pub stage_up: bool,
    /// The run ended on this tick
    pub collided: bool,
}

/// Advance the game state by one frame
///
/// Does nothing unless the run is `Running`.
pub fn tick(state: &mut GameState, intent: &Intent, config: &GameConfig) -> TickReport {
    let mut report = TickReport::default();
    if state.phase != RunPhase::Running {
        return report;
    }

    report.moved = apply_movement(state, intent, config);

    let (removed, points) = advance_obstacles(state, config);
    report.removed = removed;
    report.points = points;

    if is_spawn_frame(state.frame, state.difficulty.spawn_interval) {
        report.spawned = Some(spawn_obstacle(state, config).id);
    }

    if let Some(hit) = find_collision(&state.player, &state.obstacles, config) {
        log::info!(
            "Game over: hit {} at frame {}, final score {}",
            hit.id,
            state.frame,
            state.score
        );
        state.phase = RunPhase::Over;
        report.collided = true;
        return report;
    }

    state.frame += 1;

    if state.difficulty.update(state.score, state.frame, config) {
        log::info!(
            "Stage {}: obstacle speed {:.1}, spawn every {} frames",
            state.difficulty.display_stage(),
            state.difficulty.obstacle_speed,
            state.difficulty.spawn_interval
        );
        report.stage_up = true;
    }

    report
}

/// Move the player car; returns true if its position changed
fn apply_movement(state: &mut GameState, intent: &Intent, config: &GameConfig) -> bool {
    let factor = match intent.mode {
        MoveMode::Discrete => config.discrete_factor,
        MoveMode::Continuous => config.continuous_factor,
    };
    let dx = intent.direction.sign() * state.player.speed * factor;
    if dx == 0.0 {
        return false;
    }

    let new_x = clamp_to_track(state.player.pos.x + dx, config.player_max_x());
    if new_x == state.player.pos.x {
        return false;
    }

    state.player.pos.x = new_x;
    // Broadcast the clamped position, not the requested one
    state.outbox.push(OutboundEvent::PlayerMoved {
        x: state.player.pos.x,
        y: state.player.pos.y,
    });
    true
}

/// Move obstacles down, removing and scoring those past the bottom edge
fn advance_obstacles(state: &mut GameState, config: &GameConfig) -> (usize, u64) {
    let speed = state.difficulty.obstacle_speed;
    let bottom = config.track_height;
    let mut removed = 0;
    let mut points = 0;

    state.obstacles.retain_mut(|obstacle| {
        obstacle.pos.y += speed;
        if obstacle.pos.y <= bottom {
            return true;
        }
        removed += 1;
        if obstacle.origin == ObstacleOrigin::Local || config.remote_obstacles_score {
            points += config.obstacle_reward;
        }
        false
    });

    state.score += points;
    (removed, points)
}
