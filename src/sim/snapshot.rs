//! Read-only view of the simulation for renderers and broadcasters

use glam::Vec2;
use serde::Serialize;

use super::events::RemotePlayer;
use super::remote::RemotePlayers;
use super::state::{Color, GameState, ObstacleId, RunPhase};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObstacleView {
    pub id: ObstacleId,
    pub x: f32,
    pub y: f32,
    pub color: Color,
}

/// Everything a frame needs to be drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub phase: RunPhase,
    pub player: Vec2,
    /// Active obstacles in spawn/merge order
    pub obstacles: Vec<ObstacleView>,
    /// Ghost cars of other players
    pub remote_players: Vec<RemotePlayer>,
    pub score: u64,
    pub is_over: bool,
    /// 1-based difficulty stage
    pub stage: u32,
    pub frame: u64,
    /// Vertical scroll of the lane markers
    pub road_offset: f32,
}

impl StateSnapshot {
    pub fn capture(state: &GameState, remotes: &RemotePlayers) -> Self {
        Self {
            phase: state.phase,
            player: state.player.pos,
            obstacles: state
                .obstacles
                .iter()
                .map(|o| ObstacleView {
                    id: o.id,
                    x: o.pos.x,
                    y: o.pos.y,
                    color: o.color,
                })
                .collect(),
            remote_players: remotes
                .iter()
                .map(|(id, pos)| RemotePlayer {
                    id: id.to_string(),
                    x: pos.x,
                    y: pos.y,
                })
                .collect(),
            score: state.score,
            is_over: state.is_over(),
            stage: state.difficulty.display_stage(),
            frame: state.frame,
            road_offset: road_offset(state.frame),
        }
    }
}

/// Lane marker scroll for a frame
pub fn road_offset(frame: u64) -> f32 {
    use crate::consts::{ROAD_MARKER_GAP, ROAD_MARKER_LENGTH, ROAD_SCROLL_SPEED};
    let period = ROAD_MARKER_LENGTH + ROAD_MARKER_GAP;
    (frame as f32 * ROAD_SCROLL_SPEED) % period
}
