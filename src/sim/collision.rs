//! Axis-aligned collision detection
//!
//! Cars are rectangles; an overlap on both axes ends the run.

use serde::{Deserialize, Serialize};

use super::state::{Obstacle, Player};
use crate::config::GameConfig;

/// Axis-aligned rectangle, `(x, y)` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Strict overlap: touching edges do not count
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}

/// First obstacle overlapping the player, if any
pub fn find_collision<'a>(
    player: &Player,
    obstacles: &'a [Obstacle],
    config: &GameConfig,
) -> Option<&'a Obstacle> {
    let player_rect = player.rect(config);
    obstacles
        .iter()
        .find(|obstacle| player_rect.overlaps(&obstacle.rect(config)))
}
