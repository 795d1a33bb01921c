//! Player intents and their resolution
//!
//! Input handlers never move the car directly. They record presses and held
//! directions in an `InputState`, which is resolved into a single `Intent`
//! at the top of each tick.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Lateral direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    None,
    Left,
    Right,
}

impl Direction {
    /// Sign of the x displacement
    pub fn sign(&self) -> f32 {
        match self {
            Direction::None => 0.0,
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }
}

/// How a displacement is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MoveMode {
    /// One-shot step (key press)
    #[default]
    Discrete,
    /// Held control, applied every frame
    Continuous,
}

/// Resolved movement command for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Intent {
    pub direction: Direction,
    pub mode: MoveMode,
}

impl Intent {
    pub const NONE: Intent = Intent {
        direction: Direction::None,
        mode: MoveMode::Discrete,
    };

    pub fn discrete(direction: Direction) -> Self {
        Self {
            direction,
            mode: MoveMode::Discrete,
        }
    }

    pub fn continuous(direction: Direction) -> Self {
        Self {
            direction,
            mode: MoveMode::Continuous,
        }
    }

    pub fn is_none(&self) -> bool {
        self.direction == Direction::None
    }
}

/// Maximum queued one-shot presses between ticks
pub const MAX_QUEUED_PRESSES: usize = 4;

/// Input recorded between ticks
///
/// Conflicting held directions resolve most-recent-wins: holding right while
/// left is held moves right, releasing right falls back to left.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    presses: VecDeque<Direction>,
    /// Held directions, most recent last
    held: Vec<Direction>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot step
    pub fn press(&mut self, direction: Direction) {
        if direction == Direction::None {
            return;
        }
        if self.presses.len() >= MAX_QUEUED_PRESSES {
            log::debug!("Dropping press {:?}, queue full", direction);
            return;
        }
        self.presses.push_back(direction);
    }

    /// Start holding a direction
    pub fn hold(&mut self, direction: Direction) {
        if direction == Direction::None {
            return;
        }
        self.held.retain(|d| *d != direction);
        self.held.push(direction);
    }

    /// Stop holding a direction
    pub fn release(&mut self, direction: Direction) {
        self.held.retain(|d| *d != direction);
    }

    /// Forget everything (restart)
    pub fn clear(&mut self) {
        self.presses.clear();
        self.held.clear();
    }

    /// Direction currently winning among held controls
    pub fn held_direction(&self) -> Direction {
        self.held.last().copied().unwrap_or_default()
    }

    /// Combine queued presses and held flags into this tick's intent
    ///
    /// A queued press wins and is consumed; remaining presses apply on
    /// following ticks.
    pub fn resolve(&mut self) -> Intent {
        if let Some(direction) = self.presses.pop_front() {
            return Intent::discrete(direction);
        }
        match self.held_direction() {
            Direction::None => Intent::NONE,
            direction => Intent::continuous(direction),
        }
    }
}
