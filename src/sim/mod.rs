//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One tick per rendered frame
//! - Seeded RNG only
//! - No I/O; relay traffic goes through the outbound event queue
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod difficulty;
pub mod engine;
pub mod events;
pub mod intent;
pub mod remote;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod tick;

pub use autopilot::autopilot_intent;
pub use collision::{Rect, find_collision};
pub use difficulty::{Difficulty, ProgressionPolicy};
pub use engine::Simulation;
pub use events::{InboundEvent, ObstacleSpawn, OutboundEvent, RelayError, RemotePlayer};
pub use intent::{Direction, InputState, Intent, MoveMode};
pub use remote::RemotePlayers;
pub use snapshot::{ObstacleView, StateSnapshot};
pub use spawn::{lane_positions, lane_x};
pub use state::{Color, GameState, Obstacle, ObstacleId, ObstacleOrigin, Player, RunPhase};
pub use tick::{TickReport, tick};
