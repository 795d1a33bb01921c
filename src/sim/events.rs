//! Relay events
//!
//! Outbound events are queued by the simulation and drained by whatever
//! transport is attached. Inbound events arrive as `(name, json payload)`
//! pairs from the relay and are validated here before they reach the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::{Color, Obstacle, ObstacleId};
use crate::leaderboard::LeaderboardEntry;

/// Problems with an inbound relay message
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("unknown relay event {0:?}")]
    UnknownEvent(String),
    #[error("malformed {event} payload: {source}")]
    Malformed {
        event: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid position in {0} payload")]
    InvalidPosition(String),
}

/// Wire form of a spawned obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSpawn {
    pub id: ObstacleId,
    pub x: f32,
    pub y: f32,
    pub color: Color,
}

/// Events the simulation emits for the relay (fire-and-forget)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum OutboundEvent {
    #[serde(rename = "playerMoved")]
    PlayerMoved { x: f32, y: f32 },
    #[serde(rename = "carSpawned")]
    ObstacleSpawned(ObstacleSpawn),
}

impl OutboundEvent {
    pub fn obstacle_spawned(obstacle: &Obstacle) -> Self {
        OutboundEvent::ObstacleSpawned(ObstacleSpawn {
            id: obstacle.id,
            x: obstacle.pos.x,
            y: obstacle.pos.y,
            color: obstacle.color,
        })
    }

    /// Relay event name
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::PlayerMoved { .. } => "playerMoved",
            OutboundEvent::ObstacleSpawned(_) => "carSpawned",
        }
    }

    /// JSON payload without the event envelope
    pub fn payload_json(&self) -> String {
        // Plain structs of numbers and strings always serialize
        match self {
            OutboundEvent::PlayerMoved { x, y } => serde_json::json!({ "x": x, "y": y }).to_string(),
            OutboundEvent::ObstacleSpawned(spawn) => {
                serde_json::to_string(spawn).unwrap_or_default()
            }
        }
    }
}

/// A peer's car position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePlayer {
    pub id: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Deserialize)]
struct RosterEntry {
    x: f32,
    y: f32,
}

/// Events received from the relay (advisory only)
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Full roster on join
    CurrentPlayers(Vec<RemotePlayer>),
    NewPlayer(RemotePlayer),
    PlayerMoved(RemotePlayer),
    PlayerDisconnected(String),
    ObstacleSpawned(ObstacleSpawn),
    HighScoresUpdated(Vec<LeaderboardEntry>),
}

fn parse<T: for<'de> Deserialize<'de>>(event: &str, payload: &str) -> Result<T, RelayError> {
    serde_json::from_str(payload).map_err(|source| RelayError::Malformed {
        event: event.to_string(),
        source,
    })
}

fn check_player(event: &str, player: RemotePlayer) -> Result<RemotePlayer, RelayError> {
    if player.x.is_finite() && player.y.is_finite() {
        Ok(player)
    } else {
        Err(RelayError::InvalidPosition(event.to_string()))
    }
}

impl InboundEvent {
    /// Parse a relay message
    pub fn from_wire(event: &str, payload: &str) -> Result<Self, RelayError> {
        match event {
            "currentPlayers" => {
                let raw: serde_json::Map<String, serde_json::Value> = parse(event, payload)?;
                let mut players = Vec::with_capacity(raw.len());
                for (id, value) in raw {
                    // One bad entry must not cost us the whole roster
                    match serde_json::from_value::<RosterEntry>(value) {
                        Ok(entry) if entry.x.is_finite() && entry.y.is_finite() => {
                            players.push(RemotePlayer {
                                id,
                                x: entry.x,
                                y: entry.y,
                            });
                        }
                        _ => log::debug!("Dropping malformed roster entry for {}", id),
                    }
                }
                Ok(InboundEvent::CurrentPlayers(players))
            }
            "newPlayer" => Ok(InboundEvent::NewPlayer(check_player(
                event,
                parse(event, payload)?,
            )?)),
            "playerMoved" => Ok(InboundEvent::PlayerMoved(check_player(
                event,
                parse(event, payload)?,
            )?)),
            "playerDisconnected" => Ok(InboundEvent::PlayerDisconnected(parse(event, payload)?)),
            "carSpawned" => {
                let spawn: ObstacleSpawn = parse(event, payload)?;
                if !(spawn.x.is_finite() && spawn.y.is_finite()) {
                    return Err(RelayError::InvalidPosition(event.to_string()));
                }
                Ok(InboundEvent::ObstacleSpawned(spawn))
            }
            "highScoresUpdated" => Ok(InboundEvent::HighScoresUpdated(parse(event, payload)?)),
            other => Err(RelayError::UnknownEvent(other.to_string())),
        }
    }
}
