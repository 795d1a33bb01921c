//! Simulation engine
//!
//! Owns the configuration, the run state and the remote roster. A driver
//! calls [`Simulation::step`] once per rendered frame, drains outbound events
//! for the relay afterwards and feeds inbound relay messages in between.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::events::{InboundEvent, ObstacleSpawn, OutboundEvent, RelayError};
use super::intent::Intent;
use super::remote::RemotePlayers;
use super::snapshot::StateSnapshot;
use super::spawn::{lane_x, nearest_lane};
use super::state::{GameState, Obstacle, ObstacleOrigin, RunPhase};
use super::tick::tick;
use crate::config::{ConfigError, GameConfig};

#[derive(Debug, Clone)]
pub struct Simulation {
    config: GameConfig,
    state: GameState,
    remotes: RemotePlayers,
}

impl Simulation {
    /// Create an idle engine with a fresh id namespace
    ///
    /// The namespace mixes OS entropy into the seed, so peers that pick the
    /// same seed (clients started in the same millisecond) still get distinct
    /// origins. A u32 keeps it within JavaScript's safe integer range.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        let origin = Pcg32::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15).random::<u32>()
            ^ rand::random::<u32>();
        Self::with_origin(config, seed, origin)
    }

    /// Create an idle engine with an explicit id namespace
    pub fn with_origin(config: GameConfig, seed: u64, origin: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = GameState::new(seed, origin, &config);
        Ok(Self {
            config,
            state,
            remotes: RemotePlayers::new(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn phase(&self) -> RunPhase {
        self.state.phase
    }

    pub fn remotes(&self) -> &RemotePlayers {
        &self.remotes
    }

    /// Start (or restart) a run with the current seed
    pub fn start(&mut self) {
        let seed = self.state.seed;
        self.start_with_seed(seed);
    }

    /// Start (or restart) a run with a new seed
    ///
    /// Always a full reinitialisation, whatever the current phase.
    pub fn start_with_seed(&mut self, seed: u64) {
        self.state.restart(seed, &self.config);
        log::info!("Run started with seed {}", seed);
    }

    /// Advance one frame
    pub fn step(&mut self, intent: Intent) -> StateSnapshot {
        tick(&mut self.state, &intent, &self.config);
        self.snapshot()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::capture(&self.state, &self.remotes)
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<OutboundEvent> {
        std::mem::take(&mut self.state.outbox)
    }

    /// Our relay connection id
    pub fn set_local_id(&mut self, id: impl Into<String>) {
        self.remotes.set_local_id(id);
    }

    /// Parse and apply a raw relay message
    ///
    /// Malformed messages are dropped. The parsed event is returned so the
    /// caller can route what the simulation does not own (leaderboard pushes).
    pub fn receive(&mut self, event: &str, payload: &str) -> Option<InboundEvent> {
        match InboundEvent::from_wire(event, payload) {
            Ok(inbound) => {
                self.handle_inbound(inbound.clone());
                Some(inbound)
            }
            Err(e) => {
                log::debug!("Dropping relay message: {}", e);
                None
            }
        }
    }

    /// Apply an inbound relay event
    pub fn handle_inbound(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::CurrentPlayers(players) => self.remotes.replace_all(players),
            InboundEvent::NewPlayer(player) | InboundEvent::PlayerMoved(player) => {
                self.remotes.upsert(player)
            }
            InboundEvent::PlayerDisconnected(id) => self.remotes.remove(&id),
            InboundEvent::ObstacleSpawned(spawn) => {
                if let Err(e) = self.merge_remote_obstacle(spawn) {
                    log::debug!("Dropping remote obstacle: {}", e);
                }
            }
            // Leaderboard pushes are not simulation state
            InboundEvent::HighScoresUpdated(_) => {}
        }
    }

    /// Merge a peer's obstacle unless we already have it
    ///
    /// Returns `Ok(true)` if it was added. Spawns whose `y` lies outside
    /// `[-obstacle_height, track_height]`, or that would land on the player
    /// car, are rejected.
    pub fn merge_remote_obstacle(&mut self, spawn: ObstacleSpawn) -> Result<bool, RelayError> {
        if self.state.phase != RunPhase::Running {
            return Ok(false);
        }
        // Our own spawns echoed back, possibly after they already left the track
        if spawn.id.origin == self.state.origin() {
            return Ok(false);
        }
        if self.state.contains_obstacle(spawn.id) {
            return Ok(false);
        }
        if !spawn.y.is_finite()
            || spawn.y < -self.config.obstacle_height
            || spawn.y > self.config.track_height
        {
            return Err(RelayError::InvalidPosition("carSpawned".to_string()));
        }

        let lane = nearest_lane(spawn.x, &self.config);
        let obstacle = Obstacle {
            id: spawn.id,
            pos: glam::Vec2::new(lane_x(lane, &self.config), spawn.y),
            color: spawn.color,
            origin: ObstacleOrigin::Remote,
        };
        if obstacle
            .rect(&self.config)
            .overlaps(&self.state.player.rect(&self.config))
        {
            return Err(RelayError::InvalidPosition("carSpawned".to_string()));
        }

        self.state.obstacles.push(obstacle);
        log::trace!("Merged remote obstacle {} into lane {}", spawn.id, lane);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::intent::Direction;
    use crate::sim::spawn::lane_positions;
    use crate::sim::state::{Color, ObstacleId};

    fn engine() -> Simulation {
        Simulation::with_origin(GameConfig::default(), 1234, 7).unwrap()
    }

    fn remote_spawn(seq: u64, x: f32) -> ObstacleSpawn {
        ObstacleSpawn {
            id: ObstacleId { origin: 99, seq },
            x,
            y: -100.0,
            color: Color::new(0xabcdef),
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GameConfig {
            lane_count: 0,
            ..Default::default()
        };
        assert!(Simulation::new(config, 1).is_err());
    }

    #[test]
    fn test_lifecycle() {
        let mut sim = engine();
        assert_eq!(sim.phase(), RunPhase::Idle);
        let snapshot = sim.step(Intent::NONE);
        assert_eq!(snapshot.frame, 0);
        assert!(snapshot.obstacles.is_empty());

        sim.start();
        assert_eq!(sim.phase(), RunPhase::Running);
        let snapshot = sim.step(Intent::NONE);
        assert_eq!(snapshot.frame, 1);
        assert_eq!(snapshot.obstacles.len(), 1);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut sim = engine();
        sim.start();
        for _ in 0..200 {
            sim.step(Intent::continuous(Direction::Left));
        }
        sim.state_mut().phase = RunPhase::Over;

        sim.start();
        let first = sim.snapshot();
        let first_difficulty = sim.state().difficulty.clone();
        sim.start();
        let second = sim.snapshot();

        assert_eq!(first, second);
        assert_eq!(first.score, 0);
        assert!(first.obstacles.is_empty());
        assert_eq!(first.frame, 0);
        assert_eq!(sim.state().difficulty, first_difficulty);
        assert_eq!(sim.state().difficulty, crate::sim::Difficulty::new(sim.config()));
    }

    #[test]
    fn test_events_are_drained() {
        let mut sim = engine();
        sim.start();
        sim.step(Intent::discrete(Direction::Right));
        let events = sim.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], OutboundEvent::PlayerMoved { x, .. } if x == 225.0));
        assert!(matches!(events[1], OutboundEvent::ObstacleSpawned(_)));
        assert!(sim.drain_events().is_empty());
    }

    #[test]
    fn test_remote_merge_is_idempotent() {
        let mut sim = engine();
        sim.start();
        let lanes = lane_positions(sim.config());
        assert!(sim.merge_remote_obstacle(remote_spawn(1, lanes[2])).unwrap());
        assert!(!sim.merge_remote_obstacle(remote_spawn(1, lanes[2])).unwrap());
        let count = sim
            .state()
            .obstacles
            .iter()
            .filter(|o| o.id.seq == 1 && o.id.origin == 99)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_remote_merge_snaps_to_lane() {
        let mut sim = engine();
        sim.start();
        assert!(sim.merge_remote_obstacle(remote_spawn(5, 180.0)).unwrap());
        let merged = sim.state().obstacles.last().unwrap();
        assert_eq!(merged.pos.x, lane_positions(sim.config())[1]);
        assert_eq!(merged.origin, ObstacleOrigin::Remote);
    }

    #[test]
    fn test_own_echo_and_frozen_runs_are_ignored() {
        let mut sim = engine();
        let spawn = remote_spawn(1, 36.0);
        // Idle
        assert!(!sim.merge_remote_obstacle(spawn.clone()).unwrap());

        sim.start();
        let mut echo = spawn.clone();
        echo.id.origin = 7;
        assert!(!sim.merge_remote_obstacle(echo).unwrap());

        sim.state_mut().phase = RunPhase::Over;
        assert!(!sim.merge_remote_obstacle(spawn).unwrap());
    }

    #[test]
    fn test_remote_obstacles_score_on_exit() {
        let mut sim = engine();
        sim.start();
        sim.step(Intent::NONE); // consume the frame-0 spawn
        sim.state_mut().obstacles.clear();
        let lanes = lane_positions(sim.config());
        let mut spawn = remote_spawn(3, lanes[2]);
        spawn.y = 868.0;
        assert!(sim.merge_remote_obstacle(spawn).unwrap());
        let snapshot = sim.step(Intent::NONE);
        assert_eq!(snapshot.score, 10);
    }

    #[test]
    fn test_receive_routes_roster() {
        let mut sim = engine();
        sim.set_local_id("me");
        sim.receive(
            "currentPlayers",
            r#"{"me": {"x": 1, "y": 2}, "p1": {"x": 3, "y": 4}}"#,
        )
        .unwrap();
        assert_eq!(sim.remotes().len(), 1);

        sim.receive("playerMoved", r#"{"id": "p1", "x": 30, "y": 4}"#);
        assert_eq!(sim.remotes().get("p1").unwrap().x, 30.0);

        sim.receive("newPlayer", r#"{"id": "p2", "x": 0, "y": 4}"#);
        assert_eq!(sim.snapshot().remote_players.len(), 2);

        sim.receive("playerDisconnected", r#""p1""#);
        assert_eq!(sim.remotes().len(), 1);

        assert!(sim.receive("playerMoved", "{garbage").is_none());
        assert_eq!(sim.remotes().len(), 1);
    }

    #[test]
    fn test_receive_spawn_twice() {
        let mut sim = engine();
        sim.start();
        let payload = r##"{"id": {"origin": 5, "seq": 1}, "x": 36.0, "y": -100.0, "color": "#ff0000"}"##;
        sim.receive("carSpawned", payload).unwrap();
        sim.receive("carSpawned", payload).unwrap();
        let remote = sim
            .state()
            .obstacles
            .iter()
            .filter(|o| o.origin == ObstacleOrigin::Remote)
            .count();
        assert_eq!(remote, 1);
    }

    #[test]
    fn test_remote_players_never_collide() {
        let mut sim = engine();
        sim.start();
        sim.step(Intent::NONE);
        sim.state_mut().obstacles.clear();
        let player = sim.state().player.pos;
        sim.receive(
            "newPlayer",
            &format!(r#"{{"id": "ghost", "x": {}, "y": {}}}"#, player.x, player.y),
        );
        let snapshot = sim.step(Intent::NONE);
        assert!(!snapshot.is_over);
    }

    #[test]
    fn test_remote_spawn_outside_track_is_rejected() {
        let mut sim = engine();
        sim.start();
        let lanes = lane_positions(sim.config());
        let before = sim.state().obstacles.len();

        let mut far_above = remote_spawn(1, lanes[0]);
        far_above.y = -1.0e30;
        assert!(matches!(
            sim.merge_remote_obstacle(far_above),
            Err(RelayError::InvalidPosition(_))
        ));

        let mut below = remote_spawn(2, lanes[0]);
        below.y = 871.0;
        assert!(sim.merge_remote_obstacle(below).is_err());

        // Edges of the accepted range
        let mut top = remote_spawn(3, lanes[0]);
        top.y = -100.0;
        assert!(sim.merge_remote_obstacle(top).unwrap());
        let mut bottom = remote_spawn(4, lanes[0]);
        bottom.y = 870.0;
        assert!(sim.merge_remote_obstacle(bottom).unwrap());
        assert_eq!(sim.state().obstacles.len(), before + 2);

        // Relay path drops it without touching the obstacle set
        let payload = r##"{"id": {"origin": 5, "seq": 9}, "x": 36.0, "y": -1e30, "color": "#ff0000"}"##;
        assert!(sim.receive("carSpawned", payload).is_some());
        assert_eq!(sim.state().obstacles.len(), before + 2);
    }

    #[test]
    fn test_remote_spawn_on_player_is_rejected() {
        let mut sim = engine();
        sim.start();
        sim.step(Intent::NONE);
        sim.state_mut().obstacles.clear();
        let player = sim.state().player.pos;
        let mut spawn = remote_spawn(1, player.x);
        spawn.y = player.y;
        assert!(sim.merge_remote_obstacle(spawn).is_err());

        let snapshot = sim.step(Intent::NONE);
        assert!(!snapshot.is_over);
        assert!(snapshot.obstacles.is_empty());
    }

    #[test]
    fn test_same_seed_engines_get_distinct_origins() {
        let a = Simulation::new(GameConfig::default(), 1_700_000_000_000).unwrap();
        let b = Simulation::new(GameConfig::default(), 1_700_000_000_000).unwrap();
        assert_ne!(a.state().origin(), b.state().origin());
    }
}
