//! Remote player roster
//!
//! Last known positions of peers, keyed by connection id. Purely cosmetic:
//! ghosts are drawn but never collide and never score.

use std::collections::BTreeMap;

use glam::Vec2;

use super::events::RemotePlayer;

#[derive(Debug, Clone, Default)]
pub struct RemotePlayers {
    local_id: Option<String>,
    players: BTreeMap<String, Vec2>,
}

impl RemotePlayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Our own connection id; it is never stored as a remote
    pub fn set_local_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.players.remove(&id);
        self.local_id = Some(id);
    }

    fn is_local(&self, id: &str) -> bool {
        self.local_id.as_deref() == Some(id)
    }

    /// Replace the whole roster
    pub fn replace_all(&mut self, players: Vec<RemotePlayer>) {
        self.players.clear();
        for player in players {
            self.upsert(player);
        }
    }

    /// Insert or move a peer
    pub fn upsert(&mut self, player: RemotePlayer) {
        if self.is_local(&player.id) {
            return;
        }
        self.players.insert(player.id, Vec2::new(player.x, player.y));
    }

    pub fn remove(&mut self, id: &str) {
        self.players.remove(id);
    }

    pub fn get(&self, id: &str) -> Option<Vec2> {
        self.players.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Peers in id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Vec2)> {
        self.players.iter().map(|(id, pos)| (id.as_str(), *pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, x: f32) -> RemotePlayer {
        RemotePlayer {
            id: id.to_string(),
            x,
            y: 780.0,
        }
    }

    #[test]
    fn test_local_id_is_excluded() {
        let mut roster = RemotePlayers::new();
        roster.set_local_id("me");
        roster.replace_all(vec![player("me", 1.0), player("you", 2.0)]);
        assert_eq!(roster.len(), 1);
        assert!(roster.get("me").is_none());

        roster.upsert(player("me", 3.0));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_setting_local_id_evicts_existing_entry() {
        let mut roster = RemotePlayers::new();
        roster.upsert(player("me", 1.0));
        roster.set_local_id("me");
        assert!(roster.is_empty());
    }

    #[test]
    fn test_move_and_disconnect() {
        let mut roster = RemotePlayers::new();
        roster.upsert(player("a", 1.0));
        roster.upsert(player("a", 50.0));
        assert_eq!(roster.get("a"), Some(Vec2::new(50.0, 780.0)));
        roster.remove("a");
        assert!(roster.is_empty());
    }

    #[test]
    fn test_iteration_is_ordered() {
        let mut roster = RemotePlayers::new();
        roster.upsert(player("b", 1.0));
        roster.upsert(player("a", 2.0));
        let ids: Vec<_> = roster.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
