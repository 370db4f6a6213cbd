//! Players: treasury, abilities, stance and tension toward other players.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use colonia_types::{Ability, PlayerId, PlayerKind, Stance};

use crate::tension::Tension;

/// A party in the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    name: String,
    kind: PlayerKind,
    home_port: bool,
    gold: i64,
    abilities: BTreeSet<Ability>,
    stances: BTreeMap<PlayerId, Stance>,
    tension: BTreeMap<PlayerId, Tension>,
}

impl Player {
    /// A new player without gold. European players have a home port.
    pub fn new(id: PlayerId, name: &str, kind: PlayerKind) -> Self {
        Self {
            id,
            name: String::from(name),
            kind,
            home_port: matches!(kind, PlayerKind::European),
            gold: 0,
            abilities: BTreeSet::new(),
            stances: BTreeMap::new(),
            tension: BTreeMap::new(),
        }
    }

    /// Id.
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind.
    pub const fn kind(&self) -> PlayerKind {
        self.kind
    }

    /// Whether damaged ships can be repaired overseas.
    pub const fn has_home_port(&self) -> bool {
        self.home_port
    }

    /// Grant or revoke the home port.
    pub const fn set_home_port(&mut self, home_port: bool) {
        self.home_port = home_port;
    }

    /// Gold in the treasury.
    pub const fn gold(&self) -> i64 {
        self.gold
    }

    /// Add gold.
    pub const fn add_gold(&mut self, amount: i64) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Remove up to `amount` gold, never going below zero.
    ///
    /// Returns the amount actually removed.
    pub fn remove_gold(&mut self, amount: i64) -> i64 {
        let removed = amount.clamp(0, self.gold.max(0));
        self.gold = self.gold.saturating_sub(removed);
        removed
    }

    /// Whether the player has `ability`.
    pub fn has_ability(&self, ability: Ability) -> bool {
        self.abilities.contains(&ability)
    }

    /// Grant `ability`.
    pub fn grant_ability(&mut self, ability: Ability) {
        self.abilities.insert(ability);
    }

    /// Stance toward `other`.
    pub fn stance(&self, other: PlayerId) -> Stance {
        self.stances.get(&other).copied().unwrap_or_default()
    }

    /// Set the stance toward `other` without touching tension.
    pub(crate) fn set_stance_raw(&mut self, other: PlayerId, stance: Stance) {
        self.stances.insert(other, stance);
    }

    /// Whether the player is at war with `other`.
    pub fn is_at_war_with(&self, other: PlayerId) -> bool {
        self.stance(other).is_hostile()
    }

    /// Tension toward `other`.
    pub fn tension(&self, other: PlayerId) -> Tension {
        self.tension.get(&other).copied().unwrap_or_default()
    }

    /// Mutable tension toward `other`, created at zero on first use.
    pub fn tension_mut(&mut self, other: PlayerId) -> &mut Tension {
        self.tension.entry(other).or_default()
    }

    /// Decay every tension value toward zero.
    pub fn decay_tension(&mut self, amount: i32) {
        for tension in self.tension.values_mut() {
            tension.decay(amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gold_never_goes_negative() {
        let mut player = Player::new(PlayerId::new(0), "Dutch", PlayerKind::European);
        player.add_gold(120);
        assert_eq!(player.remove_gold(50), 50);
        assert_eq!(player.remove_gold(500), 70);
        assert_eq!(player.gold(), 0);
        assert_eq!(player.remove_gold(-5), 0);
    }

    #[test]
    fn only_europeans_start_with_a_home_port() {
        assert!(Player::new(PlayerId::new(0), "Dutch", PlayerKind::European).has_home_port());
        assert!(!Player::new(PlayerId::new(1), "Arawak", PlayerKind::Native).has_home_port());
    }

    #[test]
    fn unknown_players_are_uncontacted_and_calm() {
        let player = Player::new(PlayerId::new(0), "Dutch", PlayerKind::European);
        assert_eq!(player.stance(PlayerId::new(3)), Stance::Uncontacted);
        assert_eq!(player.tension(PlayerId::new(3)).value(), 0);
        assert!(!player.is_at_war_with(PlayerId::new(3)));
    }
}
