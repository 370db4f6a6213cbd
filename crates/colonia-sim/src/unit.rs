//! Units: location, movement budget, role, cargo and repair condition.
//!
//! ## Condition
//!
//! ```text
//! Active --damage--> Damaged --begin_repair--> Repairing --tick_repair(0)--> Active
//! ```
//!
//! A damaged unit has been sent to its repair location but has not started
//! repairs; the turn pass starts them on the next turn and counts them down.
//! Only active units move, fight or work.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use colonia_rules::Ruleset;
use colonia_rules::ruleset::UnitType;
use colonia_types::{ColonyId, GoodsTypeId, PlayerId, UnitId, UnitRole, UnitTypeId};
use colonia_world::Position;

use crate::error::{SimError, unknown};

/// Where a unit is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitLocation {
    /// On a map tile (including a colony's centre tile, outside the colony).
    Tile(Position),
    /// Working inside a colony.
    Colony(ColonyId),
    /// Overseas in the owner's home port.
    HomePort,
}

/// Where a damaged unit is repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairLocation {
    /// The owner's home port.
    HomePort,
    /// A colony with a repair-capable building.
    Colony(ColonyId),
}

/// Health of a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitCondition {
    /// Fit for service.
    #[default]
    Active,
    /// Damaged, waiting to start repairs.
    Damaged {
        /// Turns of repair needed.
        turns: u32,
        /// Where.
        location: RepairLocation,
    },
    /// Under repair.
    Repairing {
        /// Turns left.
        turns: u32,
        /// Where.
        location: RepairLocation,
    },
}

impl UnitCondition {
    /// Short name for messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Damaged { .. } => "damaged",
            Self::Repairing { .. } => "repairing",
        }
    }
}

/// Fortification state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fortification {
    /// Not fortified.
    #[default]
    None,
    /// Ordered to fortify; takes effect at the next turn pass.
    Fortifying,
    /// Fortified.
    Fortified,
}

/// A unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    owner: PlayerId,
    type_id: UnitTypeId,
    role: UnitRole,
    location: UnitLocation,
    moves_left: u32,
    fortification: Fortification,
    cargo: BTreeMap<GoodsTypeId, u32>,
    condition: UnitCondition,
}

impl Unit {
    /// A new, active, unequipped unit with no moves left this turn.
    pub const fn new(id: UnitId, owner: PlayerId, type_id: UnitTypeId, location: UnitLocation) -> Self {
        Self {
            id,
            owner,
            type_id,
            role: UnitRole::Default,
            location,
            moves_left: 0,
            fortification: Fortification::None,
            cargo: BTreeMap::new(),
            condition: UnitCondition::Active,
        }
    }

    /// Id.
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Owner.
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Hand the unit to another player.
    pub(crate) const fn set_owner(&mut self, owner: PlayerId) {
        self.owner = owner;
    }

    /// Type key.
    pub const fn type_id(&self) -> &UnitTypeId {
        &self.type_id
    }

    /// Type definition.
    pub fn unit_type<'r>(&self, rules: &'r Ruleset) -> Result<&'r UnitType, SimError> {
        rules
            .unit_type(self.type_id.as_str())
            .ok_or_else(|| unknown("unit type", &self.type_id))
    }

    /// Change the unit's type (promotion or demotion).
    pub(crate) fn set_type(&mut self, type_id: UnitTypeId) {
        self.type_id = type_id;
    }

    /// Current role.
    pub const fn role(&self) -> UnitRole {
        self.role
    }

    /// Change the role. Goods are handled by the caller.
    pub(crate) const fn set_role(&mut self, role: UnitRole) {
        self.role = role;
    }

    /// Whether the unit carries arms.
    pub const fn is_armed(&self) -> bool {
        self.role.is_armed()
    }

    /// Location.
    pub const fn location(&self) -> UnitLocation {
        self.location
    }

    /// Move the unit without spending moves.
    pub(crate) const fn set_location(&mut self, location: UnitLocation) {
        self.location = location;
    }

    /// Map position when the unit is on a tile.
    pub const fn tile(&self) -> Option<Position> {
        match self.location {
            UnitLocation::Tile(position) => Some(position),
            UnitLocation::Colony(_) | UnitLocation::HomePort => None,
        }
    }

    /// Full movement allotment: the role's moves if it sets any, else the type's.
    pub fn initial_moves(&self, rules: &Ruleset) -> Result<u32, SimError> {
        let type_moves = self.unit_type(rules)?.moves;
        Ok(rules
            .role(self.role)
            .and_then(|role| role.moves)
            .unwrap_or(type_moves))
    }

    /// Moves left this turn.
    pub const fn moves_left(&self) -> u32 {
        self.moves_left
    }

    /// Set the moves left this turn.
    pub(crate) const fn set_moves_left(&mut self, moves_left: u32) {
        self.moves_left = moves_left;
    }

    /// Fortification state.
    pub const fn fortification(&self) -> Fortification {
        self.fortification
    }

    /// Whether the unit is fortified.
    pub const fn is_fortified(&self) -> bool {
        matches!(self.fortification, Fortification::Fortified)
    }

    /// Order the unit to fortify.
    pub const fn fortify(&mut self) {
        if matches!(self.fortification, Fortification::None) {
            self.fortification = Fortification::Fortifying;
        }
    }

    /// Drop any fortification.
    pub(crate) const fn unfortify(&mut self) {
        self.fortification = Fortification::None;
    }

    /// Complete a pending fortification. Returns `true` when it took effect.
    pub(crate) const fn complete_fortification(&mut self) -> bool {
        if matches!(self.fortification, Fortification::Fortifying) {
            self.fortification = Fortification::Fortified;
            return true;
        }
        false
    }

    /// Goods carried.
    pub const fn cargo(&self) -> &BTreeMap<GoodsTypeId, u32> {
        &self.cargo
    }

    /// Total amount of goods carried.
    pub fn cargo_total(&self) -> u32 {
        self.cargo.values().fold(0, |acc, amount| acc.saturating_add(*amount))
    }

    /// Load goods.
    pub fn load(&mut self, goods: GoodsTypeId, amount: u32) {
        let held = self.cargo.entry(goods).or_insert(0);
        *held = held.saturating_add(amount);
    }

    /// Drop all cargo.
    fn clear_cargo(&mut self) {
        self.cargo.clear();
    }

    /// Condition.
    pub const fn condition(&self) -> UnitCondition {
        self.condition
    }

    /// Whether the unit is active.
    pub const fn is_active(&self) -> bool {
        matches!(self.condition, UnitCondition::Active)
    }

    /// Active to damaged: the unit loses its cargo, moves and fortification.
    pub fn damage(&mut self, location: RepairLocation, turns: u32) -> Result<(), SimError> {
        if !self.is_active() {
            return Err(self.invalid("be damaged"));
        }
        self.condition = UnitCondition::Damaged { turns, location };
        self.clear_cargo();
        self.moves_left = 0;
        self.fortification = Fortification::None;
        Ok(())
    }

    /// Damaged to repairing.
    pub fn begin_repair(&mut self) -> Result<(), SimError> {
        let UnitCondition::Damaged { turns, location } = self.condition else {
            return Err(self.invalid("begin repairs"));
        };
        self.condition = UnitCondition::Repairing { turns, location };
        Ok(())
    }

    /// Count one turn of repair down. Returns `true` when the unit is active
    /// again.
    pub fn tick_repair(&mut self) -> Result<bool, SimError> {
        let UnitCondition::Repairing { turns, location } = self.condition else {
            return Err(self.invalid("continue repairs"));
        };
        let turns = turns.saturating_sub(1);
        if turns == 0 {
            self.condition = UnitCondition::Active;
            return Ok(true);
        }
        self.condition = UnitCondition::Repairing { turns, location };
        Ok(false)
    }

    fn invalid(&self, action: &'static str) -> SimError {
        SimError::InvalidTransition {
            unit: self.id,
            action,
            state: self.condition.name(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn galleon() -> Unit {
        let mut unit = Unit::new(
            UnitId::new(4),
            PlayerId::new(0),
            UnitTypeId::new("galleon"),
            UnitLocation::Tile(Position::new(1, 1)),
        );
        unit.load(GoodsTypeId::new("furs"), 100);
        unit.set_moves_left(18);
        unit
    }

    #[test]
    fn repair_cycle() {
        let mut unit = galleon();
        unit.damage(RepairLocation::HomePort, 3).unwrap();
        assert_eq!(unit.cargo_total(), 0);
        assert_eq!(unit.moves_left(), 0);
        assert!(!unit.is_active());

        unit.begin_repair().unwrap();
        assert!(!unit.tick_repair().unwrap());
        assert!(!unit.tick_repair().unwrap());
        assert!(unit.tick_repair().unwrap());
        assert!(unit.is_active());
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut unit = galleon();
        assert!(matches!(unit.begin_repair(), Err(SimError::InvalidTransition { .. })));
        assert!(matches!(unit.tick_repair(), Err(SimError::InvalidTransition { .. })));
        unit.damage(RepairLocation::HomePort, 2).unwrap();
        assert!(matches!(
            unit.damage(RepairLocation::HomePort, 2),
            Err(SimError::InvalidTransition { .. })
        ));
        // Rejected transitions leave the condition alone.
        assert_eq!(
            unit.condition(),
            UnitCondition::Damaged {
                turns: 2,
                location: RepairLocation::HomePort
            }
        );
    }

    #[test]
    fn role_moves_override_type_moves() {
        let rules = Ruleset::classic().unwrap();
        let mut unit = Unit::new(
            UnitId::new(0),
            PlayerId::new(0),
            UnitTypeId::new("free_colonist"),
            UnitLocation::Tile(Position::new(0, 0)),
        );
        assert_eq!(unit.initial_moves(&rules).unwrap(), 3);
        unit.set_role(UnitRole::Dragoon);
        assert_eq!(unit.initial_moves(&rules).unwrap(), 12);
        unit.set_role(UnitRole::Soldier);
        assert_eq!(unit.initial_moves(&rules).unwrap(), 3);
    }

    #[test]
    fn fortification_takes_a_turn() {
        let mut unit = galleon();
        unit.fortify();
        assert!(!unit.is_fortified());
        assert!(unit.complete_fortification());
        assert!(unit.is_fortified());
        assert!(!unit.complete_fortification());
    }
}
