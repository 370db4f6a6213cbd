//! The game arena: ruleset, map, players, units and colonies.
//!
//! Entities live in ordered maps keyed by their ids, so every iteration the
//! turn pass does is in ascending id order. Ids are handed out sequentially
//! and never reused.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use colonia_rules::Ruleset;
use colonia_types::{
    Ability, ColonyId, GoodsTypeId, PlayerId, PlayerKind, Stance, UnitId, UnitRole, UnitTypeId,
};
use colonia_world::{Map, Position};

use crate::colony::Colony;
use crate::error::{SimError, unknown};
use crate::player::Player;
use crate::tension::stance_delta;
use crate::unit::{RepairLocation, Unit, UnitLocation};

/// Complete simulation state.
#[derive(Debug, Clone)]
pub struct Game {
    pub(crate) rules: Arc<Ruleset>,
    pub(crate) map: Map,
    pub(crate) turn: u32,
    pub(crate) players: BTreeMap<PlayerId, Player>,
    pub(crate) units: BTreeMap<UnitId, Unit>,
    pub(crate) colonies: BTreeMap<ColonyId, Colony>,
    next_player: PlayerId,
    next_unit: UnitId,
    next_colony: ColonyId,
}

impl Game {
    /// An empty game on `map`.
    pub const fn new(rules: Arc<Ruleset>, map: Map) -> Self {
        Self {
            rules,
            map,
            turn: 0,
            players: BTreeMap::new(),
            units: BTreeMap::new(),
            colonies: BTreeMap::new(),
            next_player: PlayerId(0),
            next_unit: UnitId(0),
            next_colony: ColonyId(0),
        }
    }

    /// The ruleset.
    pub fn rules(&self) -> &Ruleset {
        &self.rules
    }

    /// Shared handle to the ruleset.
    pub const fn rules_handle(&self) -> &Arc<Ruleset> {
        &self.rules
    }

    /// The map.
    pub const fn map(&self) -> &Map {
        &self.map
    }

    /// Mutable map, for scenario setup.
    pub const fn map_mut(&mut self) -> &mut Map {
        &mut self.map
    }

    /// Turns completed so far.
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    // -----------------------------------------------------------------------
    // Players
    // -----------------------------------------------------------------------

    /// Add a player.
    pub fn add_player(&mut self, name: &str, kind: PlayerKind) -> PlayerId {
        let id = self.next_player;
        self.next_player = id.next().unwrap_or(id);
        self.players.insert(id, Player::new(id, name, kind));
        info!(player = %id, name, ?kind, "player added");
        id
    }

    /// All players in id order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Player by id.
    pub fn player(&self, id: PlayerId) -> Result<&Player, SimError> {
        self.players.get(&id).ok_or(SimError::UnknownPlayer(id))
    }

    /// Mutable player by id.
    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, SimError> {
        self.players.get_mut(&id).ok_or(SimError::UnknownPlayer(id))
    }

    /// Change the stance between two players in both directions, applying
    /// the stance change's tension delta to both sides.
    pub fn set_stance(&mut self, a: PlayerId, b: PlayerId, stance: Stance) -> Result<(), SimError> {
        self.player(a)?;
        self.player(b)?;
        for (from, to) in [(a, b), (b, a)] {
            let player = self.player_mut(from)?;
            player.set_stance_raw(to, stance);
            if let Some(delta) = stance_delta(stance) {
                player.tension_mut(to).modify(delta);
            }
        }
        info!(%a, %b, stance = stance.key(), "stance changed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Units
    // -----------------------------------------------------------------------

    /// Create a unit with a full movement allotment.
    pub fn add_unit(&mut self, owner: PlayerId, type_id: &str, location: UnitLocation) -> Result<UnitId, SimError> {
        self.player(owner)?;
        let unit_type = self
            .rules
            .unit_type(type_id)
            .ok_or_else(|| unknown("unit type", type_id))?;
        if let UnitLocation::Tile(position) = location {
            self.map.require(position)?;
        }
        let id = self.next_unit;
        let mut unit = Unit::new(id, owner, UnitTypeId::new(type_id), location);
        unit.set_moves_left(unit_type.moves);
        let sight = unit_type.line_of_sight;
        self.next_unit = id.next().unwrap_or(id);
        self.units.insert(id, unit);
        if let UnitLocation::Tile(position) = location {
            self.map.explore(owner, position, sight);
        }
        debug!(unit = %id, %owner, type_id, ?location, "unit added");
        Ok(id)
    }

    /// All units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Unit by id.
    pub fn unit(&self, id: UnitId) -> Result<&Unit, SimError> {
        self.units.get(&id).ok_or(SimError::UnknownUnit(id))
    }

    /// Mutable unit by id.
    pub fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit, SimError> {
        self.units.get_mut(&id).ok_or(SimError::UnknownUnit(id))
    }

    /// Remove a unit from the game, taking it off any colony job.
    pub fn remove_unit(&mut self, id: UnitId) -> Result<Unit, SimError> {
        let unit = self.units.remove(&id).ok_or(SimError::UnknownUnit(id))?;
        if let UnitLocation::Colony(colony) = unit.location()
            && let Some(colony) = self.colonies.get_mut(&colony)
        {
            colony.remove_worker(id);
        }
        debug!(unit = %id, "unit removed");
        Ok(unit)
    }

    /// Map position of a unit: its tile, or its colony's centre.
    pub fn unit_position(&self, unit: &Unit) -> Option<Position> {
        match unit.location() {
            UnitLocation::Tile(position) => Some(position),
            UnitLocation::Colony(colony) => self.colonies.get(&colony).map(Colony::position),
            UnitLocation::HomePort => None,
        }
    }

    /// Units standing on the tile at `position`, outside any colony.
    pub fn units_on_tile(&self, position: Position) -> impl Iterator<Item = &Unit> {
        self.units
            .values()
            .filter(move |u| u.location() == UnitLocation::Tile(position))
    }

    /// Where `owner` repairs damaged ships: the first colony (by id) with a
    /// repair-capable building, else the home port.
    pub fn repair_location(&self, owner: PlayerId) -> Option<RepairLocation> {
        let colony = self
            .colonies
            .values()
            .find(|c| c.owner() == owner && c.has_building_ability(&self.rules, Ability::RepairUnits));
        if let Some(colony) = colony {
            return Some(RepairLocation::Colony(colony.id()));
        }
        self.players
            .get(&owner)
            .filter(|p| p.has_home_port())
            .map(|_| RepairLocation::HomePort)
    }

    /// Damage a unit and send it to `location`.
    pub(crate) fn send_for_repair(&mut self, id: UnitId, location: RepairLocation) -> Result<(), SimError> {
        let turns = self.rules.combat().ship_repair_turns;
        let destination = match location {
            RepairLocation::HomePort => UnitLocation::HomePort,
            RepairLocation::Colony(colony) => UnitLocation::Tile(self.colony(colony)?.position()),
        };
        let unit = self.unit_mut(id)?;
        unit.damage(location, turns)?;
        unit.set_location(destination);
        info!(unit = %id, ?location, turns, "unit sent for repair");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Colonies
    // -----------------------------------------------------------------------

    /// Found a colony on a land tile with no settlement.
    pub fn found_colony(&mut self, owner: PlayerId, name: &str, position: Position) -> Result<ColonyId, SimError> {
        self.player(owner)?;
        let tile = self.map.require(position)?;
        if tile.settlement().is_some() {
            return Err(SimError::InvalidColonySite {
                position,
                reason: "a settlement already stands there",
            });
        }
        if tile.is_water(&self.rules)? {
            return Err(SimError::InvalidColonySite {
                position,
                reason: "colonies cannot be founded on water",
            });
        }
        let id = self.next_colony;
        self.next_colony = id.next().unwrap_or(id);
        let colony = Colony::new(id, owner, name, position, &self.rules, &self.map);
        self.colonies.insert(id, colony);
        self.map.require_mut(position)?.set_settlement(Some(id));
        let sight = self.rules.colony().line_of_sight;
        self.map.explore(owner, position, sight);
        info!(colony = %id, %owner, name, %position, "colony founded");
        Ok(id)
    }

    /// All colonies in id order.
    pub fn colonies(&self) -> impl Iterator<Item = &Colony> {
        self.colonies.values()
    }

    /// Colony by id.
    pub fn colony(&self, id: ColonyId) -> Result<&Colony, SimError> {
        self.colonies.get(&id).ok_or(SimError::UnknownColony(id))
    }

    /// Mutable colony by id.
    pub fn colony_mut(&mut self, id: ColonyId) -> Result<&mut Colony, SimError> {
        self.colonies.get_mut(&id).ok_or(SimError::UnknownColony(id))
    }

    /// Colony standing at `position`.
    pub fn colony_at(&self, position: Position) -> Option<&Colony> {
        let id = self.map.tile(position)?.settlement()?;
        self.colonies.get(&id)
    }

    fn check_at_colony(&self, colony: ColonyId, unit: UnitId) -> Result<(), SimError> {
        let position = self.colony(colony)?.position();
        let unit = self.unit(unit)?;
        let here = match unit.location() {
            UnitLocation::Colony(at) => at == colony,
            UnitLocation::Tile(at) => at == position,
            UnitLocation::HomePort => false,
        };
        if here {
            Ok(())
        } else {
            Err(SimError::NotAWorker {
                colony,
                unit: unit.id(),
            })
        }
    }

    /// Put a unit at the colony to work on a tile.
    pub fn assign_to_tile(&mut self, colony: ColonyId, unit: UnitId, position: Position, goods: &str) -> Result<(), SimError> {
        self.check_at_colony(colony, unit)?;
        let worker = self.units.get(&unit).ok_or(SimError::UnknownUnit(unit))?;
        let target = self.colonies.get_mut(&colony).ok_or(SimError::UnknownColony(colony))?;
        target.assign_to_tile(&self.rules, &self.map, worker, position, &GoodsTypeId::new(goods))?;
        self.unit_mut(unit)?.set_location(UnitLocation::Colony(colony));
        Ok(())
    }

    /// Put a unit at the colony to work in a building.
    pub fn assign_to_building(&mut self, colony: ColonyId, unit: UnitId, building: &str) -> Result<(), SimError> {
        self.check_at_colony(colony, unit)?;
        let worker = self.units.get(&unit).ok_or(SimError::UnknownUnit(unit))?;
        let target = self.colonies.get_mut(&colony).ok_or(SimError::UnknownColony(colony))?;
        target.assign_to_building(&self.rules, worker, building)?;
        self.unit_mut(unit)?.set_location(UnitLocation::Colony(colony));
        Ok(())
    }

    /// Take a worker out of the colony onto the centre tile.
    pub fn remove_worker(&mut self, colony: ColonyId, unit: UnitId) -> Result<(), SimError> {
        let target = self.colonies.get_mut(&colony).ok_or(SimError::UnknownColony(colony))?;
        if !target.remove_worker(unit) {
            return Err(SimError::NotAWorker { colony, unit });
        }
        let position = target.position();
        self.unit_mut(unit)?.set_location(UnitLocation::Tile(position));
        Ok(())
    }

    /// Raise a colony building one level, checking the owner's factory ability.
    pub fn upgrade_building(&mut self, colony: ColonyId, building: &str) -> Result<u32, SimError> {
        let owner = self.colony(colony)?.owner();
        let factory = self.player(owner)?.has_ability(Ability::BuildFactory);
        let target = self.colonies.get_mut(&colony).ok_or(SimError::UnknownColony(colony))?;
        target.upgrade_building(&self.rules, building, factory)
    }

    /// Equip a unit at the colony for `role` from the colony's stock.
    pub fn equip_unit(&mut self, colony: ColonyId, unit: UnitId, role: UnitRole) -> Result<(), SimError> {
        self.check_at_colony(colony, unit)?;
        let target = self.colonies.get_mut(&colony).ok_or(SimError::UnknownColony(colony))?;
        let equipped = self.units.get_mut(&unit).ok_or(SimError::UnknownUnit(unit))?;
        if equipped.owner() != target.owner() {
            return Err(SimError::WrongOwner { unit, colony });
        }
        target.equip(&self.rules, equipped, role)
    }

    /// Transfer a colony and every unit working in it to `new_owner`.
    pub(crate) fn transfer_colony(&mut self, colony: ColonyId, new_owner: PlayerId) -> Result<(), SimError> {
        let target = self.colony_mut(colony)?;
        let old_owner = target.owner();
        target.set_owner(new_owner);
        for unit in self.units.values_mut() {
            if unit.location() == UnitLocation::Colony(colony) {
                unit.set_owner(new_owner);
            }
        }
        info!(%colony, %old_owner, %new_owner, "colony changed hands");
        Ok(())
    }
}
