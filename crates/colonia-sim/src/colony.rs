//! Colonies: stock, worked tiles, buildings, build queue and alarm.
//!
//! A colony never owns units. It records which unit works which tile or
//! building; the units themselves live in the game arena with a
//! [`UnitLocation::Colony`](crate::unit::UnitLocation::Colony) location.
//!
//! Stock changes clamp at zero. Overdrawing food raises a famine notice, and
//! filling storable goods past the warehouse capacity raises an overflow
//! notice. Nothing is discarded.

use std::collections::{BTreeMap, VecDeque};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use colonia_rules::Ruleset;
use colonia_rules::ruleset::{BuildingLevel, BuildingType, UnitType};
use colonia_types::{
    Ability, BuildingTypeId, ColonyId, GoodsTypeId, PlayerId, UnitId, UnitRole,
};
use colonia_world::{Map, Position};

use crate::error::{SimError, unknown};
use crate::liberty::Liberty;
use crate::tension::Tension;
use crate::unit::Unit;

// ---------------------------------------------------------------------------
// Parts
// ---------------------------------------------------------------------------

/// A tile in the colony's work radius.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkTile {
    /// Colonist working the tile.
    pub worker: Option<UnitId>,
    /// Goods the colonist produces.
    pub goods: Option<GoodsTypeId>,
}

/// A building's level and workers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Current level; 0 means not built.
    pub level: u32,
    /// Colonists working inside, in assignment order.
    pub workers: Vec<UnitId>,
}

impl Building {
    /// Whether the building stands.
    pub const fn is_built(&self) -> bool {
        self.level > 0
    }
}

/// A temporary production penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionPenalty {
    /// Percent of production lost.
    pub percent: u32,
    /// Turns left, including the current one.
    pub turns_left: u32,
}

/// Something the owner should hear about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// Food consumption exceeded the stock.
    Famine {
        /// The colony.
        colony: ColonyId,
        /// Food that could not be eaten.
        shortfall: u32,
    },
    /// Storable goods above warehouse capacity.
    Overflow {
        /// The colony.
        colony: ColonyId,
        /// The goods.
        goods: GoodsTypeId,
        /// Amount in stock.
        amount: u32,
        /// Warehouse capacity.
        capacity: u32,
    },
    /// A new colonist was born.
    Born {
        /// The colony.
        colony: ColonyId,
        /// The new unit.
        unit: UnitId,
    },
    /// A building from the queue was completed.
    Built {
        /// The colony.
        colony: ColonyId,
        /// The building.
        building: BuildingTypeId,
        /// Its new level.
        level: u32,
    },
    /// A queued building could not be completed and left the queue.
    BuildRejected {
        /// The colony.
        colony: ColonyId,
        /// The building.
        building: BuildingTypeId,
        /// Why.
        reason: String,
    },
    /// A production penalty ran out.
    PenaltyExpired {
        /// The colony.
        colony: ColonyId,
        /// The penalty's percent.
        percent: u32,
    },
}

// ---------------------------------------------------------------------------
// Colony
// ---------------------------------------------------------------------------

/// A settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colony {
    id: ColonyId,
    owner: PlayerId,
    name: String,
    position: Position,
    stock: BTreeMap<GoodsTypeId, u32>,
    work_tiles: BTreeMap<Position, WorkTile>,
    buildings: BTreeMap<BuildingTypeId, Building>,
    build_queue: VecDeque<BuildingTypeId>,
    penalties: Vec<ProductionPenalty>,
    alarm: BTreeMap<PlayerId, Tension>,
}

impl Colony {
    /// A colony at `position` with every building at its initial level and
    /// the on-map tiles around the centre as work tiles.
    pub fn new(id: ColonyId, owner: PlayerId, name: &str, position: Position, rules: &Ruleset, map: &Map) -> Self {
        let work_tiles = map
            .positions_within(position, 1)
            .into_iter()
            .filter(|p| *p != position)
            .map(|p| (p, WorkTile::default()))
            .collect();
        let buildings = rules
            .buildings()
            .iter()
            .map(|b| {
                (
                    b.id.clone(),
                    Building {
                        level: b.initial_level,
                        workers: Vec::new(),
                    },
                )
            })
            .collect();
        Self {
            id,
            owner,
            name: String::from(name),
            position,
            stock: BTreeMap::new(),
            work_tiles,
            buildings,
            build_queue: VecDeque::new(),
            penalties: Vec::new(),
            alarm: BTreeMap::new(),
        }
    }

    /// Id.
    pub const fn id(&self) -> ColonyId {
        self.id
    }

    /// Owner.
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Hand the colony to another player.
    pub(crate) const fn set_owner(&mut self, owner: PlayerId) {
        self.owner = owner;
    }

    /// Name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Centre tile.
    pub const fn position(&self) -> Position {
        self.position
    }

    // -----------------------------------------------------------------------
    // Stock
    // -----------------------------------------------------------------------

    /// Whole stock.
    pub const fn stock(&self) -> &BTreeMap<GoodsTypeId, u32> {
        &self.stock
    }

    /// Amount of `goods` in stock.
    pub fn goods(&self, goods: &str) -> u32 {
        self.stock.get(goods).copied().unwrap_or(0)
    }

    /// Warehouse capacity per storable goods type.
    pub fn storage_capacity(&self, rules: &Ruleset) -> u32 {
        self.built_levels(rules)
            .fold(rules.colony().base_storage, |acc, (_, level)| {
                acc.saturating_add(level.storage)
            })
    }

    /// Change the stock of `goods` by `delta`, clamping at zero.
    ///
    /// Returns a famine notice when food is overdrawn and an overflow notice
    /// when storable goods end above capacity.
    pub fn add_goods(&mut self, rules: &Ruleset, goods: &GoodsTypeId, delta: i64) -> Option<Notice> {
        let current = i64::from(self.goods(goods.as_str()));
        let wanted = current.saturating_add(delta);
        let amount = u32::try_from(wanted.max(0)).unwrap_or(u32::MAX);
        self.stock.insert(goods.clone(), amount);

        let goods_type = rules.goods_type(goods.as_str());
        if wanted < 0 {
            let shortfall = u32::try_from(wanted.unsigned_abs()).unwrap_or(u32::MAX);
            if goods_type.is_some_and(|g| g.food) {
                warn!(colony = %self.id, shortfall, "famine");
                return Some(Notice::Famine {
                    colony: self.id,
                    shortfall,
                });
            }
            warn!(colony = %self.id, %goods, shortfall, "stock clamped at zero");
            return None;
        }

        let capacity = self.storage_capacity(rules);
        if goods_type.is_some_and(|g| g.storable) && amount > capacity {
            warn!(colony = %self.id, %goods, amount, capacity, "warehouse overflow");
            return Some(Notice::Overflow {
                colony: self.id,
                goods: goods.clone(),
                amount,
                capacity,
            });
        }
        None
    }

    /// Remove exactly `amount` of `goods`.
    pub fn remove_goods(&mut self, goods: &GoodsTypeId, amount: u32) -> Result<(), SimError> {
        let available = self.goods(goods.as_str());
        let left = available
            .checked_sub(amount)
            .ok_or_else(|| SimError::InsufficientGoods {
                goods: goods.clone(),
                required: amount,
                available,
            })?;
        self.stock.insert(goods.clone(), left);
        Ok(())
    }

    /// Consume the food needed for a new colonist, if the stock covers it.
    pub fn take_growth(&mut self, rules: &Ruleset) -> bool {
        let needed = rules.colony().food_to_grow;
        let Some(food) = rules.goods().iter().find(|g| g.food) else {
            return false;
        };
        let held = self.goods(food.id.as_str());
        if needed == 0 || held < needed {
            return false;
        }
        self.stock.insert(food.id.clone(), held.saturating_sub(needed));
        true
    }

    // -----------------------------------------------------------------------
    // Liberty
    // -----------------------------------------------------------------------

    /// Liberty figures recomputed from the stock, verified.
    pub fn liberty(&self, rules: &Ruleset) -> Result<Liberty, SimError> {
        let stock = rules
            .goods()
            .iter()
            .filter(|g| g.liberty)
            .fold(0_u32, |acc, g| acc.saturating_add(self.goods(g.id.as_str())));
        let liberty = Liberty::compute(stock, self.unit_count(), rules.colony().liberty_per_rebel);
        liberty.verify(self.id)?;
        Ok(liberty)
    }

    // -----------------------------------------------------------------------
    // Workers
    // -----------------------------------------------------------------------

    /// Work tiles by position.
    pub const fn work_tiles(&self) -> &BTreeMap<Position, WorkTile> {
        &self.work_tiles
    }

    /// Buildings by type.
    pub const fn buildings(&self) -> &BTreeMap<BuildingTypeId, Building> {
        &self.buildings
    }

    /// State of one building.
    pub fn building(&self, id: &str) -> Option<&Building> {
        self.buildings.get(id)
    }

    /// Current level of a building, 0 when not built or unknown.
    pub fn building_level(&self, id: &str) -> u32 {
        self.building(id).map_or(0, |b| b.level)
    }

    /// Every worker: tiles in position order, then buildings.
    pub fn workers(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.work_tiles
            .values()
            .filter_map(|t| t.worker)
            .chain(self.buildings.values().flat_map(|b| b.workers.iter().copied()))
    }

    /// Number of colonists working in the colony.
    pub fn unit_count(&self) -> u32 {
        u32::try_from(self.workers().count()).unwrap_or(u32::MAX)
    }

    /// Whether `unit` works in the colony.
    pub fn is_worker(&self, unit: UnitId) -> bool {
        self.workers().any(|w| w == unit)
    }

    /// Built buildings in ruleset order with their current level definition.
    pub fn built_levels<'r>(&'r self, rules: &'r Ruleset) -> impl Iterator<Item = (&'r BuildingType, &'r BuildingLevel)> + 'r {
        rules.buildings().iter().filter_map(move |b| {
            let level = self.building_level(b.id.as_str());
            b.level(level).map(|l| (b, l))
        })
    }

    /// Whether any built building grants `ability` at its current level.
    pub fn has_building_ability(&self, rules: &Ruleset, ability: Ability) -> bool {
        self.built_levels(rules)
            .any(|(_, level)| level.abilities.contains(&ability))
    }

    /// Best defence bonus of the colony's buildings (stockade and up).
    pub fn defence_pct(&self, rules: &Ruleset) -> Decimal {
        self.built_levels(rules)
            .map(|(_, level)| level.defence_pct)
            .max()
            .unwrap_or(Decimal::ZERO)
    }

    fn check_worker(&self, unit: &Unit, unit_type: &UnitType) -> Result<(), SimError> {
        if unit.owner() != self.owner {
            return Err(SimError::WrongOwner {
                unit: unit.id(),
                colony: self.id,
            });
        }
        if !unit_type.person {
            return Err(SimError::NotAPerson(unit.id()));
        }
        if !unit.is_active() {
            return Err(SimError::UnitNotActive(unit.id()));
        }
        Ok(())
    }

    /// Put `unit` to work on the tile at `position` producing `goods`.
    ///
    /// A unit already working elsewhere in the colony is moved.
    pub fn assign_to_tile(
        &mut self,
        rules: &Ruleset,
        map: &Map,
        unit: &Unit,
        position: Position,
        goods: &GoodsTypeId,
    ) -> Result<(), SimError> {
        let unit_type = unit.unit_type(rules)?;
        self.check_worker(unit, unit_type)?;
        let slot = self.work_tiles.get(&position).ok_or(SimError::UnknownWorkTile {
            colony: self.id,
            position,
        })?;
        if let Some(worker) = slot.worker
            && worker != unit.id()
        {
            return Err(SimError::TileOccupied { position, worker });
        }
        let tile = map.require(position)?;
        if tile.is_water(rules)? && !self.has_building_ability(rules, Ability::WorkWater) {
            return Err(SimError::NeedsWorkWater(position));
        }
        if tile.potential_production(rules, goods)? == 0 {
            return Err(SimError::CannotProduce {
                position,
                goods: goods.clone(),
            });
        }

        self.remove_worker(unit.id());
        if let Some(slot) = self.work_tiles.get_mut(&position) {
            slot.worker = Some(unit.id());
            slot.goods = Some(goods.clone());
        }
        debug!(colony = %self.id, unit = %unit.id(), %position, %goods, "assigned to tile");
        Ok(())
    }

    /// Put `unit` to work in `building`.
    pub fn assign_to_building(&mut self, rules: &Ruleset, unit: &Unit, building: &str) -> Result<(), SimError> {
        let unit_type = unit.unit_type(rules)?;
        self.check_worker(unit, unit_type)?;
        let building_type = rules.building(building).ok_or_else(|| unknown("building", building))?;
        let state = self
            .buildings
            .get(building)
            .ok_or_else(|| unknown("building", building))?;
        if !state.is_built() {
            return Err(SimError::BuildingNotBuilt(String::from(building)));
        }
        if state.workers.contains(&unit.id()) {
            return Ok(());
        }
        let occupied = u32::try_from(state.workers.len()).unwrap_or(u32::MAX);
        if occupied >= building_type.worker_slots {
            return Err(SimError::BuildingFull(String::from(building)));
        }

        self.remove_worker(unit.id());
        if let Some(state) = self.buildings.get_mut(building) {
            state.workers.push(unit.id());
        }
        debug!(colony = %self.id, unit = %unit.id(), building, "assigned to building");
        Ok(())
    }

    /// Take `unit` off whatever it works. Returns `false` if it worked nothing.
    pub fn remove_worker(&mut self, unit: UnitId) -> bool {
        for slot in self.work_tiles.values_mut() {
            if slot.worker == Some(unit) {
                slot.worker = None;
                slot.goods = None;
                return true;
            }
        }
        for state in self.buildings.values_mut() {
            if let Some(index) = state.workers.iter().position(|w| *w == unit) {
                state.workers.remove(index);
                return true;
            }
        }
        false
    }

    // -----------------------------------------------------------------------
    // Buildings
    // -----------------------------------------------------------------------

    /// Check that `building` can go up one level. Returns the new level.
    pub fn can_upgrade(&self, rules: &Ruleset, building: &str, factory_allowed: bool) -> Result<u32, SimError> {
        let building_type = rules.building(building).ok_or_else(|| unknown("building", building))?;
        let current = self.building_level(building);
        let next = current.saturating_add(1);
        let Some(level) = building_type.level(next) else {
            return Err(SimError::MaxLevel {
                building: String::from(building),
                level: current,
            });
        };
        if building_type.is_factory_level(next) && !factory_allowed {
            return Err(SimError::FactoryNotAllowed(String::from(building)));
        }
        let population = self.unit_count();
        if population < level.required_population {
            return Err(SimError::InsufficientPopulation {
                building: String::from(building),
                required: level.required_population,
                actual: population,
            });
        }
        Ok(next)
    }

    /// Raise `building` one level without paying for it.
    pub fn upgrade_building(&mut self, rules: &Ruleset, building: &str, factory_allowed: bool) -> Result<u32, SimError> {
        let next = self.can_upgrade(rules, building, factory_allowed)?;
        let state = self.buildings.entry(BuildingTypeId::new(building)).or_default();
        state.level = next;
        info!(colony = %self.id, building, level = next, "building upgraded");
        Ok(next)
    }

    /// Drop `building` one level. Workers lose their place when it falls to 0.
    ///
    /// Returns the displaced workers.
    pub fn downgrade_building(&mut self, building: &str) -> Result<Vec<UnitId>, SimError> {
        let state = self
            .buildings
            .get_mut(building)
            .ok_or_else(|| unknown("building", building))?;
        if !state.is_built() {
            return Err(SimError::BuildingNotBuilt(String::from(building)));
        }
        state.level = state.level.saturating_sub(1);
        let displaced = if state.is_built() {
            Vec::new()
        } else {
            std::mem::take(&mut state.workers)
        };
        info!(colony = %self.id, building, level = state.level, "building damaged");
        Ok(displaced)
    }

    /// Queued buildings, front first.
    pub const fn build_queue(&self) -> &VecDeque<BuildingTypeId> {
        &self.build_queue
    }

    /// Add a building to the back of the queue.
    pub fn queue_building(&mut self, building: BuildingTypeId) {
        self.build_queue.push_back(building);
    }

    /// Complete the front of the queue when hammers and tools cover it.
    ///
    /// A front entry that can no longer be built is dropped with a notice.
    pub fn process_build_queue(&mut self, rules: &Ruleset, factory_allowed: bool) -> Option<Notice> {
        let building = self.build_queue.front()?.clone();
        let next = match self.can_upgrade(rules, building.as_str(), factory_allowed) {
            Ok(next) => next,
            Err(err) => {
                self.build_queue.pop_front();
                warn!(colony = %self.id, %building, %err, "build rejected");
                return Some(Notice::BuildRejected {
                    colony: self.id,
                    building,
                    reason: err.to_string(),
                });
            }
        };
        let level = rules.building(building.as_str())?.level(next)?;
        let hammers = rules.colony().build_goods.clone();
        let tools = rules.colony().build_tools.clone();
        if self.goods(hammers.as_str()) < level.hammers || self.goods(tools.as_str()) < level.tools {
            return None;
        }
        let (cost_hammers, cost_tools) = (level.hammers, level.tools);
        // Covered above, so neither removal can fail.
        self.remove_goods(&hammers, cost_hammers).ok()?;
        self.remove_goods(&tools, cost_tools).ok()?;
        self.upgrade_building(rules, building.as_str(), factory_allowed).ok()?;
        self.build_queue.pop_front();
        Some(Notice::Built {
            colony: self.id,
            building,
            level: next,
        })
    }

    // -----------------------------------------------------------------------
    // Penalties and alarm
    // -----------------------------------------------------------------------

    /// Active production penalties.
    pub fn penalties(&self) -> &[ProductionPenalty] {
        &self.penalties
    }

    /// Add a production penalty.
    pub fn add_penalty(&mut self, percent: u32, turns: u32) {
        if turns > 0 {
            self.penalties.push(ProductionPenalty {
                percent: percent.min(100),
                turns_left: turns,
            });
        }
    }

    /// Total penalty in percent, capped at 100.
    pub fn penalty_pct(&self) -> u32 {
        self.penalties
            .iter()
            .fold(0_u32, |acc, p| acc.saturating_add(p.percent))
            .min(100)
    }

    /// Count every penalty down one turn, dropping expired ones.
    pub fn tick_penalties(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        let colony = self.id;
        self.penalties.retain_mut(|p| {
            p.turns_left = p.turns_left.saturating_sub(1);
            if p.turns_left == 0 {
                notices.push(Notice::PenaltyExpired {
                    colony,
                    percent: p.percent,
                });
                return false;
            }
            true
        });
        notices
    }

    /// Alarm toward `player`.
    pub fn alarm(&self, player: PlayerId) -> Tension {
        self.alarm.get(&player).copied().unwrap_or_default()
    }

    /// Mutable alarm toward `player`.
    pub fn alarm_mut(&mut self, player: PlayerId) -> &mut Tension {
        self.alarm.entry(player).or_default()
    }

    /// Decay every alarm value toward zero.
    pub fn decay_alarm(&mut self, amount: i32) {
        for tension in self.alarm.values_mut() {
            tension.decay(amount);
        }
    }

    // -----------------------------------------------------------------------
    // Equipment
    // -----------------------------------------------------------------------

    /// Give `unit` the equipment for `role` from the stock.
    ///
    /// The goods of the unit's current role go back to the stock first. The
    /// change is all-or-nothing.
    pub fn equip(&mut self, rules: &Ruleset, unit: &mut Unit, role: UnitRole) -> Result<(), SimError> {
        let unit_type = unit.unit_type(rules)?;
        if !matches!(role, UnitRole::Default) && !unit_type.has(Ability::CanBeEquipped) {
            return Err(SimError::CannotEquip { unit: unit.id(), role });
        }
        let wanted = rules.role(role).ok_or(SimError::UnknownRole(role))?;
        let returned = rules
            .role(unit.role())
            .map(|r| r.required_goods.clone())
            .unwrap_or_default();

        for (goods, required) in &wanted.required_goods {
            let available = self
                .goods(goods.as_str())
                .saturating_add(returned.get(goods).copied().unwrap_or(0));
            if available < *required {
                return Err(SimError::InsufficientGoods {
                    goods: goods.clone(),
                    required: *required,
                    available,
                });
            }
        }

        for (goods, amount) in &returned {
            let held = self.stock.entry(goods.clone()).or_insert(0);
            *held = held.saturating_add(*amount);
        }
        for (goods, amount) in &wanted.required_goods {
            let held = self.stock.entry(goods.clone()).or_insert(0);
            *held = held.saturating_sub(*amount);
        }
        debug!(colony = %self.id, unit = %unit.id(), role = role.key(), "unit equipped");
        unit.set_role(role);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use colonia_rules::ruleset::ColonyRules;
    use colonia_types::{TileTypeId, UnitTypeId};

    use super::*;
    use crate::unit::UnitLocation;

    const OWNER: PlayerId = PlayerId(0);

    fn setup() -> (Ruleset, Map, Colony) {
        let rules = Ruleset::classic().unwrap();
        let mut map = Map::new(6, 6, &TileTypeId::new("plains")).unwrap();
        map.set_tile_type(Position::new(3, 2), TileTypeId::new("ocean")).unwrap();
        let colony = Colony::new(ColonyId::new(0), OWNER, "Jamestown", Position::new(2, 2), &rules, &map);
        (rules, map, colony)
    }

    fn colonist(id: u32, kind: &str) -> Unit {
        Unit::new(
            UnitId::new(id),
            OWNER,
            UnitTypeId::new(kind),
            UnitLocation::Colony(ColonyId::new(0)),
        )
    }

    #[test]
    fn new_colony_has_work_ring_and_initial_buildings() {
        let (_, _, colony) = setup();
        assert_eq!(colony.work_tiles().len(), 8);
        assert_eq!(colony.building_level("town_hall"), 1);
        assert_eq!(colony.building_level("stockade"), 0);
        assert_eq!(colony.unit_count(), 0);
    }

    #[test]
    fn stock_clamps_and_reports() {
        let (rules, _, mut colony) = setup();
        let food = GoodsTypeId::new("food");
        assert_eq!(colony.add_goods(&rules, &food, 10), None);
        assert_eq!(
            colony.add_goods(&rules, &food, -25),
            Some(Notice::Famine {
                colony: ColonyId::new(0),
                shortfall: 15
            })
        );
        assert_eq!(colony.goods("food"), 0);

        let furs = GoodsTypeId::new("furs");
        assert!(matches!(
            colony.add_goods(&rules, &furs, 140),
            Some(Notice::Overflow { amount: 140, capacity: 100, .. })
        ));
        // Nothing is discarded.
        assert_eq!(colony.goods("furs"), 140);
        // Non-storable goods never overflow.
        assert_eq!(colony.add_goods(&rules, &GoodsTypeId::new("hammers"), 500), None);
    }

    #[test]
    fn tile_assignment_preconditions() {
        let (rules, map, mut colony) = setup();
        let farmer = colonist(1, "expert_farmer");
        let other = colonist(2, "free_colonist");
        let food = GoodsTypeId::new("food");

        colony.assign_to_tile(&rules, &map, &farmer, Position::new(1, 1), &food).unwrap();
        assert!(matches!(
            colony.assign_to_tile(&rules, &map, &other, Position::new(1, 1), &food),
            Err(SimError::TileOccupied { .. })
        ));
        assert!(matches!(
            colony.assign_to_tile(&rules, &map, &other, Position::new(5, 5), &food),
            Err(SimError::UnknownWorkTile { .. })
        ));
        assert!(matches!(
            colony.assign_to_tile(&rules, &map, &other, Position::new(3, 2), &food),
            Err(SimError::NeedsWorkWater(_))
        ));
        assert!(matches!(
            colony.assign_to_tile(&rules, &map, &other, Position::new(1, 2), &GoodsTypeId::new("silver")),
            Err(SimError::CannotProduce { .. })
        ));
        let ship = colonist(3, "caravel");
        assert!(matches!(
            colony.assign_to_tile(&rules, &map, &ship, Position::new(1, 2), &food),
            Err(SimError::NotAPerson(_))
        ));
        assert_eq!(colony.unit_count(), 1);
    }

    #[test]
    fn docks_open_water_tiles() {
        let (rules, map, mut colony) = setup();
        let fisher = colonist(1, "free_colonist");
        colony.assign_to_building(&rules, &fisher, "town_hall").unwrap();
        colony.upgrade_building(&rules, "docks", false).unwrap();
        colony
            .assign_to_tile(&rules, &map, &fisher, Position::new(3, 2), &GoodsTypeId::new("food"))
            .unwrap();
        // Moved from the town hall, not duplicated.
        assert_eq!(colony.unit_count(), 1);
        assert!(colony.building("town_hall").unwrap().workers.is_empty());
    }

    #[test]
    fn buildings_have_limited_slots() {
        let (rules, _, mut colony) = setup();
        for id in 1..=3 {
            colony.assign_to_building(&rules, &colonist(id, "free_colonist"), "carpenter_house").unwrap();
        }
        assert!(matches!(
            colony.assign_to_building(&rules, &colonist(4, "free_colonist"), "carpenter_house"),
            Err(SimError::BuildingFull(_))
        ));
        assert!(matches!(
            colony.assign_to_building(&rules, &colonist(4, "free_colonist"), "armory"),
            Err(SimError::BuildingNotBuilt(_))
        ));
        assert!(colony.remove_worker(UnitId::new(2)));
        assert!(!colony.remove_worker(UnitId::new(2)));
        assert_eq!(colony.unit_count(), 2);
    }

    #[test]
    fn upgrades_respect_population_and_factory() {
        let (rules, _, mut colony) = setup();
        assert!(matches!(
            colony.upgrade_building(&rules, "blacksmith_house", false),
            Err(SimError::InsufficientPopulation { required: 4, actual: 0, .. })
        ));
        for id in 1..=8 {
            let unit = colonist(id, "free_colonist");
            let building = if id <= 3 { "carpenter_house" } else if id <= 6 { "town_hall" } else { "weaver_house" };
            colony.assign_to_building(&rules, &unit, building).unwrap();
        }
        assert_eq!(colony.upgrade_building(&rules, "blacksmith_house", false).unwrap(), 2);
        assert!(matches!(
            colony.upgrade_building(&rules, "blacksmith_house", false),
            Err(SimError::FactoryNotAllowed(_))
        ));
        assert_eq!(colony.upgrade_building(&rules, "blacksmith_house", true).unwrap(), 3);
        assert!(matches!(
            colony.upgrade_building(&rules, "blacksmith_house", true),
            Err(SimError::MaxLevel { level: 3, .. })
        ));
    }

    #[test]
    fn losing_the_last_level_displaces_workers() {
        let (rules, _, mut colony) = setup();
        colony.assign_to_building(&rules, &colonist(1, "free_colonist"), "weaver_house").unwrap();
        let displaced = colony.downgrade_building("weaver_house").unwrap();
        assert_eq!(displaced, vec![UnitId::new(1)]);
        assert_eq!(colony.unit_count(), 0);
        assert!(matches!(
            colony.downgrade_building("weaver_house"),
            Err(SimError::BuildingNotBuilt(_))
        ));
    }

    #[test]
    fn build_queue_waits_builds_and_rejects() {
        let (rules, _, mut colony) = setup();
        colony.assign_to_building(&rules, &colonist(1, "free_colonist"), "carpenter_house").unwrap();
        colony.queue_building(BuildingTypeId::new("docks"));
        colony.queue_building(BuildingTypeId::new("stockade"));

        assert_eq!(colony.process_build_queue(&rules, false), None);
        colony.add_goods(&rules, &GoodsTypeId::new("hammers"), 60);
        assert!(matches!(
            colony.process_build_queue(&rules, false),
            Some(Notice::Built { level: 1, .. })
        ));
        assert_eq!(colony.goods("hammers"), 8);
        assert_eq!(colony.building_level("docks"), 1);

        // The stockade needs three colonists.
        assert!(matches!(
            colony.process_build_queue(&rules, false),
            Some(Notice::BuildRejected { .. })
        ));
        assert!(colony.build_queue().is_empty());
    }

    #[test]
    fn build_queue_pays_in_the_ruleset_build_goods() {
        let (rules, _, mut colony) = setup();
        let colony_rules = ColonyRules {
            build_goods: GoodsTypeId::new("lumber"),
            ..rules.colony().clone()
        };
        let rules = rules.with_colony_rules(colony_rules);
        colony.assign_to_building(&rules, &colonist(1, "free_colonist"), "carpenter_house").unwrap();
        colony.queue_building(BuildingTypeId::new("docks"));

        colony.add_goods(&rules, &GoodsTypeId::new("hammers"), 60);
        assert_eq!(colony.process_build_queue(&rules, false), None);
        colony.add_goods(&rules, &GoodsTypeId::new("lumber"), 60);
        assert!(matches!(
            colony.process_build_queue(&rules, false),
            Some(Notice::Built { level: 1, .. })
        ));
        assert_eq!(colony.goods("lumber"), 8);
        assert_eq!(colony.goods("hammers"), 60);
    }

    #[test]
    fn penalties_expire() {
        let (_, _, mut colony) = setup();
        colony.add_penalty(50, 2);
        colony.add_penalty(70, 1);
        assert_eq!(colony.penalty_pct(), 100);
        assert_eq!(colony.tick_penalties().len(), 1);
        assert_eq!(colony.penalty_pct(), 50);
        assert_eq!(colony.tick_penalties().len(), 1);
        assert_eq!(colony.penalty_pct(), 0);
    }

    #[test]
    fn equipping_is_all_or_nothing() {
        let (rules, _, mut colony) = setup();
        let mut unit = colonist(1, "free_colonist");
        colony.add_goods(&rules, &GoodsTypeId::new("muskets"), 60);
        colony.add_goods(&rules, &GoodsTypeId::new("horses"), 30);

        colony.equip(&rules, &mut unit, UnitRole::Soldier).unwrap();
        assert_eq!(colony.goods("muskets"), 10);

        // Dragoons need 50 horses; the muskets would be returned and reused.
        assert!(matches!(
            colony.equip(&rules, &mut unit, UnitRole::Dragoon),
            Err(SimError::InsufficientGoods { .. })
        ));
        assert_eq!(unit.role(), UnitRole::Soldier);
        assert_eq!(colony.goods("muskets"), 10);

        colony.add_goods(&rules, &GoodsTypeId::new("horses"), 20);
        colony.equip(&rules, &mut unit, UnitRole::Dragoon).unwrap();
        assert_eq!(colony.goods("muskets"), 10);
        assert_eq!(colony.goods("horses"), 0);

        colony.equip(&rules, &mut unit, UnitRole::Default).unwrap();
        assert_eq!(colony.goods("muskets"), 60);
        assert_eq!(colony.goods("horses"), 50);
    }

    #[test]
    fn ships_cannot_be_equipped() {
        let (rules, _, mut colony) = setup();
        let mut ship = colonist(9, "caravel");
        assert!(matches!(
            colony.equip(&rules, &mut ship, UnitRole::Soldier),
            Err(SimError::CannotEquip { .. })
        ));
    }

    #[test]
    fn growth_consumes_food() {
        let (rules, _, mut colony) = setup();
        colony.add_goods(&rules, &GoodsTypeId::new("food"), 230);
        assert!(colony.take_growth(&rules));
        assert_eq!(colony.goods("food"), 30);
        assert!(!colony.take_growth(&rules));
    }
}
