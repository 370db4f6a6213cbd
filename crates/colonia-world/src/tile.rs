//! A single map cell: fixed terrain type plus mutable overlay state.
//!
//! # Forest and additions
//!
//! Forest and additions (hills, mountains) are two separate fields guarded
//! by an exclusivity rule with one deliberate asymmetry:
//!
//! - planting a forest (`set_forested(true)`) removes any addition;
//! - raising an addition (`set_addition(Hills | Mountains)`) removes any forest;
//! - clearing a forest (`set_forested(false)`) leaves the addition alone.
//!
//! Additions therefore survive deforestation, and only reforestation can
//! take them away again.
//!
//! # Roads and rivers
//!
//! Roads and rivers carry a directional style written as a digit string:
//! eight `0|1` digits for a road (one per [`Direction::ALL`] entry) and
//! four `0|1|2` digits for a river (one per [`Direction::LONGSIDES`] entry,
//! the digit being the river's magnitude on that side).

use std::collections::BTreeSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use colonia_rules::Ruleset;
use colonia_rules::ruleset::TileType;
use colonia_types::{
    ColonyId, GoodsTypeId, ImprovementAction, PlayerId, ResourceTypeId, TileAddition, TileTypeId,
};

use crate::error::WorldError;
use crate::position::{Direction, Position};

// ---------------------------------------------------------------------------
// Improvement styles
// ---------------------------------------------------------------------------

/// Road connections toward each of the eight neighbours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoadStyle([bool; 8]);

impl RoadStyle {
    /// Whether the road connects toward `direction`.
    pub fn connects(&self, direction: Direction) -> bool {
        self.0.get(direction.index()).copied().unwrap_or(false)
    }

    /// Connect the road toward `direction`.
    pub fn connect(&mut self, direction: Direction) {
        if let Some(slot) = self.0.get_mut(direction.index()) {
            *slot = true;
        }
    }

    /// Whether the road connects anywhere.
    pub fn is_isolated(&self) -> bool {
        !self.0.contains(&true)
    }
}

impl FromStr for RoadStyle {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| WorldError::InvalidStyle {
            style: String::from(s),
            reason,
        };
        if s.len() != 8 {
            return Err(invalid("a road style has 8 digits"));
        }
        let mut style = Self::default();
        for (slot, digit) in style.0.iter_mut().zip(s.chars()) {
            *slot = match digit {
                '0' => false,
                '1' => true,
                _ => return Err(invalid("road digits are 0 or 1")),
            };
        }
        Ok(style)
    }
}

impl TryFrom<String> for RoadStyle {
    type Error = WorldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoadStyle> for String {
    fn from(style: RoadStyle) -> Self {
        style.0.iter().map(|on| if *on { '1' } else { '0' }).collect()
    }
}

/// River magnitude on each of the four sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RiverStyle([u8; 4]);

impl RiverStyle {
    /// Largest river magnitude.
    pub const MAX_MAGNITUDE: u8 = 2;

    /// River magnitude toward `direction`; diagonals are always 0.
    pub fn magnitude(&self, direction: Direction) -> u8 {
        direction
            .longside_index()
            .and_then(|slot| self.0.get(slot).copied())
            .unwrap_or(0)
    }

    /// Whether the river flows toward `direction`.
    pub fn flows(&self, direction: Direction) -> bool {
        self.magnitude(direction) > 0
    }
}

impl FromStr for RiverStyle {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| WorldError::InvalidStyle {
            style: String::from(s),
            reason,
        };
        if s.len() != 4 {
            return Err(invalid("a river style has 4 digits"));
        }
        let mut style = Self::default();
        for (slot, digit) in style.0.iter_mut().zip(s.chars()) {
            *slot = digit
                .to_digit(10)
                .and_then(|d| u8::try_from(d).ok())
                .filter(|d| *d <= Self::MAX_MAGNITUDE)
                .ok_or_else(|| invalid("river digits are 0, 1 or 2"))?;
        }
        Ok(style)
    }
}

impl TryFrom<String> for RiverStyle {
    type Error = WorldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RiverStyle> for String {
    fn from(style: RiverStyle) -> Self {
        style
            .0
            .iter()
            .map(|m| char::from(b'0'.saturating_add(*m)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// One map cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    position: Position,
    type_id: TileTypeId,
    forested: bool,
    addition: TileAddition,
    resource: Option<ResourceTypeId>,
    plowed: bool,
    road: Option<RoadStyle>,
    river: Option<RiverStyle>,
    explored_by: BTreeSet<PlayerId>,
    settlement: Option<ColonyId>,
}

impl Tile {
    /// A bare, cleared, unexplored tile.
    pub const fn new(position: Position, type_id: TileTypeId) -> Self {
        Self {
            position,
            type_id,
            forested: false,
            addition: TileAddition::None,
            resource: None,
            plowed: false,
            road: None,
            river: None,
            explored_by: BTreeSet::new(),
            settlement: None,
        }
    }

    /// Position on the map.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Terrain type key.
    pub const fn type_id(&self) -> &TileTypeId {
        &self.type_id
    }

    /// Terrain type definition.
    pub fn tile_type<'r>(&self, rules: &'r Ruleset) -> Result<&'r TileType, WorldError> {
        rules
            .tile_type(self.type_id.as_str())
            .ok_or_else(|| WorldError::UnknownTileType(self.type_id.to_string()))
    }

    /// Whether the tile carries a forest.
    pub const fn is_forested(&self) -> bool {
        self.forested
    }

    /// Current addition.
    pub const fn addition(&self) -> TileAddition {
        self.addition
    }

    /// Plant or clear the forest.
    ///
    /// Planting removes any addition and any plowing; clearing leaves the
    /// addition untouched.
    pub const fn set_forested(&mut self, forested: bool) {
        if forested {
            self.addition = TileAddition::None;
            self.plowed = false;
        }
        self.forested = forested;
    }

    /// Raise or remove hills or mountains.
    ///
    /// Raising an addition removes any forest and any plowing.
    pub const fn set_addition(&mut self, addition: TileAddition) {
        if !matches!(addition, TileAddition::None) {
            self.forested = false;
            self.plowed = false;
        }
        self.addition = addition;
    }

    /// Special resource on the tile.
    pub const fn resource(&self) -> Option<&ResourceTypeId> {
        self.resource.as_ref()
    }

    /// Place or remove a special resource.
    pub fn set_resource(&mut self, resource: Option<ResourceTypeId>) {
        self.resource = resource;
    }

    /// Whether the tile has been plowed.
    pub const fn is_plowed(&self) -> bool {
        self.plowed
    }

    /// Road style, when the tile has a road.
    pub const fn road(&self) -> Option<&RoadStyle> {
        self.road.as_ref()
    }

    /// Whether the tile has a road. Settlements count as roads.
    pub const fn has_road(&self) -> bool {
        self.road.is_some() || self.settlement.is_some()
    }

    /// Connect the tile's road toward `direction`.
    ///
    /// Does nothing when the tile has no road.
    pub fn connect_road(&mut self, direction: Direction) {
        if let Some(road) = &mut self.road {
            road.connect(direction);
        }
    }

    /// River style, when a river crosses the tile.
    pub const fn river(&self) -> Option<&RiverStyle> {
        self.river.as_ref()
    }

    /// Place or remove a river.
    pub const fn set_river(&mut self, river: Option<RiverStyle>) {
        self.river = river;
    }

    /// Whether the tile is water.
    pub fn is_water(&self, rules: &Ruleset) -> Result<bool, WorldError> {
        Ok(self.tile_type(rules)?.water)
    }

    /// Settlement standing on the tile.
    pub const fn settlement(&self) -> Option<ColonyId> {
        self.settlement
    }

    /// Place or remove a settlement.
    pub const fn set_settlement(&mut self, settlement: Option<ColonyId>) {
        self.settlement = settlement;
    }

    /// Whether `player` has explored the tile.
    pub fn is_explored_by(&self, player: PlayerId) -> bool {
        self.explored_by.contains(&player)
    }

    /// Mark the tile explored by `player`. Returns `true` when newly explored.
    pub fn explore(&mut self, player: PlayerId) -> bool {
        self.explored_by.insert(player)
    }

    // -----------------------------------------------------------------------
    // Terrain queries
    // -----------------------------------------------------------------------

    /// Movement cost of entering the tile, before roads and rivers.
    pub fn base_move_cost(&self, rules: &Ruleset) -> Result<u32, WorldError> {
        if let Some(addition) = rules.addition(self.addition) {
            return Ok(addition.move_cost);
        }
        Ok(self.tile_type(rules)?.move_cost(self.forested))
    }

    /// Defence bonus in percent for a unit standing on the tile.
    pub fn defence_pct(&self, rules: &Ruleset) -> Result<Decimal, WorldError> {
        if let Some(addition) = rules.addition(self.addition) {
            return Ok(addition.defence_pct);
        }
        Ok(self.tile_type(rules)?.defence_pct(self.forested))
    }

    /// Turns of pioneer work needed for `action`, `None` when not allowed.
    ///
    /// Water tiles allow nothing; a plowed cleared tile cannot be plowed
    /// again; a tile with a road cannot get another. Additions replace the
    /// terrain's work category, forested tiles use the category's forested
    /// row.
    pub fn work_amount(&self, rules: &Ruleset, action: ImprovementAction) -> Result<Option<u32>, WorldError> {
        let tile_type = self.tile_type(rules)?;
        if tile_type.water {
            return Ok(None);
        }
        match action {
            ImprovementAction::Plow if self.plowed && !self.forested => return Ok(None),
            ImprovementAction::Road if self.road.is_some() => return Ok(None),
            ImprovementAction::Plow | ImprovementAction::Road => {}
        }
        if let Some(addition) = rules.addition(self.addition) {
            return Ok(addition.work.for_action(action));
        }
        let Some(category) = tile_type
            .work_category
            .as_deref()
            .and_then(|key| rules.work_categories().get(key))
        else {
            return Ok(None);
        };
        let row = if self.forested {
            &category.forested
        } else {
            &category.cleared
        };
        Ok(row.for_action(action))
    }

    /// Complete an improvement.
    ///
    /// Plowing a forested tile clears the forest (leaving any addition
    /// alone); plowing a cleared tile plows it. A road starts unconnected.
    pub fn apply_improvement(&mut self, rules: &Ruleset, action: ImprovementAction) -> Result<(), WorldError> {
        if self.work_amount(rules, action)?.is_none() {
            return Err(WorldError::ImprovementNotAllowed {
                action,
                position: self.position,
            });
        }
        match action {
            ImprovementAction::Plow if self.forested => self.set_forested(false),
            ImprovementAction::Plow => self.plowed = true,
            ImprovementAction::Road => self.road = Some(RoadStyle::default()),
        }
        Ok(())
    }

    /// Production of `goods` by one worker on this tile, before expert and
    /// colony-wide modifiers.
    ///
    /// Tiles that do not yield the goods at all get no bonuses either.
    pub fn potential_production(&self, rules: &Ruleset, goods: &GoodsTypeId) -> Result<u32, WorldError> {
        let base = match rules.addition(self.addition) {
            Some(addition) => addition.production.get(goods).copied(),
            None => self.tile_type(rules)?.production(self.forested).get(goods).copied(),
        };
        let Some(base) = base.filter(|amount| *amount > 0) else {
            return Ok(0);
        };

        let mut amount = base;
        if let Some(bonus) = self
            .resource
            .as_ref()
            .and_then(|id| rules.resource(id.as_str()))
            .and_then(|resource| resource.bonuses.get(goods))
        {
            amount = amount.saturating_add(*bonus);
        }
        let farmed = rules.goods_type(goods.as_str()).is_some_and(|g| g.farmed);
        if self.plowed && !self.forested && farmed {
            let bonus = rules
                .improvement(ImprovementAction::Plow)
                .map_or(0, |plow| plow.farmed_bonus);
            amount = amount.saturating_add(bonus);
        }
        if self.river.is_some() {
            amount = amount.saturating_add(rules.colony().river_bonus);
        }
        Ok(amount)
    }
}
