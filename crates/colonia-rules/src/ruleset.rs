//! The ruleset: every type definition and tuning constant of a game.
//!
//! A ruleset is loaded from YAML once at startup, validated, and then never
//! mutated again. The simulation shares it behind an `Arc` and only ever
//! reads from it. Lookups go through ordered indices keyed by the typed ids
//! in `colonia-types`; sections also keep their entries in file order,
//! which is the order the simulation iterates them in (buildings in
//! particular are processed in ruleset order).

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use colonia_types::{
    Ability, BuildingTypeId, DisasterId, EffectId, GoodsTypeId, ImprovementAction, ResourceTypeId,
    TileAddition, TileTypeId, UnitRole, UnitTypeId,
};

use crate::error::RulesError;
use crate::modifier::Modifier;
use crate::random::RandomRange;
use crate::scope::{Scope, ScopeProperty, ScopeSubject};
use crate::validation;

/// Bundled classic ruleset.
const CLASSIC_RULES: &str = include_str!("../rules/classic.yaml");

// ---------------------------------------------------------------------------
// Global options
// ---------------------------------------------------------------------------

/// What a unit does when a step costs more than the moves it has left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallPolicy {
    /// Spend whatever is left, if anything is left.
    #[default]
    Clamp,
    /// Spend what is left only when the unit is close enough to afford the
    /// step, or is entering a settlement.
    Lenient,
    /// Never move short; wait for the next turn.
    Strict,
}

/// Game-wide switches and thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Chance in percent per colony per turn that a natural disaster is rolled.
    #[serde(default = "default_natural_disaster_pct")]
    pub natural_disaster_pct: u32,

    /// Tension removed from every relationship each turn.
    #[serde(default = "default_tension_decay")]
    pub tension_decay: i32,

    /// Default movement shortfall policy.
    #[serde(default)]
    pub shortfall_policy: ShortfallPolicy,

    /// Tory count above which a colony suffers a production penalty of 1.
    #[serde(default = "default_bad_government_limit")]
    pub bad_government_limit: u32,

    /// Tory count above which the penalty becomes 2.
    #[serde(default = "default_very_bad_government_limit")]
    pub very_bad_government_limit: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            natural_disaster_pct: default_natural_disaster_pct(),
            tension_decay: default_tension_decay(),
            shortfall_policy: ShortfallPolicy::default(),
            bad_government_limit: default_bad_government_limit(),
            very_bad_government_limit: default_very_bad_government_limit(),
        }
    }
}

/// Colony tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColonyRules {
    /// Liberty needed per colonist to reach 100% SoL.
    #[serde(default = "default_liberty_per_rebel")]
    pub liberty_per_rebel: u32,

    /// Food stock at which a new colonist is born.
    #[serde(default = "default_food_to_grow")]
    pub food_to_grow: u32,

    /// Food eaten by each colonist per turn.
    #[serde(default = "default_food_consumption")]
    pub food_consumption: u32,

    /// Warehouse capacity per storable goods type without any warehouse.
    #[serde(default = "default_base_storage")]
    pub base_storage: u32,

    /// Sight radius of a colony.
    #[serde(default = "default_line_of_sight")]
    pub line_of_sight: u32,

    /// Extra production on a tile with a river, for goods the tile yields.
    #[serde(default = "default_river_bonus")]
    pub river_bonus: u32,

    /// Unit type of colonists born from food surplus.
    #[serde(default = "default_born_unit")]
    pub born_unit: UnitTypeId,

    /// Goods spent to raise a building level.
    #[serde(default = "default_build_goods")]
    pub build_goods: GoodsTypeId,

    /// Goods spent alongside `build_goods` on advanced levels.
    #[serde(default = "default_build_tools")]
    pub build_tools: GoodsTypeId,

    /// Optional random harvest bonus added to food production.
    #[serde(default)]
    pub harvest_bonus: Option<RandomRange>,
}

impl Default for ColonyRules {
    fn default() -> Self {
        Self {
            liberty_per_rebel: default_liberty_per_rebel(),
            food_to_grow: default_food_to_grow(),
            food_consumption: default_food_consumption(),
            base_storage: default_base_storage(),
            line_of_sight: default_line_of_sight(),
            river_bonus: default_river_bonus(),
            born_unit: default_born_unit(),
            build_goods: default_build_goods(),
            build_tools: default_build_tools(),
            harvest_bonus: None,
        }
    }
}

/// Combat tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRules {
    /// Percentage bonus for the attacker in land combat.
    #[serde(default = "default_attack_bonus_pct")]
    pub attack_bonus_pct: Decimal,

    /// Percentage bonus for a fortified defender.
    #[serde(default = "default_fortify_bonus_pct")]
    pub fortify_bonus_pct: Decimal,

    /// Percentage applied to artillery fighting outside a colony.
    #[serde(default = "default_artillery_in_the_open_pct")]
    pub artillery_in_the_open_pct: Decimal,

    /// Percentage applied to a ship's offence and defence per 100 goods carried.
    #[serde(default = "default_cargo_penalty_pct")]
    pub cargo_penalty_pct: Decimal,

    /// Weight of an ordinary consequence in the secondary table.
    #[serde(default = "default_normal_result_weight")]
    pub normal_result_weight: u32,

    /// Weight of a great consequence in the secondary table.
    #[serde(default = "default_great_result_weight")]
    pub great_result_weight: u32,

    /// Turns a damaged ship spends under repair.
    #[serde(default = "default_ship_repair_turns")]
    pub ship_repair_turns: u32,

    /// Tension added to the defender's owner toward the attacker's owner.
    #[serde(default = "default_tension_on_attack")]
    pub tension_on_attack: i32,

    /// Extra tension when the defender's unit is destroyed.
    #[serde(default = "default_tension_on_unit_destroyed")]
    pub tension_on_unit_destroyed: i32,

    /// Alarm added to a colony whose defender was attacked.
    #[serde(default = "default_alarm_on_colony_attacked")]
    pub alarm_on_colony_attacked: i32,

    /// Gold plundered when a colony is captured.
    #[serde(default)]
    pub plunder: Option<RandomRange>,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            attack_bonus_pct: default_attack_bonus_pct(),
            fortify_bonus_pct: default_fortify_bonus_pct(),
            artillery_in_the_open_pct: default_artillery_in_the_open_pct(),
            cargo_penalty_pct: default_cargo_penalty_pct(),
            normal_result_weight: default_normal_result_weight(),
            great_result_weight: default_great_result_weight(),
            ship_repair_turns: default_ship_repair_turns(),
            tension_on_attack: default_tension_on_attack(),
            tension_on_unit_destroyed: default_tension_on_unit_destroyed(),
            alarm_on_colony_attacked: default_alarm_on_colony_attacked(),
            plunder: None,
        }
    }
}

/// Movement tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRules {
    /// Movement points in one whole move.
    #[serde(default = "default_points_per_move")]
    pub points_per_move: u32,

    /// Cost of a step along a road.
    #[serde(default = "default_road_cost")]
    pub road_cost: u32,

    /// Cost of a step along a river.
    #[serde(default = "default_river_cost")]
    pub river_cost: u32,

    /// Slack used by the lenient shortfall policy.
    #[serde(default = "default_lenient_margin")]
    pub lenient_margin: u32,
}

impl Default for MovementRules {
    fn default() -> Self {
        Self {
            points_per_move: default_points_per_move(),
            road_cost: default_road_cost(),
            river_cost: default_river_cost(),
            lenient_margin: default_lenient_margin(),
        }
    }
}

// ---------------------------------------------------------------------------
// Type definitions
// ---------------------------------------------------------------------------

/// A kind of goods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsType {
    /// Key.
    pub id: GoodsTypeId,
    /// Produced by working land; receives the plow bonus.
    #[serde(default)]
    pub farmed: bool,
    /// Eaten by colonists.
    #[serde(default)]
    pub food: bool,
    /// Counts toward liberty.
    #[serde(default)]
    pub liberty: bool,
    /// Kept in the warehouse and subject to its capacity.
    #[serde(default = "default_true")]
    pub storable: bool,
}

/// Turns of pioneer work for each improvement action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCost {
    /// Turns to plow (or clear the forest).
    #[serde(default)]
    pub plow: Option<u32>,
    /// Turns to build a road.
    #[serde(default)]
    pub road: Option<u32>,
}

impl WorkCost {
    /// Cost of `action`, `None` when the action is not allowed.
    pub const fn for_action(&self, action: ImprovementAction) -> Option<u32> {
        match action {
            ImprovementAction::Plow => self.plow,
            ImprovementAction::Road => self.road,
        }
    }
}

/// Improvement costs shared by a family of terrain types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCategory {
    /// Key, referenced by tile types.
    pub id: String,
    /// Costs on a cleared tile.
    pub cleared: WorkCost,
    /// Costs on a forested tile.
    pub forested: WorkCost,
}

/// Weighted reference from a tile type to a disaster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisasterChoice {
    /// The disaster.
    pub disaster: DisasterId,
    /// Relative weight.
    pub probability: u32,
}

/// A terrain type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileType {
    /// Key.
    pub id: TileTypeId,
    /// Ocean, lake and similar.
    #[serde(default)]
    pub water: bool,
    /// Whether the tile can carry a forest.
    #[serde(default = "default_true")]
    pub forestable: bool,
    /// Work category for improvement costs; water tiles have none.
    #[serde(default)]
    pub work_category: Option<String>,
    /// Movement cost when cleared.
    pub move_cost: u32,
    /// Movement cost when forested.
    #[serde(default)]
    pub forest_move_cost: Option<u32>,
    /// Defence bonus in percent when cleared.
    #[serde(default)]
    pub defence_pct: Decimal,
    /// Defence bonus in percent when forested.
    #[serde(default)]
    pub forest_defence_pct: Decimal,
    /// Production per worker when cleared.
    #[serde(default)]
    pub production: BTreeMap<GoodsTypeId, u32>,
    /// Production per worker when forested.
    #[serde(default)]
    pub forest_production: BTreeMap<GoodsTypeId, u32>,
    /// Goods a colony centre on this tile yields.
    #[serde(default)]
    pub centre_goods: Vec<GoodsTypeId>,
    /// Disasters that can strike a colony built here.
    #[serde(default)]
    pub disasters: Vec<DisasterChoice>,
}

impl TileType {
    /// Movement cost for the given forest state.
    pub fn move_cost(&self, forested: bool) -> u32 {
        if forested {
            self.forest_move_cost.unwrap_or(self.move_cost)
        } else {
            self.move_cost
        }
    }

    /// Defence bonus for the given forest state.
    pub const fn defence_pct(&self, forested: bool) -> Decimal {
        if forested {
            self.forest_defence_pct
        } else {
            self.defence_pct
        }
    }

    /// Production table for the given forest state.
    pub const fn production(&self, forested: bool) -> &BTreeMap<GoodsTypeId, u32> {
        if forested {
            &self.forest_production
        } else {
            &self.production
        }
    }
}

/// Hills or mountains overlaid on a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionType {
    /// Which addition this defines.
    pub addition: TileAddition,
    /// Movement cost, replacing the terrain's.
    pub move_cost: u32,
    /// Defence bonus in percent, replacing the terrain's.
    #[serde(default)]
    pub defence_pct: Decimal,
    /// Improvement costs, replacing the terrain's.
    #[serde(default)]
    pub work: WorkCost,
    /// Production per worker, replacing the terrain's.
    #[serde(default)]
    pub production: BTreeMap<GoodsTypeId, u32>,
}

/// A pioneer improvement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprovementType {
    /// Which action this defines.
    pub action: ImprovementAction,
    /// Goods consumed from the pioneer's equipment.
    #[serde(default)]
    pub expended_amount: u32,
    /// Extra production of farmed goods once complete.
    #[serde(default)]
    pub farmed_bonus: u32,
}

/// A special tile resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceType {
    /// Key.
    pub id: ResourceTypeId,
    /// Extra production per goods type.
    #[serde(default)]
    pub bonuses: BTreeMap<GoodsTypeId, u32>,
}

/// A unit type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitType {
    /// Key.
    pub id: UnitTypeId,
    /// Base offence.
    #[serde(default)]
    pub offence: u32,
    /// Base defence.
    #[serde(default = "default_defence")]
    pub defence: u32,
    /// Movement points per turn.
    pub moves: u32,
    /// Sight radius.
    #[serde(default = "default_line_of_sight")]
    pub line_of_sight: u32,
    /// Moves on water.
    #[serde(default)]
    pub naval: bool,
    /// Can work tiles and buildings, and be captured.
    #[serde(default)]
    pub person: bool,
    /// Goods this unit produces twice as much of.
    #[serde(default)]
    pub expert_goods: Option<GoodsTypeId>,
    /// Cargo slots.
    #[serde(default)]
    pub space: u32,
    /// Abilities.
    #[serde(default)]
    pub abilities: Vec<Ability>,
    /// Type the unit becomes on promotion.
    #[serde(default)]
    pub promotion: Option<UnitTypeId>,
    /// Type the unit becomes when demoted.
    #[serde(default)]
    pub demoted_to: Option<UnitTypeId>,
    /// Shortfall policy overriding the game-wide one.
    #[serde(default)]
    pub shortfall_policy: Option<ShortfallPolicy>,
}

impl UnitType {
    /// Whether the type has `ability`.
    pub fn has(&self, ability: Ability) -> bool {
        self.abilities.contains(&ability)
    }
}

impl ScopeSubject for UnitType {
    fn type_key(&self) -> &str {
        self.id.as_str()
    }

    fn has_ability(&self, ability: Ability) -> bool {
        self.has(ability)
    }

    fn property(&self, property: ScopeProperty) -> Option<bool> {
        Some(match property {
            ScopeProperty::Naval => self.naval,
            ScopeProperty::Offensive => self.offence > 0,
            ScopeProperty::Person => self.person,
            ScopeProperty::Expert => self.expert_goods.is_some(),
        })
    }
}

/// Equipment role definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleType {
    /// Which role this defines.
    pub role: UnitRole,
    /// Offence added to the unit type's.
    #[serde(default)]
    pub offence: u32,
    /// Defence added to the unit type's.
    #[serde(default)]
    pub defence: u32,
    /// Movement points replacing the unit type's.
    #[serde(default)]
    pub moves: Option<u32>,
    /// Goods consumed to take up the role.
    #[serde(default)]
    pub required_goods: BTreeMap<GoodsTypeId, u32>,
    /// Role the unit falls back to when demoted.
    #[serde(default)]
    pub downgrade: Option<UnitRole>,
}

/// One level of a building chain (level 1 is the first entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingLevel {
    /// Display name of the level.
    pub name: String,
    /// Output per worker.
    #[serde(default)]
    pub per_worker: u32,
    /// Hammers to build this level.
    #[serde(default)]
    pub hammers: u32,
    /// Tools to build this level.
    #[serde(default)]
    pub tools: u32,
    /// Colony population required to build this level.
    #[serde(default)]
    pub required_population: u32,
    /// Extra warehouse capacity.
    #[serde(default)]
    pub storage: u32,
    /// Defence bonus in percent for units in the colony.
    #[serde(default)]
    pub defence_pct: Decimal,
    /// Percentage bonus on the building's output.
    #[serde(default)]
    pub output_bonus_pct: u32,
    /// Abilities granted to the colony.
    #[serde(default)]
    pub abilities: Vec<Ability>,
}

/// A building chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingType {
    /// Key.
    pub id: BuildingTypeId,
    /// Goods consumed per unit of output.
    #[serde(default)]
    pub input: Option<GoodsTypeId>,
    /// Goods produced.
    #[serde(default)]
    pub output: Option<GoodsTypeId>,
    /// Output produced without any worker.
    #[serde(default)]
    pub base_output: u32,
    /// Worker slots.
    #[serde(default = "default_worker_slots")]
    pub worker_slots: u32,
    /// Level a new colony starts with (0 = not built).
    #[serde(default = "default_initial_level")]
    pub initial_level: u32,
    /// First level that requires the factory ability.
    #[serde(default)]
    pub factory_level: Option<u32>,
    /// Levels, lowest first.
    pub levels: Vec<BuildingLevel>,
}

impl BuildingType {
    /// Highest level of the chain.
    pub fn max_level(&self) -> u32 {
        u32::try_from(self.levels.len()).unwrap_or(u32::MAX)
    }

    /// Definition of `level`; `None` for level 0 or past the top.
    pub fn level(&self, level: u32) -> Option<&BuildingLevel> {
        let index = usize::try_from(level.checked_sub(1)?).ok()?;
        self.levels.get(index)
    }

    /// Whether `level` needs the factory ability.
    pub fn is_factory_level(&self, level: u32) -> bool {
        self.factory_level.is_some_and(|factory| level >= factory)
    }
}

// ---------------------------------------------------------------------------
// Disasters
// ---------------------------------------------------------------------------

/// What a disaster effect does to a colony.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectAction {
    /// Lose a percentage of one random stored goods type.
    LossOfGoods {
        /// Percent of the stock lost.
        percent: u32,
    },
    /// A random built building drops one level.
    LossOfBuilding,
    /// A random worker dies, if more than one remains.
    LossOfUnit,
    /// A random ship in the colony is damaged.
    DamageShip,
    /// The owner loses gold.
    LossOfMoney {
        /// Amount lost.
        amount: RandomRange,
    },
    /// Production is reduced for a number of turns.
    ProductionPenalty {
        /// Percent of production lost.
        percent: u32,
        /// Duration.
        turns: u32,
    },
    /// The colony's alarm toward its owner rises.
    Unrest {
        /// Alarm added.
        amount: i32,
    },
}

/// A single disaster effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// Key.
    pub id: EffectId,
    /// Own probability; must match every choice referencing it.
    pub probability: u32,
    /// Units the effect may target; empty means any.
    #[serde(default)]
    pub scopes: Vec<Scope>,
    /// What happens.
    pub action: EffectAction,
}

/// How many effects a disaster applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectCount {
    /// One weighted pick.
    One,
    /// Each effect rolls its own probability independently.
    Several,
    /// Every effect applies.
    All,
}

/// Weighted reference from a disaster to one of its effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectChoice {
    /// The effect.
    pub effect: EffectId,
    /// Weight; must equal the effect's own probability.
    pub probability: u32,
}

/// A disaster definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disaster {
    /// Key.
    pub id: DisasterId,
    /// Natural disasters are gated by `natural_disaster_pct`.
    #[serde(default = "default_true")]
    pub natural: bool,
    /// How many effects apply.
    pub number_of_effects: EffectCount,
    /// Weighted effects.
    pub effects: Vec<EffectChoice>,
}

// ---------------------------------------------------------------------------
// Keyed sections
// ---------------------------------------------------------------------------

/// A ruleset entry with a unique key.
pub trait Keyed {
    /// Key type.
    type Key: Ord + Clone + std::fmt::Debug + std::fmt::Display;

    /// Section name used in error messages.
    const KIND: &'static str;

    /// The entry's key.
    fn key(&self) -> &Self::Key;
}

macro_rules! keyed {
    ($ty:ty, $key:ty, $kind:literal, $field:ident) => {
        impl Keyed for $ty {
            type Key = $key;
            const KIND: &'static str = $kind;

            fn key(&self) -> &Self::Key {
                &self.$field
            }
        }
    };
}

keyed!(GoodsType, GoodsTypeId, "goods", id);
keyed!(WorkCategory, String, "work category", id);
keyed!(TileType, TileTypeId, "tile type", id);
keyed!(ResourceType, ResourceTypeId, "resource", id);
keyed!(UnitType, UnitTypeId, "unit type", id);
keyed!(BuildingType, BuildingTypeId, "building", id);
keyed!(Effect, EffectId, "effect", id);
keyed!(Disaster, DisasterId, "disaster", id);

/// Entries in file order plus an index by key.
#[derive(Debug, Clone)]
pub struct Section<T: Keyed> {
    entries: Vec<T>,
    index: BTreeMap<T::Key, usize>,
}

impl<T: Keyed> Section<T> {
    /// Index `entries`, rejecting duplicate keys.
    pub fn new(entries: Vec<T>) -> Result<Self, RulesError> {
        let mut index = BTreeMap::new();
        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.key().clone(), position).is_some() {
                return Err(RulesError::DuplicateId {
                    kind: T::KIND,
                    id: entry.key().to_string(),
                });
            }
        }
        Ok(Self { entries, index })
    }

    /// Entry with the given key.
    pub fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        T::Key: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.index.get(key).and_then(|position| self.entries.get(*position))
    }

    /// Whether the key is registered.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        T::Key: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Entries in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the section is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Ruleset
// ---------------------------------------------------------------------------

/// On-disk form of a ruleset.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesetFile {
    #[serde(default)]
    options: Options,
    #[serde(default)]
    colony: ColonyRules,
    #[serde(default)]
    combat: CombatRules,
    #[serde(default)]
    movement: MovementRules,
    goods: Vec<GoodsType>,
    #[serde(default)]
    work_categories: Vec<WorkCategory>,
    tiles: Vec<TileType>,
    #[serde(default)]
    additions: Vec<AdditionType>,
    #[serde(default)]
    improvements: Vec<ImprovementType>,
    #[serde(default)]
    resources: Vec<ResourceType>,
    units: Vec<UnitType>,
    #[serde(default)]
    roles: Vec<RoleType>,
    #[serde(default)]
    buildings: Vec<BuildingType>,
    #[serde(default)]
    combat_modifiers: Vec<Modifier>,
    #[serde(default)]
    effects: Vec<Effect>,
    #[serde(default)]
    disasters: Vec<Disaster>,
}

/// An immutable, validated ruleset.
#[derive(Debug, Clone)]
pub struct Ruleset {
    options: Options,
    colony: ColonyRules,
    combat: CombatRules,
    movement: MovementRules,
    goods: Section<GoodsType>,
    work_categories: Section<WorkCategory>,
    tiles: Section<TileType>,
    additions: BTreeMap<TileAddition, AdditionType>,
    improvements: BTreeMap<ImprovementAction, ImprovementType>,
    resources: Section<ResourceType>,
    units: Section<UnitType>,
    roles: BTreeMap<UnitRole, RoleType>,
    buildings: Section<BuildingType>,
    combat_modifiers: Vec<Modifier>,
    effects: Section<Effect>,
    disasters: Section<Disaster>,
}

impl Ruleset {
    /// Load and validate a ruleset from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, RulesError> {
        let contents = std::fs::read_to_string(path)?;
        let ruleset = Self::parse(&contents)?;
        info!(path = %path.display(), "ruleset loaded");
        Ok(ruleset)
    }

    /// Parse and validate a ruleset from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, RulesError> {
        let file: RulesetFile = serde_yml::from_str(yaml)?;
        let ruleset = Self::build(file)?;
        validation::validate(&ruleset)?;
        info!(
            goods = ruleset.goods.len(),
            tiles = ruleset.tiles.len(),
            units = ruleset.units.len(),
            buildings = ruleset.buildings.len(),
            disasters = ruleset.disasters.len(),
            "ruleset validated"
        );
        Ok(ruleset)
    }

    /// The bundled classic ruleset.
    pub fn classic() -> Result<Self, RulesError> {
        Self::parse(CLASSIC_RULES)
    }

    fn build(file: RulesetFile) -> Result<Self, RulesError> {
        let mut additions = BTreeMap::new();
        for addition in file.additions {
            if addition.addition == TileAddition::None {
                return Err(RulesError::InvalidValue {
                    context: String::from("additions"),
                    reason: String::from("`none` cannot be defined as an addition"),
                });
            }
            let key = addition.addition;
            if additions.insert(key, addition).is_some() {
                return Err(RulesError::DuplicateId {
                    kind: "addition",
                    id: format!("{key:?}"),
                });
            }
        }

        let mut improvements = BTreeMap::new();
        for improvement in file.improvements {
            let key = improvement.action;
            if improvements.insert(key, improvement).is_some() {
                return Err(RulesError::DuplicateId {
                    kind: "improvement",
                    id: format!("{key:?}"),
                });
            }
        }

        let mut roles = BTreeMap::new();
        for role in file.roles {
            let key = role.role;
            if roles.insert(key, role).is_some() {
                return Err(RulesError::DuplicateId {
                    kind: "role",
                    id: String::from(key.key()),
                });
            }
        }

        Ok(Self {
            options: file.options,
            colony: file.colony,
            combat: file.combat,
            movement: file.movement,
            goods: Section::new(file.goods)?,
            work_categories: Section::new(file.work_categories)?,
            tiles: Section::new(file.tiles)?,
            additions,
            improvements,
            resources: Section::new(file.resources)?,
            units: Section::new(file.units)?,
            roles,
            buildings: Section::new(file.buildings)?,
            combat_modifiers: file.combat_modifiers,
            effects: Section::new(file.effects)?,
            disasters: Section::new(file.disasters)?,
        })
    }

    /// Replace the global options, e.g. with game-configuration overrides.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Replace the colony tuning.
    #[must_use]
    pub fn with_colony_rules(mut self, colony: ColonyRules) -> Self {
        self.colony = colony;
        self
    }

    /// Replace the combat tuning.
    #[must_use]
    pub fn with_combat_rules(mut self, combat: CombatRules) -> Self {
        self.combat = combat;
        self
    }

    /// Global options.
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Colony tuning.
    pub const fn colony(&self) -> &ColonyRules {
        &self.colony
    }

    /// Combat tuning.
    pub const fn combat(&self) -> &CombatRules {
        &self.combat
    }

    /// Movement tuning.
    pub const fn movement(&self) -> &MovementRules {
        &self.movement
    }

    /// Goods types.
    pub const fn goods(&self) -> &Section<GoodsType> {
        &self.goods
    }

    /// Goods type by key.
    pub fn goods_type(&self, id: &str) -> Option<&GoodsType> {
        self.goods.get(id)
    }

    /// Work categories.
    pub const fn work_categories(&self) -> &Section<WorkCategory> {
        &self.work_categories
    }

    /// Tile types.
    pub const fn tiles(&self) -> &Section<TileType> {
        &self.tiles
    }

    /// Tile type by key.
    pub fn tile_type(&self, id: &str) -> Option<&TileType> {
        self.tiles.get(id)
    }

    /// Definition of a tile addition; `None` for [`TileAddition::None`].
    pub fn addition(&self, addition: TileAddition) -> Option<&AdditionType> {
        self.additions.get(&addition)
    }

    /// Definition of an improvement action.
    pub fn improvement(&self, action: ImprovementAction) -> Option<&ImprovementType> {
        self.improvements.get(&action)
    }

    /// Resource type by key.
    pub fn resource(&self, id: &str) -> Option<&ResourceType> {
        self.resources.get(id)
    }

    /// Resource types.
    pub const fn resources(&self) -> &Section<ResourceType> {
        &self.resources
    }

    /// Unit types.
    pub const fn units(&self) -> &Section<UnitType> {
        &self.units
    }

    /// Unit type by key.
    pub fn unit_type(&self, id: &str) -> Option<&UnitType> {
        self.units.get(id)
    }

    /// Role definition; roles without one carry no bonus.
    pub fn role(&self, role: UnitRole) -> Option<&RoleType> {
        self.roles.get(&role)
    }

    /// All role definitions.
    pub fn roles(&self) -> impl Iterator<Item = &RoleType> {
        self.roles.values()
    }

    /// Buildings in ruleset order.
    pub const fn buildings(&self) -> &Section<BuildingType> {
        &self.buildings
    }

    /// Building by key.
    pub fn building(&self, id: &str) -> Option<&BuildingType> {
        self.buildings.get(id)
    }

    /// Combat modifiers whose id equals `id` (`offence` or `defence`).
    pub fn combat_modifiers<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Modifier> {
        self.combat_modifiers.iter().filter(move |m| m.id == id)
    }

    /// Effects.
    pub const fn effects(&self) -> &Section<Effect> {
        &self.effects
    }

    /// Effect by key.
    pub fn effect(&self, id: &str) -> Option<&Effect> {
        self.effects.get(id)
    }

    /// Disasters.
    pub const fn disasters(&self) -> &Section<Disaster> {
        &self.disasters
    }

    /// Disaster by key.
    pub fn disaster(&self, id: &str) -> Option<&Disaster> {
        self.disasters.get(id)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}

const fn default_natural_disaster_pct() -> u32 {
    10
}

const fn default_tension_decay() -> i32 {
    10
}

const fn default_bad_government_limit() -> u32 {
    6
}

const fn default_very_bad_government_limit() -> u32 {
    10
}

const fn default_liberty_per_rebel() -> u32 {
    200
}

const fn default_food_to_grow() -> u32 {
    200
}

const fn default_food_consumption() -> u32 {
    2
}

const fn default_base_storage() -> u32 {
    100
}

const fn default_line_of_sight() -> u32 {
    1
}

const fn default_river_bonus() -> u32 {
    1
}

fn default_born_unit() -> UnitTypeId {
    UnitTypeId::new("free_colonist")
}

fn default_build_goods() -> GoodsTypeId {
    GoodsTypeId::new("hammers")
}

fn default_build_tools() -> GoodsTypeId {
    GoodsTypeId::new("tools")
}

const fn default_attack_bonus_pct() -> Decimal {
    Decimal::from_parts(50, 0, 0, false, 0)
}

const fn default_fortify_bonus_pct() -> Decimal {
    Decimal::from_parts(50, 0, 0, false, 0)
}

const fn default_artillery_in_the_open_pct() -> Decimal {
    Decimal::from_parts(75, 0, 0, true, 0)
}

const fn default_cargo_penalty_pct() -> Decimal {
    Decimal::from_parts(125, 0, 0, true, 1)
}

const fn default_normal_result_weight() -> u32 {
    80
}

const fn default_great_result_weight() -> u32 {
    20
}

const fn default_ship_repair_turns() -> u32 {
    3
}

const fn default_tension_on_attack() -> i32 {
    200
}

const fn default_tension_on_unit_destroyed() -> i32 {
    400
}

const fn default_alarm_on_colony_attacked() -> i32 {
    500
}

const fn default_points_per_move() -> u32 {
    3
}

const fn default_road_cost() -> u32 {
    1
}

const fn default_river_cost() -> u32 {
    1
}

const fn default_lenient_margin() -> u32 {
    2
}

const fn default_defence() -> u32 {
    1
}

const fn default_worker_slots() -> u32 {
    3
}

const fn default_initial_level() -> u32 {
    1
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn classic_ruleset_loads() {
        let rules = Ruleset::classic().expect("classic ruleset should validate");
        assert!(rules.goods_type("food").is_some_and(|g| g.food));
        assert!(rules.goods_type("bells").is_some_and(|g| g.liberty && !g.storable));
        assert!(rules.unit_type("galleon").is_some_and(|u| u.naval));
        assert!(rules.addition(TileAddition::Hills).is_some());
        assert!(rules.addition(TileAddition::None).is_none());
        assert_eq!(rules.combat().ship_repair_turns, 3);
        assert_eq!(rules.colony().liberty_per_rebel, 200);
    }

    #[test]
    fn buildings_keep_file_order() {
        let rules = Ruleset::classic().unwrap();
        let first = rules.buildings().iter().next().unwrap();
        assert_eq!(first.id.as_str(), "town_hall");
        let blacksmith = rules.building("blacksmith").unwrap();
        assert!(blacksmith.level(0).is_none());
        assert!(blacksmith.level(1).is_some());
        assert!(blacksmith.level(blacksmith.max_level() + 1).is_none());
        assert!(blacksmith.is_factory_level(blacksmith.max_level()));
    }

    #[test]
    fn unit_type_scope_properties() {
        let rules = Ruleset::classic().unwrap();
        let privateer = rules.unit_type("privateer").unwrap();
        assert_eq!(privateer.property(ScopeProperty::Naval), Some(true));
        assert_eq!(privateer.property(ScopeProperty::Offensive), Some(true));
        assert!(privateer.has_ability(Ability::Piracy));
        let farmer = rules.unit_type("expert_farmer").unwrap();
        assert_eq!(farmer.property(ScopeProperty::Expert), Some(true));
        assert_eq!(farmer.property(ScopeProperty::Person), Some(true));
    }

    #[test]
    fn work_cost_lookup() {
        let cost = WorkCost {
            plow: Some(5),
            road: None,
        };
        assert_eq!(cost.for_action(ImprovementAction::Plow), Some(5));
        assert_eq!(cost.for_action(ImprovementAction::Road), None);
    }

    #[test]
    fn default_combat_constants() {
        let combat = CombatRules::default();
        assert_eq!(combat.artillery_in_the_open_pct, Decimal::new(-75, 0));
        assert_eq!(combat.cargo_penalty_pct, Decimal::new(-125, 1));
        assert_eq!(combat.attack_bonus_pct, Decimal::new(50, 0));
    }

    #[test]
    fn unknown_sections_are_rejected() {
        let yaml = "goods: []\ntiles: []\nunits: []\nspaceships: []\n";
        assert!(matches!(Ruleset::parse(yaml), Err(RulesError::Yaml { .. })));
    }

    #[test]
    fn duplicate_goods_are_rejected() {
        let yaml = "goods:\n  - id: food\n  - id: food\ntiles: []\nunits: []\n";
        assert!(matches!(
            Ruleset::parse(yaml),
            Err(RulesError::DuplicateId { kind: "goods", .. })
        ));
    }
}
