//! Natural disasters striking colonies.
//!
//! Each turn a colony may be struck by one of the disasters its centre tile
//! allows. A disaster applies one, several or all of its effects, and each
//! effect picks its own random target: a goods type, a building, a worker, a
//! ship in port or the owner's treasury.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use colonia_rules::ruleset::{Effect, EffectAction, EffectCount};
use colonia_rules::scope::scopes_apply;
use colonia_rules::{Ruleset, WeightedChoice, random_int};
use colonia_types::{BuildingTypeId, ColonyId, DisasterId, EffectId, GoodsTypeId, UnitId};

use crate::error::{SimError, unknown};
use crate::game::Game;
use crate::unit::{RepairLocation, UnitLocation};

/// What one effect did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectOutcome {
    /// Stored goods were lost.
    GoodsLost {
        /// Goods type.
        goods: GoodsTypeId,
        /// Amount removed.
        amount: u32,
    },
    /// A building dropped a level.
    BuildingDamaged {
        /// Building.
        building: BuildingTypeId,
        /// Level afterwards.
        level: u32,
        /// Workers who lost their place.
        displaced: Vec<UnitId>,
    },
    /// A worker died.
    UnitLost {
        /// The worker.
        unit: UnitId,
    },
    /// A ship in port was damaged, or sunk when it had nowhere to go.
    ShipDamaged {
        /// The ship.
        unit: UnitId,
        /// Where it repairs; `None` when it sank.
        repair: Option<RepairLocation>,
    },
    /// The owner lost gold.
    MoneyLost {
        /// Gold removed.
        amount: i64,
    },
    /// Production is reduced for a while.
    ProductionPenalty {
        /// Percent lost.
        percent: u32,
        /// Duration.
        turns: u32,
    },
    /// Alarm toward the owner rose.
    Unrest {
        /// Alarm afterwards.
        alarm: i32,
    },
    /// Nothing suitable to hit.
    NoTarget,
}

/// A disaster and what each of its effects did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisasterReport {
    /// Struck colony.
    pub colony: ColonyId,
    /// Disaster key.
    pub disaster: DisasterId,
    /// Applied effects in order.
    pub outcomes: Vec<(EffectId, EffectOutcome)>,
}

/// Roll for a natural disaster at `colony`.
///
/// Only disasters marked natural take part. A tile without any makes no
/// draws at all.
pub fn check_disaster(game: &mut Game, colony: ColonyId, rng: &mut impl Rng) -> Result<Option<DisasterReport>, SimError> {
    let rules = Arc::clone(game.rules_handle());
    let position = game.colony(colony)?.position();
    let tile_type = game.map().require(position)?.tile_type(&rules)?;
    let choices = WeightedChoice::new(
        tile_type
            .disasters
            .iter()
            .filter(|c| rules.disaster(c.disaster.as_str()).is_some_and(|d| d.natural))
            .map(|c| (c.disaster.clone(), c.probability)),
    );
    if choices.is_empty() {
        return Ok(None);
    }

    let strikes = match rules.options().natural_disaster_pct {
        0 => false,
        pct if pct >= 100 => true,
        pct => random_int(rng, "natural disaster", 100) < pct,
    };
    if !strikes {
        return Ok(None);
    }
    let Some(disaster) = choices.sample(rng, "disaster").cloned() else {
        return Ok(None);
    };
    apply_disaster(game, colony, disaster.as_str(), rng).map(Some)
}

/// Apply `disaster` to `colony`.
pub fn apply_disaster(game: &mut Game, colony: ColonyId, disaster: &str, rng: &mut impl Rng) -> Result<DisasterReport, SimError> {
    let rules = Arc::clone(game.rules_handle());
    let definition = rules.disaster(disaster).ok_or_else(|| unknown("disaster", disaster))?;

    let mut chosen = Vec::new();
    match definition.number_of_effects {
        EffectCount::One => {
            let choices = WeightedChoice::new(definition.effects.iter().map(|c| (&c.effect, c.probability)));
            chosen.extend(choices.sample(rng, "disaster effect").copied());
        }
        EffectCount::Several => {
            for choice in &definition.effects {
                if random_int(rng, "disaster effect", 100) < choice.probability {
                    chosen.push(&choice.effect);
                }
            }
        }
        EffectCount::All => chosen.extend(definition.effects.iter().map(|c| &c.effect)),
    }

    let mut outcomes = Vec::with_capacity(chosen.len());
    for id in chosen {
        let effect = rules.effect(id.as_str()).ok_or_else(|| unknown("effect", id))?;
        let outcome = apply_effect(game, &rules, colony, effect, rng)?;
        debug!(%colony, disaster, effect = %id, ?outcome, "disaster effect");
        outcomes.push((id.clone(), outcome));
    }
    info!(%colony, disaster, effects = outcomes.len(), "disaster struck");
    Ok(DisasterReport {
        colony,
        disaster: definition.id.clone(),
        outcomes,
    })
}

fn pick<T>(rng: &mut impl Rng, label: &str, mut items: Vec<T>) -> Option<T> {
    let len = u32::try_from(items.len()).ok()?;
    if len == 0 {
        return None;
    }
    let index = usize::try_from(random_int(rng, label, len)).ok()?;
    (index < items.len()).then(|| items.swap_remove(index))
}

fn apply_effect(
    game: &mut Game,
    rules: &Ruleset,
    colony: ColonyId,
    effect: &Effect,
    rng: &mut impl Rng,
) -> Result<EffectOutcome, SimError> {
    let target = game.colony(colony)?;
    let owner = target.owner();
    let position = target.position();

    let outcome = match &effect.action {
        EffectAction::LossOfGoods { percent } => {
            let stored: Vec<(GoodsTypeId, u32)> = target
                .stock()
                .iter()
                .filter(|(id, amount)| **amount > 0 && rules.goods_type(id.as_str()).is_some_and(|g| g.storable))
                .map(|(id, amount)| (id.clone(), *amount))
                .collect();
            let Some((goods, held)) = pick(rng, "spoiled goods", stored) else {
                return Ok(EffectOutcome::NoTarget);
            };
            let lost = u64::from(held)
                .saturating_mul(u64::from(*percent))
                .checked_div(100)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(held)
                .clamp(1, held);
            game.colony_mut(colony)?.remove_goods(&goods, lost)?;
            EffectOutcome::GoodsLost { goods, amount: lost }
        }
        EffectAction::LossOfBuilding => {
            let burnable: Vec<BuildingTypeId> = target
                .buildings()
                .iter()
                .filter(|(id, b)| rules.building(id.as_str()).is_some_and(|t| b.level > t.initial_level))
                .map(|(id, _)| id.clone())
                .collect();
            let Some(building) = pick(rng, "burned building", burnable) else {
                return Ok(EffectOutcome::NoTarget);
            };
            let target = game.colony_mut(colony)?;
            let displaced = target.downgrade_building(building.as_str())?;
            let level = target.building_level(building.as_str());
            for unit in &displaced {
                game.unit_mut(*unit)?.set_location(UnitLocation::Tile(position));
            }
            EffectOutcome::BuildingDamaged {
                building,
                level,
                displaced,
            }
        }
        EffectAction::LossOfUnit => {
            if target.unit_count() <= 1 {
                return Ok(EffectOutcome::NoTarget);
            }
            let workers: Vec<UnitId> = target
                .workers()
                .filter(|w| {
                    game.unit(*w)
                        .and_then(|u| u.unit_type(rules))
                        .is_ok_and(|t| scopes_apply(&effect.scopes, Some(t)))
                })
                .collect();
            let Some(unit) = pick(rng, "lost unit", workers) else {
                return Ok(EffectOutcome::NoTarget);
            };
            game.remove_unit(unit)?;
            EffectOutcome::UnitLost { unit }
        }
        EffectAction::DamageShip => {
            let ships: Vec<UnitId> = game
                .units_on_tile(position)
                .filter(|u| u.owner() == owner && u.is_active())
                .filter(|u| {
                    u.unit_type(rules)
                        .is_ok_and(|t| t.naval && scopes_apply(&effect.scopes, Some(t)))
                })
                .map(|u| u.id())
                .collect();
            let Some(unit) = pick(rng, "damaged ship", ships) else {
                return Ok(EffectOutcome::NoTarget);
            };
            let repair = game.repair_location(owner);
            match repair {
                Some(location) => game.send_for_repair(unit, location)?,
                None => {
                    game.remove_unit(unit)?;
                }
            }
            EffectOutcome::ShipDamaged { unit, repair }
        }
        EffectAction::LossOfMoney { amount } => {
            let wanted = amount.amount("lost treasury", rng, false);
            let amount = game.player_mut(owner)?.remove_gold(wanted);
            EffectOutcome::MoneyLost { amount }
        }
        EffectAction::ProductionPenalty { percent, turns } => {
            game.colony_mut(colony)?.add_penalty(*percent, *turns);
            EffectOutcome::ProductionPenalty {
                percent: *percent,
                turns: *turns,
            }
        }
        EffectAction::Unrest { amount } => {
            let alarm = game.colony_mut(colony)?.alarm_mut(owner).modify(*amount);
            EffectOutcome::Unrest { alarm }
        }
    };
    Ok(outcome)
}
