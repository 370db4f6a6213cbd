//! Per-turn colony production.
//!
//! ## Order
//!
//! 1. Colony centre: the centre tile's primary and secondary goods.
//! 2. Worked tiles, in position order.
//! 3. Buildings, in ruleset order. A building's input is limited by the
//!    stock plus what this turn has already produced of it.
//! 4. Per worker: government bonus (from SoL), then expert doubling.
//! 5. Per building: factory output bonus, on output only. Input is
//!    consumed at the rate the workers process it.
//! 6. Per source: temporary production penalties.
//! 7. Random harvest bonus on food, if the ruleset has one.
//! 8. Food consumption per colonist.
//!
//! The net result is then applied to the stock, liberty is recomputed and
//! checked, and a food surplus past `food_to_grow` turns into growth.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use colonia_rules::Ruleset;
use colonia_types::{ColonyId, GoodsTypeId, UnitId};
use colonia_world::Map;

use crate::colony::{Colony, Notice};
use crate::error::SimError;
use crate::liberty::Liberty;
use crate::unit::Unit;

/// Net goods of one turn, signed.
pub type NetProduction = BTreeMap<GoodsTypeId, i64>;

/// Outcome of a colony's production step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionReport {
    /// The colony.
    pub colony: ColonyId,
    /// Net change per goods type.
    pub net: NetProduction,
    /// Liberty after production.
    pub liberty: Liberty,
    /// Famine and overflow notices.
    pub notices: Vec<Notice>,
    /// Whether a colonist is due to be born.
    pub grew: bool,
}

/// Read-only view of what a colony needs to compute its production.
#[derive(Debug, Clone, Copy)]
pub struct ProductionEngine<'a> {
    rules: &'a Ruleset,
    map: &'a Map,
    units: &'a BTreeMap<UnitId, Unit>,
}

impl<'a> ProductionEngine<'a> {
    /// Engine over the given state.
    pub const fn new(rules: &'a Ruleset, map: &'a Map, units: &'a BTreeMap<UnitId, Unit>) -> Self {
        Self { rules, map, units }
    }

    fn worker(&self, id: UnitId) -> Result<&'a Unit, SimError> {
        self.units.get(&id).ok_or(SimError::UnknownUnit(id))
    }

    fn is_expert(&self, id: UnitId, goods: &GoodsTypeId) -> Result<bool, SimError> {
        let unit_type = self.worker(id)?.unit_type(self.rules)?;
        Ok(unit_type.expert_goods.as_ref() == Some(goods))
    }

    /// Net production of `colony` for one turn, without touching it.
    pub fn net_production(&self, colony: &Colony, rng: &mut impl Rng) -> Result<NetProduction, SimError> {
        let rules = self.rules;
        let bonus = colony.liberty(rules)?.government_bonus(rules.options());
        let penalty = colony.penalty_pct();
        let mut net = NetProduction::new();

        // Centre tile.
        let centre = self.map.require(colony.position())?;
        for goods in centre.tile_type(rules)?.centre_goods.iter().take(2) {
            let amount = centre.potential_production(rules, goods)?;
            add(&mut net, goods, scale(amount, 0, penalty));
        }

        // Worked tiles.
        for (position, slot) in colony.work_tiles() {
            let (Some(worker), Some(goods)) = (slot.worker, slot.goods.as_ref()) else {
                continue;
            };
            let base = self.map.require(*position)?.potential_production(rules, goods)?;
            let amount = worker_output(base, bonus, self.is_expert(worker, goods)?);
            add(&mut net, goods, scale(amount, 0, penalty));
        }

        // Buildings.
        for (building_type, level) in colony.built_levels(rules) {
            let Some(output) = building_type.output.as_ref() else {
                continue;
            };
            let workers = colony
                .building(building_type.id.as_str())
                .map(|b| b.workers.as_slice())
                .unwrap_or_default();
            let mut total = building_type.base_output;
            for worker in workers {
                let expert = self.is_expert(*worker, output)?;
                total = total.saturating_add(worker_output(level.per_worker, bonus, expert));
            }
            // Workers process input one for one; the factory bonus only adds output.
            let mut processed = scale(total, 0, penalty);
            if let Some(input) = building_type.input.as_ref() {
                let available = i64::from(colony.goods(input.as_str()))
                    .saturating_add(net.get(input).copied().unwrap_or(0))
                    .max(0);
                processed = processed.min(available);
                add(&mut net, input, processed.saturating_neg());
            }
            let processed = u32::try_from(processed).unwrap_or(u32::MAX);
            add(&mut net, output, scale(processed, level.output_bonus_pct, 0));
        }

        // Harvest and consumption.
        if let Some(food) = rules.goods().iter().find(|g| g.food) {
            if let Some(harvest) = rules.colony().harvest_bonus.as_ref() {
                let extra = harvest.amount("harvest bonus", rng, false);
                add(&mut net, &food.id, extra);
            }
            let eaten = i64::from(colony.unit_count()).saturating_mul(i64::from(rules.colony().food_consumption));
            add(&mut net, &food.id, eaten.saturating_neg());
        }

        Ok(net)
    }
}

/// Output of one worker after the government bonus and expert doubling.
///
/// Sources that yield nothing stay at nothing.
fn worker_output(base: u32, bonus: i32, expert: bool) -> u32 {
    if base == 0 {
        return 0;
    }
    let governed = i64::from(base).saturating_add(i64::from(bonus)).max(0);
    let governed = u32::try_from(governed).unwrap_or(u32::MAX);
    if expert {
        governed.saturating_mul(2)
    } else {
        governed
    }
}

/// Apply an output bonus and a penalty, both in percent, rounding down.
fn scale(amount: u32, bonus_pct: u32, penalty_pct: u32) -> i64 {
    let boosted = u64::from(amount)
        .saturating_mul(u64::from(100_u32.saturating_add(bonus_pct)))
        .checked_div(100)
        .unwrap_or(0);
    let kept = boosted
        .saturating_mul(u64::from(100_u32.saturating_sub(penalty_pct.min(100))))
        .checked_div(100)
        .unwrap_or(0);
    i64::try_from(kept).unwrap_or(i64::MAX)
}

fn add(net: &mut NetProduction, goods: &GoodsTypeId, amount: i64) {
    if amount == 0 {
        return;
    }
    let entry = net.entry(goods.clone()).or_insert(0);
    *entry = entry.saturating_add(amount);
}

/// Run one turn of production for `colony`: compute, apply to the stock,
/// recompute liberty and check for growth.
pub fn produce(
    rules: &Ruleset,
    map: &Map,
    units: &BTreeMap<UnitId, Unit>,
    colony: &mut Colony,
    rng: &mut impl Rng,
) -> Result<ProductionReport, SimError> {
    let net = ProductionEngine::new(rules, map, units).net_production(colony, rng)?;
    let mut notices = Vec::new();
    for (goods, delta) in &net {
        if let Some(notice) = colony.add_goods(rules, goods, *delta) {
            notices.push(notice);
        }
    }
    let liberty = colony.liberty(rules)?;
    let grew = colony.take_growth(rules);
    debug!(colony = %colony.id(), sol = liberty.sol, grew, "production applied");
    Ok(ProductionReport {
        colony: colony.id(),
        net,
        liberty,
        notices,
        grew,
    })
}
