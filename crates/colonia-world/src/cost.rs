//! Movement cost of a single step and the per-step budget decider.
//!
//! [`step_cost`] checks that a step is legal and returns its nominal cost.
//! [`CostDecider`] then reconciles that cost with the unit's remaining
//! budget. When the step costs more than the unit has left, the decider's
//! [`ShortfallPolicy`] decides whether the unit spends its remainder and
//! moves anyway, or whether the step rolls over into a fresh allotment
//! (`is_new_turn`). In the rollover case the returned cost includes the
//! remainder forfeited this turn plus the step's cost against the next
//! allotment, and `moves_left` is what remains of that next allotment.

use tracing::trace;

use colonia_rules::ruleset::UnitType;
use colonia_rules::{Ruleset, ShortfallPolicy};
use colonia_types::{Ability, PlayerId};

use crate::error::WorldError;
use crate::map::Map;
use crate::position::Position;

/// What the decider needs to know about the moving unit.
#[derive(Debug, Clone, Copy)]
pub struct Mover<'a> {
    /// The unit's owner, whose exploration gates the step.
    pub owner: PlayerId,
    /// The unit's type.
    pub unit_type: &'a UnitType,
    /// The unit's full movement allotment per turn (role included).
    pub initial_moves: u32,
}

/// Nominal cost of stepping from `from` to `to`, after legality checks.
///
/// # Errors
///
/// - [`WorldError::OffMap`] if either position is off the map.
/// - [`WorldError::NotAdjacent`] if the positions are not neighbours.
/// - [`WorldError::Unexplored`] if the owner has not explored `to`.
/// - [`WorldError::IllegalTerrain`] for land units entering water, or naval
///   units entering land without a settlement.
pub fn step_cost(rules: &Ruleset, map: &Map, mover: &Mover<'_>, from: Position, to: Position) -> Result<u32, WorldError> {
    let from_tile = map.require(from)?;
    let to_tile = map.require(to)?;
    let direction = from
        .direction_to(to)
        .ok_or(WorldError::NotAdjacent { from, to })?;

    if !to_tile.is_explored_by(mover.owner) {
        return Err(WorldError::Unexplored {
            player: mover.owner,
            position: to,
        });
    }

    let water = to_tile.is_water(rules)?;
    if water && !mover.unit_type.naval {
        return Err(WorldError::IllegalTerrain {
            unit_type: mover.unit_type.id.clone(),
            position: to,
            reason: "land units cannot enter water",
        });
    }
    if !water && mover.unit_type.naval && to_tile.settlement().is_none() {
        return Err(WorldError::IllegalTerrain {
            unit_type: mover.unit_type.id.clone(),
            position: to,
            reason: "naval units can only land in a settlement",
        });
    }

    let movement = rules.movement();
    if mover.unit_type.has(Ability::IgnoreTerrainCost) {
        return Ok(movement.points_per_move);
    }
    if mover.unit_type.naval {
        return to_tile.base_move_cost(rules);
    }
    if from_tile.has_road() && to_tile.has_road() {
        return Ok(movement.road_cost);
    }
    let river_connects = from_tile.river().is_some_and(|r| r.flows(direction))
        && to_tile.river().is_some_and(|r| r.flows(direction.reverse()));
    if river_connects {
        return Ok(movement.river_cost);
    }
    to_tile.base_move_cost(rules)
}

/// Reconciles step costs with a unit's movement budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostDecider {
    policy: ShortfallPolicy,
    lenient_margin: u32,
    moves_left: u32,
    new_turn: bool,
}

impl CostDecider {
    /// Decider for a unit of `unit_type`, using the type's policy override
    /// or else the ruleset's default.
    pub fn new(rules: &Ruleset, unit_type: &UnitType) -> Self {
        let policy = unit_type
            .shortfall_policy
            .unwrap_or(rules.options().shortfall_policy);
        Self::with_policy(policy, rules.movement().lenient_margin)
    }

    /// Decider with an explicit policy.
    pub const fn with_policy(policy: ShortfallPolicy, lenient_margin: u32) -> Self {
        Self {
            policy,
            lenient_margin,
            moves_left: 0,
            new_turn: false,
        }
    }

    /// The policy in force.
    pub const fn policy(&self) -> ShortfallPolicy {
        self.policy
    }

    /// Cost of the step from `from` to `to`.
    ///
    /// `moves_left` is the budget before the step and `accumulated` the
    /// moves already spent this turn. After the call, [`Self::moves_left`]
    /// and [`Self::is_new_turn`] describe the outcome.
    ///
    /// # Errors
    ///
    /// Any [`step_cost`] error, or [`WorldError::BudgetInconsistency`] when
    /// `moves_left + accumulated` exceeds the unit's initial moves.
    pub fn cost(
        &mut self,
        rules: &Ruleset,
        map: &Map,
        mover: &Mover<'_>,
        from: Position,
        to: Position,
        moves_left: u32,
        accumulated: u32,
    ) -> Result<u32, WorldError> {
        let initial = mover.initial_moves;
        if moves_left.checked_add(accumulated).is_none_or(|total| total > initial) {
            return Err(WorldError::BudgetInconsistency {
                moves_left,
                accumulated,
                initial,
            });
        }

        let cost = step_cost(rules, map, mover, from, to)?;
        let into_settlement = map.require(to)?.settlement().is_some();
        Ok(self.settle(cost, moves_left, initial, into_settlement))
    }

    /// Apply the shortfall policy to a nominal step cost.
    fn settle(&mut self, cost: u32, moves_left: u32, initial: u32, into_settlement: bool) -> u32 {
        self.new_turn = false;

        if let Some(remaining) = moves_left.checked_sub(cost) {
            self.moves_left = remaining;
            return cost;
        }

        if moves_left > 0 && self.allows_short_move(cost, moves_left, initial, into_settlement) {
            trace!(cost, moves_left, policy = ?self.policy, "short move");
            self.moves_left = 0;
            return moves_left;
        }

        let step = cost.min(initial);
        self.new_turn = true;
        self.moves_left = initial.saturating_sub(step);
        trace!(cost, moves_left, step, "movement rolls over to a new turn");
        moves_left.saturating_add(step)
    }

    fn allows_short_move(&self, cost: u32, moves_left: u32, initial: u32, into_settlement: bool) -> bool {
        match self.policy {
            ShortfallPolicy::Clamp => true,
            ShortfallPolicy::Strict => false,
            ShortfallPolicy::Lenient => {
                let stretched = moves_left.saturating_add(self.lenient_margin);
                stretched >= initial || cost <= stretched || into_settlement
            }
        }
    }

    /// Moves left after the last step.
    pub const fn moves_left(&self) -> u32 {
        self.moves_left
    }

    /// Whether the last step had to roll over into a fresh allotment.
    pub const fn is_new_turn(&self) -> bool {
        self.new_turn
    }
}
