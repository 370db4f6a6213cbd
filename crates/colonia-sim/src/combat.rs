//! Combat between two units.
//!
//! ## Combat flow
//!
//! 1. Validate preconditions ([`check_attack`]); a rejected attack mutates
//!    nothing.
//! 2. Compute offence and defence power with modifiers.
//! 3. Draw the primary outcome from weights derived from the victory chance
//!    `v = offence / (offence + defence)`:
//!    - land: win `round(100v)`, lose the rest;
//!    - naval: win `round(100v)`, evade `round(20(1 - v))`, lose the rest.
//! 4. Draw the consequence for the loser from a secondary table whose
//!    entries depend on what the loser is (ship, armed unit, unarmed unit,
//!    last defender of a colony) and what the winner can do.
//! 5. [`apply`] carries out the result: moves spent, consequence, tension
//!    and colony alarm.
//!
//! [`resolve`] and [`apply`] are separate so a caller can inspect or
//! override a result before it takes effect.

use std::sync::Arc;

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use colonia_rules::ruleset::UnitType;
use colonia_rules::{Modifier, Ruleset, WeightedChoice, apply_modifiers};
use colonia_types::{
    Ability, ColonyId, CombatConsequence, CombatOutcome, PlayerId, UnitId, UnitRole,
};
use colonia_world::Position;

use crate::error::SimError;
use crate::game::Game;
use crate::unit::{RepairLocation, Unit, UnitLocation};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Primary outcome plus the consequence for the loser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatResult {
    /// Outcome from the attacker's point of view.
    pub outcome: CombatOutcome,
    /// What happens to the loser; `None` after an evasion.
    pub consequence: Option<CombatConsequence>,
}

/// Powers and primary weights of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatOdds {
    /// Attacker's offence after modifiers.
    pub offence: Decimal,
    /// Defender's defence after modifiers.
    pub defence: Decimal,
    /// Weight of a win, out of 100.
    pub win: u32,
    /// Weight of an evasion (naval only).
    pub evade: u32,
    /// Weight of a loss.
    pub lose: u32,
}

impl CombatOdds {
    /// Primary weights for the given powers.
    pub fn new(offence: Decimal, defence: Decimal, naval: bool) -> Self {
        let total = offence.saturating_add(defence);
        let victory = offence.checked_div(total).unwrap_or(Decimal::ZERO);
        let win = percent(victory.saturating_mul(Decimal::ONE_HUNDRED));
        let evade = if naval {
            percent(Decimal::from(20).saturating_mul(Decimal::ONE.saturating_sub(victory)))
        } else {
            0
        };
        Self {
            offence,
            defence,
            win,
            evade,
            lose: 100_u32.saturating_sub(win).saturating_sub(evade),
        }
    }

    /// The weighted primary outcomes.
    pub fn outcomes(&self) -> WeightedChoice<CombatOutcome> {
        WeightedChoice::new([
            (CombatOutcome::Win, self.win),
            (CombatOutcome::Evade, self.evade),
            (CombatOutcome::Lose, self.lose),
        ])
    }
}

fn percent(value: Decimal) -> u32 {
    value.round().to_u32().unwrap_or(0).min(100)
}

/// Everything that happened in an applied combat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatReport {
    /// The applied result.
    pub result: Option<CombatResult>,
    /// Units removed from the game.
    pub destroyed: Vec<UnitId>,
    /// Units that changed hands.
    pub captured: Vec<UnitId>,
    /// Unit promoted.
    pub promoted: Option<UnitId>,
    /// Unit demoted.
    pub demoted: Option<UnitId>,
    /// Ship sent for repair, and where.
    pub repaired: Option<(UnitId, RepairLocation)>,
    /// Colony that changed hands.
    pub captured_colony: Option<ColonyId>,
    /// Gold plundered from the colony's old owner.
    pub plunder: i64,
}

// ---------------------------------------------------------------------------
// Preconditions
// ---------------------------------------------------------------------------

/// Check that `attacker` may attack `defender` right now.
pub fn check_attack(game: &Game, attacker: UnitId, defender: UnitId) -> Result<(), SimError> {
    let illegal = |reason| SimError::IllegalAttack {
        attacker,
        defender,
        reason,
    };
    if attacker == defender {
        return Err(illegal("a unit cannot attack itself"));
    }
    let rules = game.rules();
    let a = game.unit(attacker)?;
    let d = game.unit(defender)?;
    let a_type = a.unit_type(rules)?;
    let d_type = d.unit_type(rules)?;

    if a.owner() == d.owner() {
        return Err(illegal("units have the same owner"));
    }
    if !a.is_active() || !d.is_active() {
        return Err(illegal("both units must be active"));
    }
    let at_war = game.player(a.owner())?.is_at_war_with(d.owner());
    if !at_war && !a_type.has(Ability::Piracy) {
        return Err(illegal("players are not at war"));
    }
    let from = a.tile().ok_or_else(|| illegal("attacker is not on the map"))?;
    let to = game
        .unit_position(d)
        .ok_or_else(|| illegal("defender is not on the map"))?;
    if !from.is_adjacent(to) {
        return Err(illegal("units are not adjacent"));
    }
    if matches!(d.location(), UnitLocation::Colony(_)) && has_tile_defender(game, d.owner(), to) {
        return Err(illegal("colony workers are shielded by the units on the colony tile"));
    }
    if base_offence(rules, a, a_type) == 0 {
        return Err(illegal("attacker has no offence"));
    }
    if a.moves_left() == 0 {
        return Err(illegal("attacker has no moves left"));
    }
    if a_type.naval != d_type.naval {
        return Err(illegal("naval and land units cannot fight each other"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Power
// ---------------------------------------------------------------------------

fn base_offence(rules: &Ruleset, unit: &Unit, unit_type: &UnitType) -> u32 {
    let role = rules.role(unit.role()).map_or(0, |r| r.offence);
    unit_type.offence.saturating_add(role)
}

fn base_defence(rules: &Ruleset, unit: &Unit, unit_type: &UnitType) -> u32 {
    let role = rules.role(unit.role()).map_or(0, |r| r.defence);
    unit_type.defence.saturating_add(role).max(1)
}

fn scoped(rules: &Ruleset, id: &str, unit_type: &UnitType) -> Vec<Modifier> {
    rules
        .combat_modifiers(id)
        .filter(|m| m.applies_to(unit_type))
        .cloned()
        .collect()
}

fn cargo_penalty(rules: &Ruleset, unit: &Unit) -> Option<Modifier> {
    let hundreds = unit.cargo_total().checked_div(100).unwrap_or(0);
    (hundreds > 0).then(|| {
        Modifier::percentage(
            "cargo_penalty",
            rules.combat().cargo_penalty_pct.saturating_mul(Decimal::from(hundreds)),
        )
    })
}

/// Offence of `unit` when attacking, after modifiers.
pub fn offence_power(game: &Game, unit: &Unit) -> Result<Decimal, SimError> {
    let rules = game.rules();
    let unit_type = unit.unit_type(rules)?;
    let combat = rules.combat();
    let mut modifiers = scoped(rules, "offence", unit_type);

    if unit_type.naval {
        modifiers.extend(cargo_penalty(rules, unit));
    } else {
        modifiers.push(Modifier::percentage("attack_bonus", combat.attack_bonus_pct));
        let position = game.unit_position(unit);
        let in_colony = position.and_then(|p| game.colony_at(p)).is_some();
        if unit_type.has(Ability::AmbushBonus)
            && let Some(tile) = position.and_then(|p| game.map().tile(p))
        {
            modifiers.push(Modifier::percentage("ambush", tile.defence_pct(rules)?));
        }
        if unit_type.has(Ability::Bombard) && !in_colony {
            modifiers.push(Modifier::percentage(
                "artillery_in_the_open",
                combat.artillery_in_the_open_pct,
            ));
        }
    }
    Ok(apply_modifiers(Decimal::from(base_offence(rules, unit, unit_type)), &modifiers))
}

/// Defence of `unit` when attacked, after modifiers.
pub fn defence_power(game: &Game, unit: &Unit) -> Result<Decimal, SimError> {
    let rules = game.rules();
    let unit_type = unit.unit_type(rules)?;
    let combat = rules.combat();
    let mut modifiers = scoped(rules, "defence", unit_type);

    if unit_type.naval {
        modifiers.extend(cargo_penalty(rules, unit));
    } else {
        let position = game.unit_position(unit);
        let colony = position.and_then(|p| game.colony_at(p));
        if let Some(colony) = colony {
            let settlement = colony.defence_pct(rules);
            if settlement > Decimal::ZERO {
                modifiers.push(Modifier::percentage("settlement", settlement));
            } else {
                modifiers.push(Modifier::percentage("fortified", combat.fortify_bonus_pct));
            }
        } else {
            if let Some(tile) = position.and_then(|p| game.map().tile(p)) {
                let terrain = tile.defence_pct(rules)?;
                if !terrain.is_zero() {
                    modifiers.push(Modifier::percentage("terrain", terrain));
                }
            }
            if unit.is_fortified() {
                modifiers.push(Modifier::percentage("fortified", combat.fortify_bonus_pct));
            }
            if unit_type.has(Ability::Bombard) {
                modifiers.push(Modifier::percentage(
                    "artillery_in_the_open",
                    combat.artillery_in_the_open_pct,
                ));
            }
        }
    }
    Ok(apply_modifiers(Decimal::from(base_defence(rules, unit, unit_type)), &modifiers))
}

/// Powers and primary weights for an attack.
pub fn odds(game: &Game, attacker: UnitId, defender: UnitId) -> Result<CombatOdds, SimError> {
    let a = game.unit(attacker)?;
    let d = game.unit(defender)?;
    let naval = a.unit_type(game.rules())?.naval;
    Ok(CombatOdds::new(offence_power(game, a)?, defence_power(game, d)?, naval))
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Whether `unit` is the only land unit of its owner defending its colony.
/// Whether `owner` has an active land unit standing on the tile at `position`.
fn has_tile_defender(game: &Game, owner: PlayerId, position: Position) -> bool {
    let rules = game.rules();
    game.units_on_tile(position).any(|u| {
        u.owner() == owner && u.is_active() && u.unit_type(rules).is_ok_and(|t| !t.naval)
    })
}

fn is_last_defender(game: &Game, unit: &Unit) -> bool {
    let Some(position) = game.unit_position(unit) else {
        return false;
    };
    let Some(colony) = game.colony_at(position) else {
        return false;
    };
    if colony.owner() != unit.owner() {
        return false;
    }
    let rules = game.rules();
    !game.units_on_tile(position).any(|other| {
        other.id() != unit.id()
            && other.owner() == unit.owner()
            && other.unit_type(rules).is_ok_and(|t| !t.naval)
    })
}

/// Secondary table for `loser` beaten by `winner`.
pub fn consequences(
    game: &Game,
    winner: &Unit,
    loser: &Unit,
    loser_defends: bool,
) -> Result<Vec<(CombatConsequence, u32)>, SimError> {
    let rules = game.rules();
    let normal = rules.combat().normal_result_weight;
    let great = rules.combat().great_result_weight;
    let winner_type = winner.unit_type(rules)?;
    let loser_type = loser.unit_type(rules)?;

    if loser_type.naval {
        if game.repair_location(loser.owner()).is_some() {
            return Ok(vec![
                (CombatConsequence::DamageShip, normal),
                (CombatConsequence::SinkShip, great),
            ]);
        }
        return Ok(vec![(CombatConsequence::SinkShip, 1)]);
    }

    let fighter = loser.is_armed() || loser_type.offence > 0 || loser_type.demoted_to.is_some();
    if fighter {
        if winner_type.promotion.is_some() {
            return Ok(vec![
                (CombatConsequence::DemoteUnit, normal),
                (CombatConsequence::PromoteUnit, great),
            ]);
        }
        return Ok(vec![(CombatConsequence::DemoteUnit, 1)]);
    }

    if loser_defends
        && winner_type.has(Ability::CaptureSettlements)
        && is_last_defender(game, loser)
    {
        return Ok(vec![(CombatConsequence::CaptureColony, 1)]);
    }
    if winner_type.has(Ability::CaptureUnits) {
        return Ok(vec![
            (CombatConsequence::CaptureUnit, normal),
            (CombatConsequence::SlaughterUnit, great),
        ]);
    }
    Ok(vec![(CombatConsequence::SlaughterUnit, 1)])
}

/// Decide the result of an attack without applying it.
pub fn resolve(game: &Game, attacker: UnitId, defender: UnitId, rng: &mut impl Rng) -> Result<CombatResult, SimError> {
    check_attack(game, attacker, defender)?;
    let odds = odds(game, attacker, defender)?;
    let outcome = odds
        .outcomes()
        .sample(rng, "combat outcome")
        .copied()
        .unwrap_or(CombatOutcome::Lose);

    let a = game.unit(attacker)?;
    let d = game.unit(defender)?;
    let consequence = match outcome {
        CombatOutcome::Evade => None,
        CombatOutcome::Win => {
            let table = consequences(game, a, d, true)?;
            WeightedChoice::new(table).sample(rng, "combat consequence").copied()
        }
        CombatOutcome::Lose => {
            let table = consequences(game, d, a, false)?;
            WeightedChoice::new(table).sample(rng, "combat consequence").copied()
        }
    };
    debug!(
        %attacker, %defender,
        offence = %odds.offence, defence = %odds.defence,
        ?outcome, ?consequence,
        "combat resolved"
    );
    Ok(CombatResult {
        outcome,
        consequence,
    })
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Strip the unit's arms, else demote its type, else destroy it.
///
/// Returns `true` when the unit was destroyed.
fn demote(game: &mut Game, rules: &Ruleset, id: UnitId) -> Result<bool, SimError> {
    let unit = game.unit(id)?;
    if unit.is_armed() {
        let downgrade = rules
            .role(unit.role())
            .and_then(|r| r.downgrade)
            .unwrap_or(UnitRole::Default);
        game.unit_mut(id)?.set_role(downgrade);
        return Ok(false);
    }
    if let Some(demoted) = unit.unit_type(rules)?.demoted_to.clone() {
        game.unit_mut(id)?.set_type(demoted);
        return Ok(false);
    }
    game.remove_unit(id)?;
    Ok(true)
}

fn promote(game: &mut Game, rules: &Ruleset, id: UnitId) -> Result<bool, SimError> {
    let Some(promoted) = game.unit(id)?.unit_type(rules)?.promotion.clone() else {
        return Ok(false);
    };
    game.unit_mut(id)?.set_type(promoted);
    Ok(true)
}

/// Hand a unit to `new_owner` on the tile at `at`, taking it off any colony job.
fn capture_unit(game: &mut Game, id: UnitId, new_owner: PlayerId, at: Position) -> Result<(), SimError> {
    if let UnitLocation::Colony(colony) = game.unit(id)?.location() {
        game.colony_mut(colony)?.remove_worker(id);
    }
    let unit = game.unit_mut(id)?;
    unit.set_owner(new_owner);
    unit.set_location(UnitLocation::Tile(at));
    unit.set_moves_left(0);
    unit.unfortify();
    Ok(())
}

/// Carry out `result` of `attacker` attacking `defender`.
pub fn apply(
    game: &mut Game,
    attacker: UnitId,
    defender: UnitId,
    result: CombatResult,
    rng: &mut impl Rng,
) -> Result<CombatReport, SimError> {
    check_attack(game, attacker, defender)?;
    let rules = Arc::clone(game.rules_handle());
    let a = game.unit(attacker)?;
    let d = game.unit(defender)?;
    let attacker_owner = a.owner();
    let defender_owner = d.owner();
    let attacker_at = a.tile().ok_or(SimError::NotOnMap(attacker))?;
    let defender_at = game.unit_position(d).ok_or(SimError::NotOnMap(defender))?;
    let defended_colony = game
        .colony_at(defender_at)
        .filter(|c| c.owner() == defender_owner)
        .map(|c| c.id());
    let multiple_attacks = a.unit_type(&rules)?.has(Ability::MultipleAttacks);

    let mut report = CombatReport {
        result: Some(result),
        ..CombatReport::default()
    };

    let unit = game.unit_mut(attacker)?;
    if !multiple_attacks {
        unit.set_moves_left(0);
    }
    unit.unfortify();

    let (winner, loser, winner_owner, winner_at) = match result.outcome {
        CombatOutcome::Win => (attacker, defender, attacker_owner, attacker_at),
        CombatOutcome::Lose => (defender, attacker, defender_owner, defender_at),
        CombatOutcome::Evade => (attacker, defender, attacker_owner, attacker_at),
    };
    let loser_owner = if loser == attacker { attacker_owner } else { defender_owner };

    match result.consequence {
        None => {}
        Some(CombatConsequence::DamageShip) => match game.repair_location(loser_owner) {
            Some(location) => {
                game.send_for_repair(loser, location)?;
                report.repaired = Some((loser, location));
            }
            None => {
                game.remove_unit(loser)?;
                report.destroyed.push(loser);
            }
        },
        Some(CombatConsequence::SinkShip | CombatConsequence::SlaughterUnit) => {
            game.remove_unit(loser)?;
            report.destroyed.push(loser);
        }
        Some(CombatConsequence::CaptureUnit) => {
            capture_unit(game, loser, winner_owner, winner_at)?;
            report.captured.push(loser);
        }
        Some(CombatConsequence::DemoteUnit) => {
            if demote(game, &rules, loser)? {
                report.destroyed.push(loser);
            } else {
                report.demoted = Some(loser);
            }
        }
        Some(CombatConsequence::PromoteUnit) => {
            if promote(game, &rules, winner)? {
                report.promoted = Some(winner);
            }
            if demote(game, &rules, loser)? {
                report.destroyed.push(loser);
            } else {
                report.demoted = Some(loser);
            }
        }
        Some(CombatConsequence::CaptureColony) => {
            let colony = defended_colony.ok_or(SimError::IllegalAttack {
                attacker,
                defender,
                reason: "no colony to capture",
            })?;
            if let Some(range) = rules.combat().plunder.as_ref() {
                let wanted = range.amount("plunder", rng, false);
                let taken = game.player_mut(loser_owner)?.remove_gold(wanted);
                game.player_mut(winner_owner)?.add_gold(taken);
                report.plunder = taken;
            }
            let workers: Vec<UnitId> = game.colony(colony)?.workers().collect();
            game.transfer_colony(colony, winner_owner)?;
            if game.unit(loser)?.location() == UnitLocation::Colony(colony) {
                game.unit_mut(loser)?.set_owner(winner_owner);
            } else {
                capture_unit(game, loser, winner_owner, defender_at)?;
            }
            report.captured.push(loser);
            report.captured.extend(workers.into_iter().filter(|w| *w != loser));
            game.unit_mut(winner)?.set_location(UnitLocation::Tile(defender_at));
            report.captured_colony = Some(colony);
        }
    }

    let combat = rules.combat();
    let tension = game.player_mut(defender_owner)?.tension_mut(attacker_owner);
    tension.modify(combat.tension_on_attack);
    if report.destroyed.contains(&defender) {
        tension.modify(combat.tension_on_unit_destroyed);
    }
    if let Some(colony) = defended_colony {
        game.colony_mut(colony)?
            .alarm_mut(attacker_owner)
            .modify(combat.alarm_on_colony_attacked);
    }

    info!(
        %attacker, %defender,
        outcome = ?result.outcome, consequence = ?result.consequence,
        destroyed = report.destroyed.len(), captured = report.captured.len(),
        "combat applied"
    );
    Ok(report)
}

/// Resolve and apply an attack.
pub fn attack(game: &mut Game, attacker: UnitId, defender: UnitId, rng: &mut impl Rng) -> Result<CombatReport, SimError> {
    let result = resolve(game, attacker, defender, rng)?;
    apply(game, attacker, defender, result, rng)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rust_decimal_macros::dec;

    use colonia_types::{PlayerKind, Stance, TileAddition, TileTypeId};
    use colonia_world::Map;

    use super::*;

    struct Setup {
        game: Game,
        red: PlayerId,
        blue: PlayerId,
    }

    fn setup() -> Setup {
        let rules = Arc::new(Ruleset::classic().unwrap());
        let map = Map::new(10, 10, &TileTypeId::new("plains")).unwrap();
        let mut game = Game::new(rules, map);
        for x in 6..10 {
            for y in 0..10 {
                game.map_mut().set_tile_type(Position::new(x, y), TileTypeId::new("ocean")).unwrap();
            }
        }
        let red = game.add_player("Red", PlayerKind::European);
        let blue = game.add_player("Blue", PlayerKind::European);
        Setup { game, red, blue }
    }

    fn at(x: u32, y: u32) -> UnitLocation {
        UnitLocation::Tile(Position::new(x, y))
    }

    #[test]
    fn land_odds_have_no_evasion() {
        let odds = CombatOdds::new(dec!(3), dec!(1), false);
        assert_eq!((odds.win, odds.evade, odds.lose), (75, 0, 25));
    }

    #[test]
    fn naval_odds_include_evasion() {
        let odds = CombatOdds::new(dec!(8), dec!(10), true);
        // v = 0.444.., win 44, evade round(11.1) = 11
        assert_eq!((odds.win, odds.evade, odds.lose), (44, 11, 45));
        assert_eq!(odds.outcomes().total_weight(), 100);
    }

    #[test]
    fn peaceful_players_cannot_fight() {
        let Setup { mut game, red, blue } = setup();
        let soldier = game.add_unit(red, "veteran_soldier", at(2, 2)).unwrap();
        let target = game.add_unit(blue, "free_colonist", at(3, 2)).unwrap();
        game.unit_mut(soldier).unwrap().set_role(UnitRole::Soldier);
        let before = game.clone();
        let mut rng = SmallRng::seed_from_u64(3);
        assert!(matches!(
            attack(&mut game, soldier, target, &mut rng),
            Err(SimError::IllegalAttack { reason: "players are not at war", .. })
        ));
        assert_eq!(game.unit(soldier).unwrap(), before.unit(soldier).unwrap());
    }

    #[test]
    fn other_preconditions() {
        let Setup { mut game, red, blue } = setup();
        game.set_stance(red, blue, Stance::War).unwrap();
        let colonist = game.add_unit(red, "free_colonist", at(2, 2)).unwrap();
        let far = game.add_unit(blue, "free_colonist", at(5, 5)).unwrap();
        let near = game.add_unit(blue, "free_colonist", at(3, 2)).unwrap();
        let ship = game.add_unit(blue, "caravel", at(6, 2)).unwrap();

        let reason = |result: Result<(), SimError>| match result {
            Err(SimError::IllegalAttack { reason, .. }) => reason,
            _ => "",
        };
        assert_eq!(reason(check_attack(&game, colonist, near)), "attacker has no offence");
        game.unit_mut(colonist).unwrap().set_role(UnitRole::Soldier);
        assert_eq!(reason(check_attack(&game, colonist, far)), "units are not adjacent");
        assert_eq!(reason(check_attack(&game, near, near)), "a unit cannot attack itself");
        game.unit_mut(near).unwrap().set_role(UnitRole::Soldier);
        assert_eq!(reason(check_attack(&game, near, ship)), "units have the same owner");
        assert!(check_attack(&game, colonist, near).is_ok());
        game.unit_mut(colonist).unwrap().set_moves_left(0);
        assert_eq!(reason(check_attack(&game, colonist, near)), "attacker has no moves left");
    }

    #[test]
    fn privateers_attack_without_war() {
        let Setup { mut game, red, blue } = setup();
        let privateer = game.add_unit(red, "privateer", at(7, 2)).unwrap();
        let galleon = game.add_unit(blue, "galleon", at(8, 2)).unwrap();
        assert!(check_attack(&game, privateer, galleon).is_ok());
        let soldier = game.add_unit(red, "free_colonist", at(5, 2)).unwrap();
        game.unit_mut(soldier).unwrap().set_role(UnitRole::Soldier);
        assert_eq!(
            check_attack(&game, privateer, soldier).err().map(|e| e.to_string()),
            Some(format!(
                "illegal attack by {privateer} on {soldier}: units are not adjacent"
            ))
        );
    }

    #[test]
    fn terrain_and_fortification_raise_defence() {
        let Setup { mut game, blue, .. } = setup();
        let defender = game.add_unit(blue, "free_colonist", at(3, 3)).unwrap();
        assert_eq!(defence_power(&game, game.unit(defender).unwrap()).unwrap(), dec!(1));
        game.map_mut().tile_mut(Position::new(3, 3)).unwrap().set_addition(TileAddition::Hills);
        assert_eq!(defence_power(&game, game.unit(defender).unwrap()).unwrap(), dec!(2));
        let unit = game.unit_mut(defender).unwrap();
        unit.fortify();
        unit.complete_fortification();
        assert_eq!(defence_power(&game, game.unit(defender).unwrap()).unwrap(), dec!(2.5));
    }

    #[test]
    fn veterans_and_artillery_modifiers() {
        let Setup { mut game, red, .. } = setup();
        let veteran = game.add_unit(red, "veteran_soldier", at(2, 2)).unwrap();
        game.unit_mut(veteran).unwrap().set_role(UnitRole::Soldier);
        // 2 * (100 + 50 expert + 50 attack) / 100
        assert_eq!(offence_power(&game, game.unit(veteran).unwrap()).unwrap(), dec!(4));
        let artillery = game.add_unit(red, "artillery", at(2, 3)).unwrap();
        // 5 * (100 + 50 - 75) / 100
        assert_eq!(offence_power(&game, game.unit(artillery).unwrap()).unwrap(), dec!(3.75));
    }

    #[test]
    fn cargo_slows_ships_down() {
        let Setup { mut game, blue, .. } = setup();
        let galleon = game.add_unit(blue, "galleon", at(8, 2)).unwrap();
        game.unit_mut(galleon).unwrap().load(colonia_types::GoodsTypeId::new("furs"), 200);
        // 10 * (100 - 25) / 100
        assert_eq!(defence_power(&game, game.unit(galleon).unwrap()).unwrap(), dec!(7.5));
    }

    #[test]
    fn consequence_tables() {
        let Setup { mut game, red, blue } = setup();
        let colonist = game.add_unit(red, "free_colonist", at(2, 2)).unwrap();
        let brave_owner = game.add_player("Arawak", PlayerKind::Native);
        let brave = game.add_unit(brave_owner, "brave", at(3, 2)).unwrap();
        let victim = game.add_unit(blue, "free_colonist", at(2, 3)).unwrap();

        let table = |game: &Game, w: UnitId, l: UnitId| {
            consequences(game, game.unit(w).unwrap(), game.unit(l).unwrap(), true)
                .unwrap()
                .into_iter()
                .map(|(c, _)| c)
                .collect::<Vec<_>>()
        };
        // Unarmed loser against a capturing winner.
        assert_eq!(
            table(&game, colonist, victim),
            vec![CombatConsequence::CaptureUnit, CombatConsequence::SlaughterUnit]
        );
        // Braves cannot capture.
        assert_eq!(table(&game, brave, victim), vec![CombatConsequence::SlaughterUnit]);
        // Armed loser against a winner that can be promoted.
        game.unit_mut(victim).unwrap().set_role(UnitRole::Soldier);
        assert_eq!(
            table(&game, colonist, victim),
            vec![CombatConsequence::DemoteUnit, CombatConsequence::PromoteUnit]
        );
        // Ships without a repair location sink.
        game.player_mut(blue).unwrap().set_home_port(false);
        let ship = game.add_unit(blue, "merchantman", at(7, 7)).unwrap();
        let privateer = game.add_unit(red, "privateer", at(7, 8)).unwrap();
        assert_eq!(table(&game, privateer, ship), vec![CombatConsequence::SinkShip]);
    }

    #[test]
    fn last_defender_loses_the_colony() {
        let Setup { mut game, red, blue } = setup();
        game.set_stance(red, blue, Stance::War).unwrap();
        game.player_mut(blue).unwrap().add_gold(300);
        let colony = game.found_colony(blue, "Fort", Position::new(3, 3)).unwrap();
        let defender = game.add_unit(blue, "free_colonist", at(3, 3)).unwrap();
        let worker = game.add_unit(blue, "free_colonist", UnitLocation::Colony(colony)).unwrap();
        game.assign_to_building(colony, worker, "town_hall").unwrap();
        let soldier = game.add_unit(red, "free_colonist", at(2, 3)).unwrap();
        game.unit_mut(soldier).unwrap().set_role(UnitRole::Soldier);

        let table = consequences(&game, game.unit(soldier).unwrap(), game.unit(defender).unwrap(), true).unwrap();
        assert_eq!(table, vec![(CombatConsequence::CaptureColony, 1)]);

        let mut rng = SmallRng::seed_from_u64(11);
        let result = CombatResult {
            outcome: CombatOutcome::Win,
            consequence: Some(CombatConsequence::CaptureColony),
        };
        let report = apply(&mut game, soldier, defender, result, &mut rng).unwrap();
        assert_eq!(report.captured_colony, Some(colony));
        assert_eq!(game.colony(colony).unwrap().owner(), red);
        assert_eq!(game.unit(worker).unwrap().owner(), red);
        assert_eq!(game.unit(defender).unwrap().owner(), red);
        assert_eq!(game.unit(soldier).unwrap().tile(), Some(Position::new(3, 3)));
        assert!(report.plunder >= 100 && report.plunder <= 300);
        assert_eq!(game.player(red).unwrap().gold(), report.plunder);
        // Alarm toward the attacker is recorded on the colony.
        assert_eq!(game.colony(colony).unwrap().alarm(red).value(), 500);
    }

    #[test]
    fn demotion_strips_arms_then_destroys() {
        let Setup { mut game, red, blue } = setup();
        game.set_stance(red, blue, Stance::War).unwrap();
        let attacker = game.add_unit(red, "king_regular", at(2, 2)).unwrap();
        let defender = game.add_unit(blue, "free_colonist", at(3, 2)).unwrap();
        game.unit_mut(defender).unwrap().set_role(UnitRole::Dragoon);
        let result = CombatResult {
            outcome: CombatOutcome::Win,
            consequence: Some(CombatConsequence::DemoteUnit),
        };
        let mut rng = SmallRng::seed_from_u64(5);

        let report = apply(&mut game, attacker, defender, result, &mut rng).unwrap();
        assert_eq!(report.demoted, Some(defender));
        assert_eq!(game.unit(defender).unwrap().role(), UnitRole::Soldier);
        // Multiple attacks keep the attacker's moves.
        assert!(game.unit(attacker).unwrap().moves_left() > 0);
        assert_eq!(game.player(blue).unwrap().tension(red).value(), 1000);

        let artillery = game.add_unit(blue, "artillery", at(3, 3)).unwrap();
        apply(&mut game, attacker, artillery, result, &mut rng).unwrap();
        assert_eq!(game.unit(artillery).unwrap().type_id().as_str(), "damaged_artillery");

        let brave_owner = game.add_player("Arawak", PlayerKind::Native);
        game.set_stance(red, brave_owner, Stance::War).unwrap();
        let brave = game.add_unit(brave_owner, "brave", at(1, 2)).unwrap();
        let report = apply(&mut game, attacker, brave, result, &mut rng).unwrap();
        assert_eq!(report.destroyed, vec![brave]);
        assert!(game.unit(brave).is_err());
    }

    #[test]
    fn great_win_promotes_the_winner() {
        let Setup { mut game, red, blue } = setup();
        game.set_stance(red, blue, Stance::War).unwrap();
        let attacker = game.add_unit(red, "free_colonist", at(2, 2)).unwrap();
        game.unit_mut(attacker).unwrap().set_role(UnitRole::Soldier);
        let defender = game.add_unit(blue, "free_colonist", at(3, 2)).unwrap();
        game.unit_mut(defender).unwrap().set_role(UnitRole::Soldier);
        let result = CombatResult {
            outcome: CombatOutcome::Win,
            consequence: Some(CombatConsequence::PromoteUnit),
        };
        let mut rng = SmallRng::seed_from_u64(5);
        let report = apply(&mut game, attacker, defender, result, &mut rng).unwrap();
        assert_eq!(report.promoted, Some(attacker));
        assert_eq!(game.unit(attacker).unwrap().type_id().as_str(), "veteran_soldier");
        assert_eq!(game.unit(defender).unwrap().role(), UnitRole::Default);
        assert_eq!(game.unit(attacker).unwrap().moves_left(), 0);
    }

    #[test]
    fn resolve_is_reproducible() {
        let Setup { mut game, red, blue } = setup();
        game.set_stance(red, blue, Stance::War).unwrap();
        let attacker = game.add_unit(red, "veteran_soldier", at(2, 2)).unwrap();
        game.unit_mut(attacker).unwrap().set_role(UnitRole::Dragoon);
        let defender = game.add_unit(blue, "free_colonist", at(3, 2)).unwrap();
        let first = resolve(&game, attacker, defender, &mut SmallRng::seed_from_u64(42)).unwrap();
        let second = resolve(&game, attacker, defender, &mut SmallRng::seed_from_u64(42)).unwrap();
        assert_eq!(first, second);
        if first.outcome == CombatOutcome::Win {
            assert!(matches!(
                first.consequence,
                Some(CombatConsequence::CaptureUnit | CombatConsequence::SlaughterUnit)
            ));
        }
    }
}
