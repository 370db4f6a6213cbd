//! The turn pass.
//!
//! Players are processed in id order. For each player:
//!
//! 1. **Colonies** (id order): production, growth, the build queue, the
//!    disaster roll and production penalties.
//! 2. **Units** (id order): repairs advance, fortification completes and the
//!    movement allotment is refilled.
//!
//! Tension and colony alarm then decay toward zero and the turn counter
//! advances. Given the same state and the same seeded generator the pass is
//! deterministic.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use colonia_rules::Ruleset;
use colonia_types::{Ability, ColonyId, PlayerId, UnitId};

use crate::colony::Notice;
use crate::disaster::{DisasterReport, check_disaster};
use crate::error::SimError;
use crate::game::Game;
use crate::production::{ProductionReport, produce};
use crate::unit::{UnitCondition, UnitLocation};

/// Everything that happened during one turn pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    /// The turn that was processed.
    pub turn: u32,
    /// Production per colony.
    pub production: Vec<ProductionReport>,
    /// Births, completed buildings and expired penalties.
    pub notices: Vec<Notice>,
    /// Disasters that struck.
    pub disasters: Vec<DisasterReport>,
    /// Units whose repairs finished.
    pub repaired: Vec<UnitId>,
    /// Units that finished fortifying.
    pub fortified: Vec<UnitId>,
}

/// Run one full turn pass.
///
/// A failure confined to one colony is logged and the pass continues; a
/// fatal error stops it.
pub fn advance_turn(game: &mut Game, rng: &mut impl Rng) -> Result<TurnSummary, SimError> {
    let rules = Arc::clone(&game.rules);
    let mut summary = TurnSummary {
        turn: game.turn,
        ..TurnSummary::default()
    };

    let players: Vec<PlayerId> = game.players.keys().copied().collect();
    for player in players {
        let factory_allowed = game.player(player)?.has_ability(Ability::BuildFactory);
        let colonies: Vec<ColonyId> = game
            .colonies
            .values()
            .filter(|c| c.owner() == player)
            .map(|c| c.id())
            .collect();
        for colony in colonies {
            match colony_turn(game, &rules, colony, factory_allowed, rng, &mut summary) {
                Ok(()) => {}
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => warn!(%colony, %error, "colony turn failed"),
            }
        }
        units_turn(game, &rules, player, &mut summary)?;
    }

    let decay = rules.options().tension_decay;
    for player in game.players.values_mut() {
        player.decay_tension(decay);
    }
    for colony in game.colonies.values_mut() {
        colony.decay_alarm(decay);
    }
    game.turn = game.turn.saturating_add(1);

    info!(
        turn = summary.turn,
        colonies = summary.production.len(),
        notices = summary.notices.len(),
        disasters = summary.disasters.len(),
        repaired = summary.repaired.len(),
        "turn complete"
    );
    Ok(summary)
}

fn colony_turn(
    game: &mut Game,
    rules: &Ruleset,
    id: ColonyId,
    factory_allowed: bool,
    rng: &mut impl Rng,
    summary: &mut TurnSummary,
) -> Result<(), SimError> {
    let colony = game.colonies.get_mut(&id).ok_or(SimError::UnknownColony(id))?;
    let report = produce(rules, &game.map, &game.units, colony, rng)?;
    let owner = colony.owner();
    let position = colony.position();
    let grew = report.grew;
    summary.notices.extend(report.notices.iter().cloned());
    summary.production.push(report);

    if grew {
        let unit = game.add_unit(owner, rules.colony().born_unit.as_str(), UnitLocation::Tile(position))?;
        info!(colony = %id, %unit, "colonist born");
        summary.notices.push(Notice::Born { colony: id, unit });
    }
    if let Some(notice) = game.colony_mut(id)?.process_build_queue(rules, factory_allowed) {
        summary.notices.push(notice);
    }
    if let Some(report) = check_disaster(game, id, rng)? {
        summary.disasters.push(report);
    }
    let expired = game.colony_mut(id)?.tick_penalties();
    summary.notices.extend(expired);
    Ok(())
}

fn units_turn(game: &mut Game, rules: &Ruleset, player: PlayerId, summary: &mut TurnSummary) -> Result<(), SimError> {
    for unit in game.units.values_mut().filter(|u| u.owner() == player) {
        if matches!(unit.condition(), UnitCondition::Damaged { .. }) {
            unit.begin_repair()?;
        }
        if matches!(unit.condition(), UnitCondition::Repairing { .. }) && unit.tick_repair()? {
            debug!(unit = %unit.id(), "repairs finished");
            summary.repaired.push(unit.id());
        }
        if unit.complete_fortification() {
            summary.fortified.push(unit.id());
        }
        let moves = if unit.is_active() { unit.initial_moves(rules)? } else { 0 };
        unit.set_moves_left(moves);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use colonia_rules::ruleset::Options;
    use colonia_types::{PlayerKind, TileTypeId};
    use colonia_world::{Map, Position};

    use super::*;
    use crate::unit::RepairLocation;

    fn quiet_game() -> Game {
        let rules = Ruleset::classic().unwrap().with_options(Options {
            natural_disaster_pct: 0,
            ..Options::default()
        });
        let map = Map::new(8, 8, &TileTypeId::new("plains")).unwrap();
        Game::new(Arc::new(rules), map)
    }

    #[test]
    fn turn_counter_advances() {
        let mut game = quiet_game();
        let mut rng = SmallRng::seed_from_u64(1);
        let first = advance_turn(&mut game, &mut rng).unwrap();
        let second = advance_turn(&mut game, &mut rng).unwrap();
        assert_eq!((first.turn, second.turn, game.turn()), (0, 1, 2));
    }

    #[test]
    fn moves_are_refilled_and_fortification_completes() {
        let mut game = quiet_game();
        let p = game.add_player("Dutch", PlayerKind::European);
        let unit = game.add_unit(p, "free_colonist", UnitLocation::Tile(Position::new(2, 2))).unwrap();
        game.unit_mut(unit).unwrap().set_moves_left(0);
        game.unit_mut(unit).unwrap().fortify();
        let mut rng = SmallRng::seed_from_u64(1);
        let summary = advance_turn(&mut game, &mut rng).unwrap();
        assert_eq!(summary.fortified, vec![unit]);
        let unit = game.unit(unit).unwrap();
        assert_eq!(unit.moves_left(), 3);
        assert!(unit.is_fortified());
    }

    #[test]
    fn damaged_ships_repair_over_three_turns() {
        let mut game = quiet_game();
        let p = game.add_player("Dutch", PlayerKind::European);
        let ship = game.add_unit(p, "caravel", UnitLocation::HomePort).unwrap();
        game.unit_mut(ship).unwrap().damage(RepairLocation::HomePort, 3).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);

        for _ in 0..2 {
            let summary = advance_turn(&mut game, &mut rng).unwrap();
            assert!(summary.repaired.is_empty());
            assert_eq!(game.unit(ship).unwrap().moves_left(), 0);
        }
        let summary = advance_turn(&mut game, &mut rng).unwrap();
        assert_eq!(summary.repaired, vec![ship]);
        assert!(game.unit(ship).unwrap().is_active());
        assert_eq!(game.unit(ship).unwrap().moves_left(), 12);
    }

    #[test]
    fn colonies_produce_each_turn() {
        let mut game = quiet_game();
        let p = game.add_player("Dutch", PlayerKind::European);
        let colony = game.found_colony(p, "Nieuw", Position::new(3, 3)).unwrap();
        let worker = game.add_unit(p, "free_colonist", UnitLocation::Colony(colony)).unwrap();
        game.assign_to_tile(colony, worker, Position::new(4, 3), "food").unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let summary = advance_turn(&mut game, &mut rng).unwrap();
        assert_eq!(summary.production.len(), 1);
        assert!(game.colony(colony).unwrap().goods("food") > 0);
    }

    #[test]
    fn tension_decays() {
        let mut game = quiet_game();
        let a = game.add_player("Dutch", PlayerKind::European);
        let b = game.add_player("Arawak", PlayerKind::Native);
        game.player_mut(b).unwrap().tension_mut(a).modify(300);
        let mut rng = SmallRng::seed_from_u64(1);
        advance_turn(&mut game, &mut rng).unwrap();
        assert_eq!(game.player(b).unwrap().tension(a).value(), 290);
    }

    #[test]
    fn same_seed_same_turn() {
        let build = || {
            let rules = Ruleset::classic().unwrap().with_options(Options {
                natural_disaster_pct: 100,
                ..Options::default()
            });
            let map = Map::new(8, 8, &TileTypeId::new("plains")).unwrap();
            let mut game = Game::new(Arc::new(rules), map);
            let p = game.add_player("Dutch", PlayerKind::European);
            game.player_mut(p).unwrap().add_gold(500);
            let colony = game.found_colony(p, "Nieuw", Position::new(3, 3)).unwrap();
            for _ in 0..2 {
                let worker = game.add_unit(p, "free_colonist", UnitLocation::Colony(colony)).unwrap();
                game.assign_to_building(colony, worker, "town_hall").unwrap();
            }
            game
        };
        let mut first = build();
        let mut second = build();
        let a = advance_turn(&mut first, &mut SmallRng::seed_from_u64(77)).unwrap();
        let b = advance_turn(&mut second, &mut SmallRng::seed_from_u64(77)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.disasters.len(), 1);
    }
}
