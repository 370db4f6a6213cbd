//! End-to-end scenarios across combat, repair, liberty and the turn pass.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use colonia_rules::Ruleset;
use colonia_rules::ruleset::Options;
use colonia_sim::combat::{self, CombatResult};
use colonia_sim::{Game, RepairLocation, SimError, UnitCondition, UnitLocation, advance_turn, move_unit};
use colonia_types::{CombatConsequence, CombatOutcome, PlayerId, PlayerKind, Stance, TileTypeId};
use colonia_world::{Map, Position};

/// A 12x8 map: land on the left, ocean from column 6.
fn coast() -> (Game, PlayerId, PlayerId) {
    let rules = Ruleset::classic().unwrap().with_options(Options {
        natural_disaster_pct: 0,
        ..Options::default()
    });
    let mut map = Map::new(12, 8, &TileTypeId::new("plains")).unwrap();
    for x in 6..12 {
        for y in 0..8 {
            map.set_tile_type(Position::new(x, y), TileTypeId::new("ocean")).unwrap();
        }
    }
    let mut game = Game::new(Arc::new(rules), map);
    let english = game.add_player("English", PlayerKind::European);
    let spanish = game.add_player("Spanish", PlayerKind::European);
    (game, english, spanish)
}

/// Every colony worker belongs to the colony owner and is located inside it.
fn assert_colonies_consistent(game: &Game) {
    for colony in game.colonies() {
        for worker in colony.workers() {
            let unit = game.unit(worker).unwrap();
            assert_eq!(unit.owner(), colony.owner(), "{worker} works for another owner");
            assert_eq!(unit.location(), UnitLocation::Colony(colony.id()), "{worker} works from outside");
        }
    }
}

#[test]
fn privateer_damages_galleon_which_repairs_at_home() {
    let (mut game, english, spanish) = coast();
    let privateer = game.add_unit(english, "privateer", UnitLocation::Tile(Position::new(8, 3))).unwrap();
    let galleon = game.add_unit(spanish, "galleon", UnitLocation::Tile(Position::new(9, 3))).unwrap();
    let mut rng = SmallRng::seed_from_u64(2024);

    // Piracy needs no declaration of war.
    combat::check_attack(&game, privateer, galleon).unwrap();
    let odds = combat::odds(&game, privateer, galleon).unwrap();
    assert_eq!(odds.win + odds.evade + odds.lose, 100);
    assert!(odds.evade > 0);

    let result = CombatResult {
        outcome: CombatOutcome::Win,
        consequence: Some(CombatConsequence::DamageShip),
    };
    let report = combat::apply(&mut game, privateer, galleon, result, &mut rng).unwrap();
    assert_eq!(report.repaired, Some((galleon, RepairLocation::HomePort)));
    assert_eq!(game.unit(galleon).unwrap().location(), UnitLocation::HomePort);
    assert_eq!(game.unit(privateer).unwrap().moves_left(), 0);
    assert_eq!(game.player(spanish).unwrap().tension(english).value(), 200);
    assert_colonies_consistent(&game);

    for turn in 0..3 {
        let summary = advance_turn(&mut game, &mut rng).unwrap();
        let done = summary.repaired.contains(&galleon);
        assert_eq!(done, turn == 2, "repair finished on pass {turn}");
    }
    let galleon = game.unit(galleon).unwrap();
    assert_eq!(galleon.condition(), UnitCondition::Active);
    assert_eq!(galleon.moves_left(), 18);
}

#[test]
fn attack_at_peace_changes_nothing() {
    let (mut game, english, spanish) = coast();
    game.set_stance(english, spanish, Stance::Peace).unwrap();
    let soldier = game.add_unit(english, "veteran_soldier", UnitLocation::Tile(Position::new(2, 2))).unwrap();
    let colony = game.found_colony(spanish, "San Miguel", Position::new(3, 2)).unwrap();
    let defender = game.add_unit(spanish, "free_colonist", UnitLocation::Colony(colony)).unwrap();
    game.assign_to_building(colony, defender, "town_hall").unwrap();
    let tension_before = game.player(spanish).unwrap().tension(english);
    let mut rng = SmallRng::seed_from_u64(1);

    let err = combat::attack(&mut game, soldier, defender, &mut rng).unwrap_err();
    assert!(matches!(err, SimError::IllegalAttack { .. }));
    assert_eq!(game.colony(colony).unwrap().owner(), spanish);
    assert_eq!(game.player(spanish).unwrap().tension(english), tension_before);
    assert_eq!(game.unit(soldier).unwrap().moves_left(), 3);
}

#[test]
fn undefended_colony_is_capturable() {
    let (mut game, english, spanish) = coast();
    game.set_stance(english, spanish, Stance::War).unwrap();
    assert!(game.player(english).unwrap().is_at_war_with(spanish));

    let colony = game.found_colony(spanish, "San Miguel", Position::new(3, 2)).unwrap();
    let worker = game.add_unit(spanish, "free_colonist", UnitLocation::Colony(colony)).unwrap();
    game.assign_to_building(colony, worker, "town_hall").unwrap();
    let attacker = game.add_unit(english, "king_regular", UnitLocation::Tile(Position::new(1, 2))).unwrap();
    move_unit(&mut game, attacker, Position::new(2, 2)).unwrap();

    let table = combat::consequences(
        &game,
        game.unit(attacker).unwrap(),
        game.unit(worker).unwrap(),
        true,
    )
    .unwrap();
    assert_eq!(table, vec![(CombatConsequence::CaptureColony, 1)]);

    let result = CombatResult {
        outcome: CombatOutcome::Win,
        consequence: Some(CombatConsequence::CaptureColony),
    };
    let mut rng = SmallRng::seed_from_u64(3);
    let report = combat::apply(&mut game, attacker, worker, result, &mut rng).unwrap();
    assert_eq!(report.captured_colony, Some(colony));
    assert_eq!(game.colony(colony).unwrap().owner(), english);
    assert!(game.colony(colony).unwrap().is_worker(worker));
    assert_colonies_consistent(&game);
}

#[test]
fn guarded_colony_workers_cannot_be_targeted() {
    let (mut game, english, spanish) = coast();
    game.set_stance(english, spanish, Stance::War).unwrap();
    let colony = game.found_colony(spanish, "San Miguel", Position::new(3, 2)).unwrap();
    let worker = game.add_unit(spanish, "free_colonist", UnitLocation::Colony(colony)).unwrap();
    game.assign_to_building(colony, worker, "town_hall").unwrap();
    let guard = game.add_unit(spanish, "king_regular", UnitLocation::Tile(Position::new(3, 2))).unwrap();
    let attacker = game.add_unit(english, "king_regular", UnitLocation::Tile(Position::new(2, 2))).unwrap();

    let err = combat::check_attack(&game, attacker, worker).unwrap_err();
    assert!(matches!(err, SimError::IllegalAttack { .. }));
    combat::check_attack(&game, attacker, guard).unwrap();

    // Without the guard a captured worker leaves its job.
    game.remove_unit(guard).unwrap();
    let result = CombatResult {
        outcome: CombatOutcome::Win,
        consequence: Some(CombatConsequence::CaptureUnit),
    };
    let mut rng = SmallRng::seed_from_u64(8);
    let report = combat::apply(&mut game, attacker, worker, result, &mut rng).unwrap();
    assert_eq!(report.captured, vec![worker]);
    let captured = game.unit(worker).unwrap();
    assert_eq!(captured.owner(), english);
    assert_eq!(captured.location(), UnitLocation::Tile(Position::new(2, 2)));
    let colony = game.colony(colony).unwrap();
    assert!(!colony.is_worker(worker));
    assert_eq!(colony.unit_count(), 0);
    assert_colonies_consistent(&game);
}

#[test]
fn statesmen_build_liberty_over_turns() {
    let (mut game, english, _) = coast();
    let colony = game.found_colony(english, "Jamestown", Position::new(2, 4)).unwrap();
    for _ in 0..2 {
        let statesman = game.add_unit(english, "elder_statesman", UnitLocation::Colony(colony)).unwrap();
        game.assign_to_building(colony, statesman, "town_hall").unwrap();
    }
    let farmer = game.add_unit(english, "expert_farmer", UnitLocation::Colony(colony)).unwrap();
    game.assign_to_tile(colony, farmer, Position::new(3, 4), "food").unwrap();

    let mut rng = SmallRng::seed_from_u64(5);
    let mut last_sol = 0;
    for _ in 0..10 {
        let summary = advance_turn(&mut game, &mut rng).unwrap();
        let liberty = summary.production.first().unwrap().liberty;
        assert_eq!(liberty.rebels + liberty.tories(), liberty.unit_count);
        assert!(liberty.sol >= last_sol);
        last_sol = liberty.sol;
    }
    assert!(last_sol > 0);
}
