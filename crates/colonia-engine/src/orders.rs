//! Scripted orders for every player.
//!
//! The engine has no human or remote decision makers, so each turn every
//! active armed unit and every armed ship follows a fixed doctrine:
//!
//! 1. Attack the first legal target on an adjacent tile.
//! 2. Otherwise, land units march one step toward the nearest colony of a
//!    player they are at war with. Ships hold position.
//!
//! Units are processed in id order, so the orders are deterministic for a
//! given game state and generator.

use rand::Rng;
use tracing::debug;

use colonia_sim::combat::{self, CombatReport};
use colonia_sim::{Game, MoveOutcome, move_unit};
use colonia_types::UnitId;
use colonia_world::Position;

use crate::error::EngineError;

/// What the scripted orders did this turn.
#[derive(Debug, Clone, Default)]
pub struct OrdersReport {
    /// Steps taken.
    pub moves: u32,
    /// Attacks carried out.
    pub attacks: Vec<CombatReport>,
}

/// Issue orders for every unit of every player.
pub fn issue_orders(game: &mut Game, rng: &mut impl Rng) -> Result<OrdersReport, EngineError> {
    let mut report = OrdersReport::default();
    let fighters: Vec<UnitId> = game
        .units()
        .filter(|u| u.is_active() && u.tile().is_some())
        .filter(|u| {
            u.unit_type(game.rules())
                .is_ok_and(|t| t.offence > 0 || u.is_armed())
        })
        .map(|u| u.id())
        .collect();

    for id in fighters {
        // Earlier fights may have removed or captured the unit.
        let Ok(unit) = game.unit(id) else { continue };
        if !unit.is_active() || unit.moves_left() == 0 {
            continue;
        }
        let naval = unit.unit_type(game.rules()).is_ok_and(|t| t.naval);
        if let Some(target) = adjacent_target(game, id) {
            report.attacks.push(combat::attack(game, id, target, rng)?);
            continue;
        }
        if naval {
            continue;
        }
        if let Some(step) = next_step(game, id) {
            match move_unit(game, id, step)? {
                MoveOutcome::Moved { .. } => report.moves = report.moves.saturating_add(1),
                MoveOutcome::NeedsNewTurn { .. } => {}
            }
        }
    }
    debug!(moves = report.moves, attacks = report.attacks.len(), "orders issued");
    Ok(report)
}

/// First unit `attacker` may legally attack right now.
fn adjacent_target(game: &Game, attacker: UnitId) -> Option<UnitId> {
    game.units()
        .map(|u| u.id())
        .find(|defender| combat::check_attack(game, attacker, *defender).is_ok())
}

/// Neighbouring tile that brings `unit` closest to an enemy colony.
fn next_step(game: &Game, unit: UnitId) -> Option<Position> {
    let unit = game.unit(unit).ok()?;
    let from = unit.tile()?;
    let player = game.player(unit.owner()).ok()?;
    let target = game
        .colonies()
        .filter(|c| player.is_at_war_with(c.owner()))
        .map(|c| c.position())
        .min_by_key(|p| (from.distance(*p), *p))?;

    let rules = game.rules();
    game.map()
        .neighbours(from)
        .map(|(_, p)| p)
        .filter(|p| {
            game.map().tile(*p).is_some_and(|t| {
                t.settlement().is_none() && t.is_water(rules).is_ok_and(|water| !water)
            })
        })
        .filter(|p| game.units_on_tile(*p).all(|other| other.owner() == unit.owner()))
        .filter(|p| p.distance(target) < from.distance(target))
        .min_by_key(|p| (p.distance(target), *p))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use colonia_rules::Ruleset;
    use colonia_sim::UnitLocation;
    use colonia_types::{GoodsTypeId, PlayerKind, Stance, TileTypeId, UnitRole};
    use colonia_world::Map;

    use super::*;

    #[test]
    fn soldiers_march_on_enemy_colonies() {
        let rules = Arc::new(Ruleset::classic().unwrap());
        let map = Map::new(10, 6, &TileTypeId::new("plains")).unwrap();
        let mut game = Game::new(rules, map);
        let red = game.add_player("Red", PlayerKind::European);
        let blue = game.add_player("Blue", PlayerKind::European);
        game.set_stance(red, blue, Stance::War).unwrap();
        game.found_colony(blue, "Target", Position::new(8, 2)).unwrap();
        let regular = game.add_unit(red, "king_regular", UnitLocation::Tile(Position::new(1, 2))).unwrap();

        let mut rng = SmallRng::seed_from_u64(4);
        let report = issue_orders(&mut game, &mut rng).unwrap();
        assert_eq!(report.moves, 1);
        assert!(report.attacks.is_empty());
        assert_eq!(game.unit(regular).unwrap().tile().map(|p| p.x), Some(2));
    }

    #[test]
    fn adjacent_enemies_are_attacked() {
        let rules = Arc::new(Ruleset::classic().unwrap());
        let map = Map::new(6, 6, &TileTypeId::new("plains")).unwrap();
        let mut game = Game::new(rules, map);
        let red = game.add_player("Red", PlayerKind::European);
        let blue = game.add_player("Blue", PlayerKind::European);
        game.set_stance(red, blue, Stance::War).unwrap();
        let soldier = game.add_unit(red, "veteran_soldier", UnitLocation::Tile(Position::new(2, 2))).unwrap();
        let colony = game.found_colony(red, "Home", Position::new(2, 2)).unwrap();
        let rules = Arc::clone(game.rules_handle());
        game.colony_mut(colony).unwrap().add_goods(&rules, &GoodsTypeId::new("muskets"), 50);
        game.equip_unit(colony, soldier, UnitRole::Soldier).unwrap();
        game.add_unit(blue, "free_colonist", UnitLocation::Tile(Position::new(3, 2))).unwrap();

        let mut rng = SmallRng::seed_from_u64(4);
        let report = issue_orders(&mut game, &mut rng).unwrap();
        assert_eq!(report.attacks.len(), 1);
        assert_eq!(game.unit(soldier).unwrap().moves_left(), 0);
    }
}
