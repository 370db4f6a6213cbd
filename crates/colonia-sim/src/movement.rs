//! Moving units across the map.

use serde::{Deserialize, Serialize};
use tracing::debug;

use colonia_types::UnitId;
use colonia_world::{CostDecider, Mover, Position};

use crate::error::SimError;
use crate::game::Game;
use crate::unit::UnitLocation;

/// What a move request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// The unit moved.
    Moved {
        /// Moves spent.
        cost: u32,
        /// Moves left afterwards.
        moves_left: u32,
        /// Tiles newly revealed to the owner.
        revealed: usize,
    },
    /// The step needs a fresh allotment; nothing changed.
    NeedsNewTurn {
        /// Cost the step would have, counting the forfeited remainder.
        cost: u32,
    },
}

/// Move a unit one step to the adjacent tile `to`.
///
/// Damaged or repairing units and units off the map are rejected. A step the
/// unit cannot afford this turn is reported as [`MoveOutcome::NeedsNewTurn`]
/// and leaves the unit where it is.
pub fn move_unit(game: &mut Game, unit_id: UnitId, to: Position) -> Result<MoveOutcome, SimError> {
    let unit = game.unit(unit_id)?;
    if !unit.is_active() {
        return Err(SimError::UnitNotActive(unit_id));
    }
    let from = unit.tile().ok_or(SimError::NotOnMap(unit_id))?;
    let rules = game.rules();
    let unit_type = unit.unit_type(rules)?;
    let initial_moves = unit.initial_moves(rules)?;
    let moves_left = unit.moves_left().min(initial_moves);
    let accumulated = initial_moves.saturating_sub(moves_left);
    let mover = Mover {
        owner: unit.owner(),
        unit_type,
        initial_moves,
    };

    let mut decider = CostDecider::new(rules, unit_type);
    let cost = decider.cost(rules, game.map(), &mover, from, to, moves_left, accumulated)?;
    if decider.is_new_turn() {
        debug!(unit = %unit_id, %from, %to, cost, "move deferred to next turn");
        return Ok(MoveOutcome::NeedsNewTurn { cost });
    }

    let owner = unit.owner();
    let sight = unit_type.line_of_sight;
    let left = decider.moves_left();
    let unit = game.unit_mut(unit_id)?;
    unit.set_moves_left(left);
    unit.set_location(UnitLocation::Tile(to));
    unit.unfortify();
    let revealed = game.map_mut().explore(owner, to, sight);
    debug!(unit = %unit_id, %from, %to, cost, moves_left = left, "unit moved");
    Ok(MoveOutcome::Moved {
        cost,
        moves_left: left,
        revealed,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use colonia_rules::Ruleset;
    use colonia_types::{PlayerKind, TileTypeId};
    use colonia_world::Map;

    use super::*;
    use crate::unit::RepairLocation;

    fn game() -> Game {
        let rules = Arc::new(Ruleset::classic().unwrap());
        let map = Map::new(10, 10, &TileTypeId::new("plains")).unwrap();
        Game::new(rules, map)
    }

    #[test]
    fn moving_spends_moves_and_reveals() {
        let mut game = game();
        let p = game.add_player("Dutch", PlayerKind::European);
        let unit = game.add_unit(p, "free_colonist", UnitLocation::Tile(Position::new(2, 2))).unwrap();
        let outcome = move_unit(&mut game, unit, Position::new(3, 2)).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                cost: 3,
                moves_left: 0,
                revealed: 3
            }
        );
        assert_eq!(game.unit(unit).unwrap().tile(), Some(Position::new(3, 2)));
    }

    #[test]
    fn exhausted_units_wait() {
        let mut game = game();
        let p = game.add_player("Dutch", PlayerKind::European);
        let unit = game.add_unit(p, "free_colonist", UnitLocation::Tile(Position::new(2, 2))).unwrap();
        move_unit(&mut game, unit, Position::new(3, 2)).unwrap();
        let outcome = move_unit(&mut game, unit, Position::new(3, 3)).unwrap();
        assert_eq!(outcome, MoveOutcome::NeedsNewTurn { cost: 3 });
        assert_eq!(game.unit(unit).unwrap().tile(), Some(Position::new(3, 2)));
    }

    #[test]
    fn damaged_units_cannot_move() {
        let mut game = game();
        let p = game.add_player("Dutch", PlayerKind::European);
        game.map_mut().set_tile_type(Position::new(5, 5), TileTypeId::new("ocean")).unwrap();
        game.map_mut().set_tile_type(Position::new(6, 5), TileTypeId::new("ocean")).unwrap();
        let ship = game.add_unit(p, "caravel", UnitLocation::Tile(Position::new(5, 5))).unwrap();
        game.unit_mut(ship).unwrap().damage(RepairLocation::HomePort, 3).unwrap();
        assert!(matches!(
            move_unit(&mut game, ship, Position::new(6, 5)),
            Err(SimError::UnitNotActive(_))
        ));
    }

    #[test]
    fn units_in_port_are_off_the_map() {
        let mut game = game();
        let p = game.add_player("Dutch", PlayerKind::European);
        let ship = game.add_unit(p, "caravel", UnitLocation::HomePort).unwrap();
        assert!(matches!(
            move_unit(&mut game, ship, Position::new(1, 1)),
            Err(SimError::NotOnMap(_))
        ));
    }
}
