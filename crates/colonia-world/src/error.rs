//! Error types for the `colonia-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`]. Every
//! variant except [`WorldError::BudgetInconsistency`] is a rejected
//! operation that left the map untouched; a budget inconsistency means the
//! caller's movement bookkeeping is corrupt and the turn must not continue.

use colonia_types::{ImprovementAction, PlayerId, UnitTypeId};

use crate::position::Position;

/// Errors that can occur during map and movement operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A map cannot have a zero dimension.
    #[error("invalid map dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A position lies outside the map.
    #[error("position {0} is off the map")]
    OffMap(Position),

    /// A tile references a tile type the ruleset does not define.
    #[error("unknown tile type: {0}")]
    UnknownTileType(String),

    /// A step between positions that are not neighbours.
    #[error("{from} is not adjacent to {to}")]
    NotAdjacent {
        /// Origin.
        from: Position,
        /// Destination.
        to: Position,
    },

    /// The mover's owner has not explored the destination.
    #[error("{player} has not explored {position}")]
    Unexplored {
        /// The mover's owner.
        player: PlayerId,
        /// The destination.
        position: Position,
    },

    /// The destination terrain cannot be entered by this unit type.
    #[error("{unit_type} cannot enter {position}: {reason}")]
    IllegalTerrain {
        /// The mover's type.
        unit_type: UnitTypeId,
        /// The destination.
        position: Position,
        /// Why the step is illegal.
        reason: &'static str,
    },

    /// The improvement cannot be carried out on this tile.
    #[error("{action:?} is not possible at {position}")]
    ImprovementNotAllowed {
        /// The improvement.
        action: ImprovementAction,
        /// The tile.
        position: Position,
    },

    /// A road or river style string is malformed.
    #[error("invalid improvement style {style:?}: {reason}")]
    InvalidStyle {
        /// The offending string.
        style: String,
        /// Description of the problem.
        reason: &'static str,
    },

    /// Moves left plus moves already spent exceed the unit's allotment.
    #[error(
        "movement budget inconsistent: {moves_left} left + {accumulated} spent > {initial} initial"
    )]
    BudgetInconsistency {
        /// Moves left before the step.
        moves_left: u32,
        /// Moves spent earlier this turn.
        accumulated: u32,
        /// The unit's full allotment.
        initial: u32,
    },
}
