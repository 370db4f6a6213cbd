//! Error types for the colonia-sim crate.
//!
//! Operations that can fail return typed errors rather than panicking. Most
//! variants are rejected preconditions: the operation checked everything
//! before mutating, so the game state is exactly as it was. A few variants
//! are internal-consistency failures; [`SimError::is_fatal`] tells them apart
//! and the turn pass stops on them.

use colonia_rules::RulesError;
use colonia_types::{ColonyId, GoodsTypeId, PlayerId, UnitId, UnitRole};
use colonia_world::{Position, WorldError};

/// Errors that can occur during simulation operations.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A ruleset lookup or configuration failure.
    #[error(transparent)]
    Rules(#[from] RulesError),

    /// A map or movement failure.
    #[error(transparent)]
    World(#[from] WorldError),

    /// Player with the given id was not found.
    #[error("player not found: {0}")]
    UnknownPlayer(PlayerId),

    /// Unit with the given id was not found.
    #[error("unit not found: {0}")]
    UnknownUnit(UnitId),

    /// Colony with the given id was not found.
    #[error("colony not found: {0}")]
    UnknownColony(ColonyId),

    /// A ruleset key the game state refers to is not defined.
    #[error("unknown {kind}: {id}")]
    UnknownKey {
        /// Section name.
        kind: &'static str,
        /// The missing key.
        id: String,
    },

    /// The ruleset has no definition for a role.
    #[error("unknown role: {}", .0.key())]
    UnknownRole(UnitRole),

    /// A unit condition transition that is not allowed from its current state.
    #[error("{unit} cannot {action} while {state}")]
    InvalidTransition {
        /// The unit.
        unit: UnitId,
        /// What was attempted.
        action: &'static str,
        /// Its current condition.
        state: &'static str,
    },

    /// The unit is damaged or under repair.
    #[error("{0} is not active")]
    UnitNotActive(UnitId),

    /// The unit is not standing on a map tile.
    #[error("{0} is not on the map")]
    NotOnMap(UnitId),

    /// An attack failed its preconditions.
    #[error("illegal attack by {attacker} on {defender}: {reason}")]
    IllegalAttack {
        /// Attacking unit.
        attacker: UnitId,
        /// Defending unit.
        defender: UnitId,
        /// Which precondition failed.
        reason: &'static str,
    },

    /// The unit does not belong to the player who owns the colony.
    #[error("{unit} does not belong to the owner of {colony}")]
    WrongOwner {
        /// The unit.
        unit: UnitId,
        /// The colony.
        colony: ColonyId,
    },

    /// Only persons can work in a colony.
    #[error("{0} is not a person")]
    NotAPerson(UnitId),

    /// The position is not one of the colony's work tiles.
    #[error("{position} is not a work tile of {colony}")]
    UnknownWorkTile {
        /// The colony.
        colony: ColonyId,
        /// The position.
        position: Position,
    },

    /// Another unit already works the tile.
    #[error("{position} is already worked by {worker}")]
    TileOccupied {
        /// The tile.
        position: Position,
        /// The unit working it.
        worker: UnitId,
    },

    /// Water tiles need a building with the `work_water` ability.
    #[error("working water at {0} needs docks")]
    NeedsWorkWater(Position),

    /// The tile yields nothing of the requested goods.
    #[error("{position} cannot produce {goods}")]
    CannotProduce {
        /// The tile.
        position: Position,
        /// The goods.
        goods: GoodsTypeId,
    },

    /// The building has not been built yet.
    #[error("{0} has not been built")]
    BuildingNotBuilt(String),

    /// All worker slots of the building are taken.
    #[error("{0} has no free worker slot")]
    BuildingFull(String),

    /// The unit is not working in the colony.
    #[error("{unit} does not work in {colony}")]
    NotAWorker {
        /// The colony.
        colony: ColonyId,
        /// The unit.
        unit: UnitId,
    },

    /// The building is already at its top level.
    #[error("{building} is already at its top level {level}")]
    MaxLevel {
        /// The building.
        building: String,
        /// Its current level.
        level: u32,
    },

    /// The next level is a factory and the owner lacks `build_factory`.
    #[error("{0} cannot become a factory without the build_factory ability")]
    FactoryNotAllowed(String),

    /// The colony is too small for the next level.
    #[error("{building} needs {required} colonists, the colony has {actual}")]
    InsufficientPopulation {
        /// The building.
        building: String,
        /// Population required.
        required: u32,
        /// Current population.
        actual: u32,
    },

    /// The colony lacks the goods for an operation.
    #[error("needs {required} {goods}, only {available} in stock")]
    InsufficientGoods {
        /// The goods.
        goods: GoodsTypeId,
        /// Amount required.
        required: u32,
        /// Amount available.
        available: u32,
    },

    /// The unit cannot take up the role.
    #[error("{unit} cannot take the {} role", .role.key())]
    CannotEquip {
        /// The unit.
        unit: UnitId,
        /// The requested role.
        role: UnitRole,
    },

    /// A colony cannot be founded at the position.
    #[error("cannot found a colony at {position}: {reason}")]
    InvalidColonySite {
        /// The position.
        position: Position,
        /// Why not.
        reason: &'static str,
    },

    /// Liberty figures derived from the stock do not add up.
    #[error("liberty of {colony} is inconsistent: {reason}")]
    LibertyInconsistency {
        /// The colony.
        colony: ColonyId,
        /// What did not add up.
        reason: String,
    },
}

impl SimError {
    /// Whether the error means the game state can no longer be trusted.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Rules(_)
                | Self::World(WorldError::BudgetInconsistency { .. })
                | Self::LibertyInconsistency { .. }
        )
    }
}

/// Error for a missing ruleset key.
pub(crate) fn unknown(kind: &'static str, id: impl ToString) -> SimError {
    SimError::UnknownKey {
        kind,
        id: id.to_string(),
    }
}
