//! Shared identifiers and enumerations for the Colonia simulation core.
//!
//! This crate is the leaf of the workspace. Every other crate speaks in
//! terms of the ids and enums defined here, so the rules registry, the map
//! and the simulation agree on what a unit type or a combat outcome is.
//!
//! # Modules
//!
//! - [`ids`] -- Arena indices (players, units, colonies) and ruleset keys
//!   (goods, tile, unit, building, resource, disaster, effect types)
//! - [`enums`] -- Abilities, roles, tile additions, improvement actions,
//!   combat outcomes and consequences, diplomatic stance

pub mod enums;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::{
    Ability, CombatConsequence, CombatOutcome, ImprovementAction, PlayerKind, Stance,
    TileAddition, UnitRole,
};
pub use ids::{
    BuildingTypeId, ColonyId, DisasterId, EffectId, GoodsTypeId, PlayerId, ResourceTypeId,
    TileTypeId, UnitId, UnitTypeId,
};
