//! Geography for the Colonia simulation.
//!
//! This crate models the physical world: a rectangular tile grid, the
//! terrain overlay of each tile (forest, hills and mountains, roads, rivers,
//! plowing, special resources), per-player exploration, and the cost of
//! moving a unit from one tile to the next.
//!
//! # Modules
//!
//! - [`cost`] -- Step legality, nominal step cost, and the [`CostDecider`]
//!   that reconciles a step with the unit's remaining movement budget.
//! - [`error`] -- Error types for map and movement operations.
//! - [`map`] -- The [`Map`] grid, neighbour queries and exploration.
//! - [`position`] -- Grid coordinates and compass directions.
//! - [`tile`] -- The [`Tile`] overlay state machine, work amounts for
//!   improvements, and potential production.

pub mod cost;
pub mod error;
pub mod map;
pub mod position;
pub mod tile;

// Re-export primary types at crate root.
pub use cost::{CostDecider, Mover, step_cost};
pub use error::WorldError;
pub use map::Map;
pub use position::{Direction, Position};
pub use tile::{RiverStyle, RoadStyle, Tile};
