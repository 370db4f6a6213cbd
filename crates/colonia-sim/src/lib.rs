//! Simulation rules for Colonia: players, units, colonies and the turn pass.
//!
//! This crate holds the game state and everything that mutates it. It sits
//! between `colonia-rules` (the data-driven ruleset) and `colonia-world`
//! (terrain and movement cost) below, and the engine binary above.
//!
//! # Modules
//!
//! - [`game`] -- The arena owning players, units and colonies ([`Game`])
//! - [`player`] -- Players, stances and tension toward each other
//! - [`tension`] -- Bounded tension values and their named levels
//! - [`unit`] -- Units, their locations and the damage/repair lifecycle
//! - [`movement`] -- Moving units one step at a time
//! - [`colony`] -- Colonies: stock, workers, buildings, queue and penalties
//! - [`liberty`] -- Sons of Liberty membership
//! - [`production`] -- Net production per colony ([`ProductionEngine`])
//! - [`combat`] -- Attack preconditions, odds, resolution and consequences
//! - [`disaster`] -- Natural disasters and their effects
//! - [`turn`] -- The full turn pass ([`advance_turn`])
//! - [`error`] -- Error types for all simulation operations ([`SimError`])

pub mod colony;
pub mod combat;
pub mod disaster;
pub mod error;
pub mod game;
pub mod liberty;
pub mod movement;
pub mod player;
pub mod production;
pub mod tension;
pub mod turn;
pub mod unit;

// Re-export primary types at crate root for convenience.
pub use colony::{Colony, Notice};
pub use combat::{CombatOdds, CombatReport, CombatResult, attack, check_attack};
pub use disaster::{DisasterReport, EffectOutcome, apply_disaster, check_disaster};
pub use error::SimError;
pub use game::Game;
pub use liberty::Liberty;
pub use movement::{MoveOutcome, move_unit};
pub use player::Player;
pub use production::{NetProduction, ProductionEngine, ProductionReport, produce};
pub use tension::{Tension, TensionLevel};
pub use turn::{TurnSummary, advance_turn};
pub use unit::{RepairLocation, Unit, UnitCondition, UnitLocation};
