//! Ruleset registry and shared rule machinery for the Colonia simulation.
//!
//! Everything here is either loaded once at startup and frozen, or is a
//! pure helper over such data.
//!
//! # Modules
//!
//! - [`config`] -- Game configuration (`colonia.yaml`) and option overrides.
//! - [`error`] -- [`RulesError`], the configuration error taxonomy.
//! - [`modifier`] -- Decimal offence/defence/production modifiers.
//! - [`random`] -- Labelled draws, [`WeightedChoice`] and [`RandomRange`].
//! - [`ruleset`] -- The validated, immutable [`Ruleset`].
//! - [`scope`] -- Conjunctive [`Scope`] predicates.
//!
//! [`RulesError`]: error::RulesError
//! [`WeightedChoice`]: random::WeightedChoice
//! [`RandomRange`]: random::RandomRange
//! [`Ruleset`]: ruleset::Ruleset
//! [`Scope`]: scope::Scope

pub mod config;
pub mod error;
pub mod modifier;
pub mod random;
pub mod ruleset;
pub mod scope;
mod validation;

pub use config::GameConfig;
pub use error::RulesError;
pub use modifier::{Modifier, ModifierKind, apply_modifiers};
pub use random::{RandomRange, WeightedChoice, random_int, sample};
pub use ruleset::{Ruleset, ShortfallPolicy};
pub use scope::{Scope, ScopeProperty, ScopeSubject};
