//! Scopes: conjunctive predicates that decide whether a feature applies.
//!
//! A [`Scope`] is a list of independent optional constraints -- a type key,
//! an ability with its expected value, a property with its expected value --
//! and it matches when every constraint present is satisfied. Properties go
//! through the enumerated [`ScopeProperty`] accessor table rather than any
//! kind of name-based lookup, so every property a ruleset may test is known
//! at compile time.
//!
//! A feature (modifier, disaster effect) with no scopes applies to
//! everything; with scopes it applies when any one of them matches.

use serde::{Deserialize, Serialize};

use colonia_types::Ability;

/// Boolean property of a scope subject, looked up through
/// [`ScopeSubject::property`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeProperty {
    /// The subject moves on water.
    Naval,
    /// The subject has a positive base offence.
    Offensive,
    /// The subject is a person (can work, can be captured).
    Person,
    /// The subject is an expert in some goods.
    Expert,
}

/// Anything a [`Scope`] can be tested against.
pub trait ScopeSubject {
    /// Ruleset key of the subject's type.
    fn type_key(&self) -> &str;

    /// Whether the subject has `ability`.
    fn has_ability(&self, ability: Ability) -> bool;

    /// Value of `property`, or `None` when the subject has no such property.
    fn property(&self, property: ScopeProperty) -> Option<bool>;
}

/// A conjunction of optional constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Required type key.
    #[serde(default, rename = "type")]
    pub type_key: Option<String>,

    /// Ability that must be present (or absent, see `ability_value`).
    #[serde(default)]
    pub ability: Option<Ability>,

    /// Expected presence of `ability`.
    #[serde(default = "default_true")]
    pub ability_value: bool,

    /// Property to test.
    #[serde(default)]
    pub property: Option<ScopeProperty>,

    /// Expected value of `property`.
    #[serde(default = "default_true")]
    pub property_value: bool,

    /// Invert the overall result.
    #[serde(default)]
    pub match_negated: bool,

    /// Result when there is no subject at all.
    #[serde(default)]
    pub matches_null: bool,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            type_key: None,
            ability: None,
            ability_value: true,
            property: None,
            property_value: true,
            match_negated: false,
            matches_null: false,
        }
    }
}

impl Scope {
    /// Scope matching a single type key.
    pub fn of_type(key: &str) -> Self {
        Self {
            type_key: Some(String::from(key)),
            ..Self::default()
        }
    }

    /// Scope matching subjects that have `ability`.
    pub fn with_ability(ability: Ability) -> Self {
        Self {
            ability: Some(ability),
            ..Self::default()
        }
    }

    /// Scope matching subjects whose `property` equals `value`.
    pub fn with_property(property: ScopeProperty, value: bool) -> Self {
        Self {
            property: Some(property),
            property_value: value,
            ..Self::default()
        }
    }

    /// Test the scope against an optional subject.
    pub fn applies_to<S: ScopeSubject + ?Sized>(&self, subject: Option<&S>) -> bool {
        let Some(subject) = subject else {
            return self.matches_null;
        };

        let type_ok = self
            .type_key
            .as_deref()
            .is_none_or(|key| key == subject.type_key());
        let ability_ok = self
            .ability
            .is_none_or(|ability| subject.has_ability(ability) == self.ability_value);
        let property_ok = self
            .property
            .is_none_or(|property| subject.property(property) == Some(self.property_value));

        (type_ok && ability_ok && property_ok) != self.match_negated
    }
}

/// Whether a feature guarded by `scopes` applies to `subject`.
pub fn scopes_apply<S: ScopeSubject + ?Sized>(scopes: &[Scope], subject: Option<&S>) -> bool {
    scopes.is_empty() || scopes.iter().any(|scope| scope.applies_to(subject))
}

const fn default_true() -> bool {
    true
}
