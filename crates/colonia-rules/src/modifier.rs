//! Numeric modifiers applied to offence, defence and production values.
//!
//! Modifiers are kept in [`Decimal`] so that percentage bonuses never
//! introduce floating-point drift into game state. Application order is
//! fixed: all additive modifiers are summed onto the base, then all
//! percentages are summed and applied once, then multiplicative modifiers
//! are applied in sequence.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::scope::{Scope, ScopeSubject, scopes_apply};

/// How a modifier combines with the value it modifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    /// Added to the base value.
    Additive,
    /// Percentage of the value (50 means +50%).
    Percentage,
    /// Factor multiplied into the value.
    Multiplicative,
}

/// A scoped numeric modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    /// What the modifier modifies (`offence`, `defence`, ...).
    pub id: String,
    /// How it combines.
    pub kind: ModifierKind,
    /// Amount.
    pub value: Decimal,
    /// Subjects the modifier applies to; empty means all.
    #[serde(default)]
    pub scopes: Vec<Scope>,
}

impl Modifier {
    /// Unscoped additive modifier.
    pub fn additive(id: &str, value: Decimal) -> Self {
        Self::unscoped(id, ModifierKind::Additive, value)
    }

    /// Unscoped percentage modifier.
    pub fn percentage(id: &str, value: Decimal) -> Self {
        Self::unscoped(id, ModifierKind::Percentage, value)
    }

    /// Unscoped multiplicative modifier.
    pub fn multiplicative(id: &str, value: Decimal) -> Self {
        Self::unscoped(id, ModifierKind::Multiplicative, value)
    }

    fn unscoped(id: &str, kind: ModifierKind, value: Decimal) -> Self {
        Self {
            id: String::from(id),
            kind,
            value,
            scopes: Vec::new(),
        }
    }

    /// Whether the modifier applies to `subject`.
    pub fn applies_to<S: ScopeSubject + ?Sized>(&self, subject: &S) -> bool {
        scopes_apply(&self.scopes, Some(subject))
    }
}

/// Apply modifiers to a base value.
pub fn apply_modifiers<'a>(base: Decimal, modifiers: impl IntoIterator<Item = &'a Modifier>) -> Decimal {
    let mut additive = Decimal::ZERO;
    let mut percentage = Decimal::ZERO;
    let mut factors = Vec::new();

    for modifier in modifiers {
        match modifier.kind {
            ModifierKind::Additive => additive = additive.saturating_add(modifier.value),
            ModifierKind::Percentage => percentage = percentage.saturating_add(modifier.value),
            ModifierKind::Multiplicative => factors.push(modifier.value),
        }
    }

    let mut value = base.saturating_add(additive);
    if !percentage.is_zero() {
        let factor = Decimal::ONE_HUNDRED
            .saturating_add(percentage)
            .checked_div(Decimal::ONE_HUNDRED)
            .unwrap_or(Decimal::ONE);
        value = value.saturating_mul(factor);
    }
    for factor in factors {
        value = value.saturating_mul(factor);
    }
    value
}
