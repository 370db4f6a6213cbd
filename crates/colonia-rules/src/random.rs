//! Random selection utilities: labelled draws, weighted choice, random ranges.
//!
//! All randomness in the simulation flows through [`random_int`] so that
//! every draw is traced with a label. The game holds a single sequential
//! generator and passes it down by `&mut`; the order in which callers draw
//! is part of the reproducibility contract, so helpers here never draw
//! more than they must:
//!
//! - an empty [`WeightedChoice`] draws nothing and yields `None`;
//! - a single-entry [`WeightedChoice`] yields its entry without drawing;
//! - a [`RandomRange`] with probability 0 or 100 skips the probability roll.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::RulesError;

/// Largest absolute bound or scale accepted by [`RandomRange`].
///
/// Keeps `(max + 1) * scale` comfortably inside `i64`.
const RANGE_LIMIT: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Labelled draws
// ---------------------------------------------------------------------------

/// Draw a uniform integer in `[0, n)`, tracing the draw under `label`.
///
/// Returns 0 without drawing when `n` is 0.
pub fn random_int(rng: &mut impl Rng, label: &str, n: u32) -> u32 {
    if n == 0 {
        return 0;
    }
    let value = rng.random_range(0..n);
    trace!(label, n, value, "random draw");
    value
}

/// Draw a uniform integer in `[0, n)` over the wide range.
fn random_wide(rng: &mut impl Rng, label: &str, n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let value = rng.random_range(0..n);
    trace!(label, n, value, "random draw");
    value
}

// ---------------------------------------------------------------------------
// WeightedChoice
// ---------------------------------------------------------------------------

/// An ordered set of items with relative integer weights.
///
/// The probability of an item is `weight / total_weight`. Entries with a
/// zero weight can never be selected and are dropped at construction;
/// every positive-weight entry is kept in its original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedChoice<T> {
    /// `(item, weight)` pairs with `weight > 0`.
    entries: Vec<(T, u32)>,
    /// Sum of all weights.
    total: u64,
}

impl<T> WeightedChoice<T> {
    /// Build a choice from `(item, weight)` pairs.
    pub fn new(items: impl IntoIterator<Item = (T, u32)>) -> Self {
        let mut entries = Vec::new();
        let mut total: u64 = 0;
        for (item, weight) in items {
            if weight == 0 {
                continue;
            }
            total = total.saturating_add(u64::from(weight));
            entries.push((item, weight));
        }
        Self { entries, total }
    }

    /// Number of selectable entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry can be selected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all weights.
    pub const fn total_weight(&self) -> u64 {
        self.total
    }

    /// Iterate over `(item, weight)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, u32)> {
        self.entries.iter().map(|(item, weight)| (item, *weight))
    }

    /// Select the entry owning `roll` in the cumulative weight line.
    ///
    /// `roll` is expected in `[0, total_weight())`; larger values select
    /// nothing.
    pub fn select(&self, roll: u64) -> Option<&T> {
        let mut remaining = roll;
        for (item, weight) in &self.entries {
            let weight = u64::from(*weight);
            if remaining < weight {
                return Some(item);
            }
            remaining = remaining.saturating_sub(weight);
        }
        None
    }

    /// Pick one entry at random.
    ///
    /// Empty choices yield `None` and single-entry choices yield their entry,
    /// both without consuming a draw.
    pub fn sample(&self, rng: &mut impl Rng, label: &str) -> Option<&T> {
        match self.entries.as_slice() {
            [] => None,
            [(only, _)] => Some(only),
            _ => {
                let roll = random_wide(rng, label, self.total);
                self.select(roll)
            }
        }
    }
}

/// Pick one item from `(item, weight)` pairs at random.
///
/// Convenience wrapper over [`WeightedChoice::sample`] for callers that
/// hold the pairs as a slice.
pub fn sample<'a, T>(rng: &mut impl Rng, label: &str, items: &'a [(T, u32)]) -> Option<&'a T> {
    let choice = WeightedChoice::new(items.iter().map(|(item, weight)| (item, *weight)));
    choice.sample(rng, label).copied()
}

// ---------------------------------------------------------------------------
// RandomRange
// ---------------------------------------------------------------------------

/// Raw, unvalidated form of a [`RandomRange`] as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomRangeDef {
    /// Chance in percent that the range yields anything at all.
    pub probability: i64,
    /// Lowest step.
    pub min: i64,
    /// Highest step.
    pub max: i64,
    /// Multiplier applied to the drawn step.
    #[serde(default = "default_scale")]
    pub scale: i64,
}

const fn default_scale() -> i64 {
    1
}

/// A validated random amount definition.
///
/// When triggered, a range yields a multiple of `scale` between `min` and
/// `max` steps. In continuous mode any integer in
/// `[min * scale, (max + 1) * scale)` can come out, so the upper bound of
/// the result sits one scale step above `max * scale`; in discrete mode only
/// the exact multiples `{min, ..., max} * scale` can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RandomRangeDef", into = "RandomRangeDef")]
pub struct RandomRange {
    /// Chance in percent, `0..=100`.
    probability: u32,
    /// Lowest step.
    min: i64,
    /// Highest step.
    max: i64,
    /// Step multiplier, at least 1.
    scale: i64,
}

impl RandomRange {
    /// Validate and build a range.
    ///
    /// # Errors
    ///
    /// - [`RulesError::InvalidProbability`] unless `0 <= probability <= 100`.
    /// - [`RulesError::InvertedRange`] if `min > max`.
    /// - [`RulesError::InvalidValue`] if `scale < 1` or a bound is too large.
    pub fn new(probability: i64, min: i64, max: i64, scale: i64) -> Result<Self, RulesError> {
        let context = String::from("random range");
        let probability = u32::try_from(probability)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| RulesError::InvalidProbability {
                context: context.clone(),
                probability,
            })?;
        if min > max {
            return Err(RulesError::InvertedRange { context, min, max });
        }
        if scale < 1 {
            return Err(RulesError::InvalidValue {
                context,
                reason: format!("scale {scale} must be at least 1"),
            });
        }
        if min.unsigned_abs() > RANGE_LIMIT || max.unsigned_abs() > RANGE_LIMIT || scale.unsigned_abs() > RANGE_LIMIT {
            return Err(RulesError::InvalidValue {
                context,
                reason: format!("bounds must stay within +/-{RANGE_LIMIT}"),
            });
        }
        Ok(Self {
            probability,
            min,
            max,
            scale,
        })
    }

    /// Chance in percent that the range yields anything.
    pub const fn probability(&self) -> u32 {
        self.probability
    }

    /// Lowest step.
    pub const fn min(&self) -> i64 {
        self.min
    }

    /// Highest step.
    pub const fn max(&self) -> i64 {
        self.max
    }

    /// Step multiplier.
    pub const fn scale(&self) -> i64 {
        self.scale
    }

    /// Draw an amount.
    ///
    /// First rolls the probability gate (skipped at 0 and 100); a failed gate
    /// yields 0. Otherwise draws either a continuous value in
    /// `[min * scale, (max + 1) * scale)` or a discrete value
    /// `step * scale` with `step` in `min..=max`.
    pub fn amount(&self, label: &str, rng: &mut impl Rng, continuous: bool) -> i64 {
        let triggered = self.probability >= 100
            || (self.probability > 0 && random_int(rng, label, 100) < self.probability);
        if !triggered {
            return 0;
        }

        // Bounds are validated, so none of these can overflow.
        let steps = self.max.saturating_sub(self.min).saturating_add(1);
        if continuous {
            let span = u64::try_from(steps.saturating_mul(self.scale)).unwrap_or(0);
            let offset = i64::try_from(random_wide(rng, label, span)).unwrap_or(0);
            offset.saturating_add(self.min.saturating_mul(self.scale))
        } else {
            let span = u64::try_from(steps).unwrap_or(0);
            let step = i64::try_from(random_wide(rng, label, span)).unwrap_or(0);
            step.saturating_add(self.min).saturating_mul(self.scale)
        }
    }
}

impl TryFrom<RandomRangeDef> for RandomRange {
    type Error = RulesError;

    fn try_from(def: RandomRangeDef) -> Result<Self, Self::Error> {
        Self::new(def.probability, def.min, def.max, def.scale)
    }
}

impl From<RandomRange> for RandomRangeDef {
    fn from(range: RandomRange) -> Self {
        Self {
            probability: i64::from(range.probability),
            min: range.min,
            max: range.max,
            scale: range.scale,
        }
    }
}
