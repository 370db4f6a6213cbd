//! Tension between parties.
//!
//! A [`Tension`] is an integer in `[0, 1000]` that measures how hostile one
//! party feels toward another. Players hold one per other player, colonies
//! hold one per player as their alarm. Every mutation re-clamps the value,
//! and the [`TensionLevel`] is looked up from an ascending threshold table.
//!
//! Two tensions are equal (and hash equally) when their values are equal.

use serde::{Deserialize, Serialize};

use colonia_types::Stance;

// ---------------------------------------------------------------------------
// Named modifiers
// ---------------------------------------------------------------------------

/// Signed tension deltas applied by game events.
pub mod delta {
    /// Entering an alliance.
    pub const ALLIANCE: i32 = -500;
    /// Declaring war.
    pub const DECLARE_WAR: i32 = 1000;
    /// Signing a peace treaty.
    pub const PEACE_TREATY: i32 = -250;
    /// Agreeing a cease fire.
    pub const CEASE_FIRE: i32 = -250;
    /// A minor provocation.
    pub const ADD_MINOR: i32 = 100;
    /// A normal provocation.
    pub const ADD_NORMAL: i32 = 200;
    /// A major provocation.
    pub const ADD_MAJOR: i32 = 300;
    /// One of the party's units was destroyed.
    pub const UNIT_DESTROYED: i32 = 400;
    /// Tension after a surrender.
    pub const SURRENDERED: i32 = 350;
}

/// Tension delta applied to both parties when their stance changes.
pub const fn stance_delta(stance: Stance) -> Option<i32> {
    match stance {
        Stance::War => Some(delta::DECLARE_WAR),
        Stance::Peace => Some(delta::PEACE_TREATY),
        Stance::CeaseFire => Some(delta::CEASE_FIRE),
        Stance::Alliance => Some(delta::ALLIANCE),
        Stance::Uncontacted => None,
    }
}

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// Named band of a tension value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensionLevel {
    /// Up to 100.
    Happy,
    /// Up to 600.
    Content,
    /// Up to 700.
    Displeased,
    /// Up to 800.
    Angry,
    /// Above 800.
    Hateful,
}

impl TensionLevel {
    /// Lowercase key of the level.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Content => "content",
            Self::Displeased => "displeased",
            Self::Angry => "angry",
            Self::Hateful => "hateful",
        }
    }
}

/// Upper bound (inclusive) of each level below [`TensionLevel::Hateful`],
/// ascending.
const THRESHOLDS: [(i32, TensionLevel); 4] = [
    (100, TensionLevel::Happy),
    (600, TensionLevel::Content),
    (700, TensionLevel::Displeased),
    (800, TensionLevel::Angry),
];

// ---------------------------------------------------------------------------
// Tension
// ---------------------------------------------------------------------------

/// A clamped tension value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct Tension {
    value: i32,
}

impl Tension {
    /// Lowest possible value.
    pub const MIN: i32 = 0;
    /// Highest possible value.
    pub const MAX: i32 = 1000;

    /// Tension at `value`, clamped into range.
    pub const fn new(value: i32) -> Self {
        Self {
            value: clamp(value),
        }
    }

    /// Current value.
    pub const fn value(&self) -> i32 {
        self.value
    }

    /// Current level.
    pub fn level(&self) -> TensionLevel {
        THRESHOLDS
            .iter()
            .find(|(limit, _)| self.value <= *limit)
            .map_or(TensionLevel::Hateful, |(_, level)| *level)
    }

    /// Add `delta` and re-clamp. Returns the new value.
    pub const fn modify(&mut self, delta: i32) -> i32 {
        self.value = clamp(self.value.saturating_add(delta));
        self.value
    }

    /// Move the value toward zero by `amount`.
    pub const fn decay(&mut self, amount: i32) -> i32 {
        self.modify(amount.saturating_abs().saturating_neg())
    }

    /// Message key of the current level, e.g. `tension.happy`.
    pub fn key(&self) -> String {
        format!("tension.{}", self.level().key())
    }

    /// Message key of the level's display name.
    pub fn name_key(&self) -> String {
        format!("model.tension.{}.name", self.level().key())
    }
}

const fn clamp(value: i32) -> i32 {
    if value < Tension::MIN {
        Tension::MIN
    } else if value > Tension::MAX {
        Tension::MAX
    } else {
        value
    }
}

impl From<i32> for Tension {
    fn from(value: i32) -> Self {
        Self::new(value)
    }
}

impl From<Tension> for i32 {
    fn from(tension: Tension) -> Self {
        tension.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_follow_thresholds() {
        let cases = [
            (0, TensionLevel::Happy),
            (100, TensionLevel::Happy),
            (101, TensionLevel::Content),
            (600, TensionLevel::Content),
            (601, TensionLevel::Displeased),
            (700, TensionLevel::Displeased),
            (701, TensionLevel::Angry),
            (800, TensionLevel::Angry),
            (801, TensionLevel::Hateful),
            (1000, TensionLevel::Hateful),
        ];
        for (value, level) in cases {
            assert_eq!(Tension::new(value).level(), level, "{value}");
        }
    }

    #[test]
    fn modify_clamps_both_ways() {
        let mut t = Tension::default();
        assert_eq!(t.modify(delta::DECLARE_WAR), 1000);
        assert_eq!(t.modify(delta::ADD_MAJOR), 1000);
        assert_eq!(t.modify(delta::ALLIANCE), 500);
        assert_eq!(t.modify(-2000), 0);
        assert_eq!(t.modify(i32::MIN), 0);
        assert_eq!(Tension::new(-40).value(), 0);
    }

    #[test]
    fn decay_moves_toward_zero() {
        let mut t = Tension::new(25);
        assert_eq!(t.decay(10), 15);
        assert_eq!(t.decay(-10), 5);
        assert_eq!(t.decay(10), 0);
    }

    #[test]
    fn keys_name_the_level() {
        let t = Tension::new(650);
        assert_eq!(t.key(), "tension.displeased");
        assert_eq!(t.name_key(), "model.tension.displeased.name");
    }

    #[test]
    fn equality_is_by_value() {
        let mut a = Tension::new(300);
        let b = Tension::new(300);
        assert_eq!(a, b);
        a.modify(1);
        assert_ne!(a, b);
        let set: std::collections::HashSet<Tension> = [Tension::new(5), Tension::new(5)].into();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn stance_changes_carry_tension() {
        assert_eq!(stance_delta(Stance::War), Some(1000));
        assert_eq!(stance_delta(Stance::Peace), Some(-250));
        assert_eq!(stance_delta(Stance::Uncontacted), None);
    }
}
