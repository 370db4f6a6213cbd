//! Type-safe identifier wrappers.
//!
//! Two families of identifiers exist:
//!
//! - **Arena indices** ([`PlayerId`], [`UnitId`], [`ColonyId`]) are small
//!   integers handed out by the game arena. Tiles and other entities refer to
//!   units and colonies through these indices rather than through owning
//!   references, so the tile/colony/unit/player graph never forms cycles.
//! - **Ruleset keys** ([`GoodsTypeId`], [`UnitTypeId`], ...) name entries in
//!   the read-only ruleset registry, e.g. `"food"` or `"galleon"`.

use core::borrow::Borrow;

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around a `u32` arena index.
macro_rules! define_index {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Create an identifier from a raw index.
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Return the raw index.
            pub const fn index(self) -> u32 {
                self.0
            }

            /// Return the identifier that follows this one, or `None` when
            /// the index space is exhausted.
            pub const fn next(self) -> Option<Self> {
                match self.0.checked_add(1) {
                    Some(next) => Some(Self(next)),
                    None => None,
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(index: u32) -> Self {
                Self(index)
            }
        }
    };
}

/// Generates a newtype wrapper around a ruleset key string.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a key from anything string-like.
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Return the key as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(String::from(key))
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_index! {
    /// Arena index of a player (European power, native nation, or crown).
    PlayerId
}

define_index! {
    /// Arena index of a unit.
    UnitId
}

define_index! {
    /// Arena index of a colony (settlement).
    ColonyId
}

define_key! {
    /// Ruleset key of a goods type (e.g. `food`, `bells`, `muskets`).
    GoodsTypeId
}

define_key! {
    /// Ruleset key of a terrain type (e.g. `plains`, `ocean`).
    TileTypeId
}

define_key! {
    /// Ruleset key of a unit type (e.g. `free_colonist`, `galleon`).
    UnitTypeId
}

define_key! {
    /// Ruleset key of a building chain (e.g. `carpenter`, `docks`).
    BuildingTypeId
}

define_key! {
    /// Ruleset key of a bonus resource (e.g. `grain`, `ore_deposit`).
    ResourceTypeId
}

define_key! {
    /// Ruleset key of a disaster (e.g. `flood`, `hurricane`).
    DisasterId
}

define_key! {
    /// Ruleset key of a disaster effect.
    EffectId
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn index_ids_order_by_value() {
        assert!(UnitId::new(1) < UnitId::new(2));
        assert_eq!(UnitId::new(7).index(), 7);
        assert_eq!(ColonyId::new(3).next(), Some(ColonyId::new(4)));
        assert_eq!(PlayerId::new(u32::MAX).next(), None);
    }

    #[test]
    fn keys_can_be_looked_up_by_str() {
        let mut map = BTreeMap::new();
        map.insert(GoodsTypeId::from("food"), 5_u32);
        assert_eq!(map.get("food"), Some(&5));
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&UnitId::new(12)).ok();
        assert_eq!(json.as_deref(), Some("12"));
        let key: Result<UnitTypeId, _> = serde_json::from_str("\"galleon\"");
        assert_eq!(key.ok(), Some(UnitTypeId::from("galleon")));
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(PlayerId::new(2).to_string(), "PlayerId#2");
        assert_eq!(TileTypeId::from("plains").to_string(), "plains");
    }
}
