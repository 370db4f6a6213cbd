//! Enumeration types shared across the Colonia workspace.
//!
//! Enums that carry an ordering (combat outcomes, consequences) expose an
//! explicit `rank` so that comparisons never depend on declaration order.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Abilities
// ---------------------------------------------------------------------------

/// A capability granted by a unit type, building level, or player.
///
/// Abilities are plain flags; whether something "has" an ability is decided
/// by the owner of the ability list (unit type, building level, player).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    /// The unit can take up equipment roles (soldier, dragoon, pioneer, scout).
    CanBeEquipped,
    /// The unit captures defeated unarmed units instead of slaughtering them.
    CaptureUnits,
    /// The unit captures a colony when its last defender falls.
    CaptureSettlements,
    /// The unit may attack without a declared war.
    Piracy,
    /// The unit fights as a trained soldier.
    ExpertSoldier,
    /// The attacker benefits from the defence bonus of its own tile.
    AmbushBonus,
    /// The unit is artillery and suffers in the open.
    Bombard,
    /// The unit keeps its movement points after attacking.
    MultipleAttacks,
    /// Every step costs a single move regardless of terrain.
    IgnoreTerrainCost,
    /// A building level that repairs damaged ships.
    RepairUnits,
    /// A building level that allows colonists to work water tiles.
    WorkWater,
    /// A player ability allowing buildings to reach their factory level.
    BuildFactory,
}

// ---------------------------------------------------------------------------
// Unit roles
// ---------------------------------------------------------------------------

/// Equipment role a unit has taken up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitRole {
    /// No equipment.
    #[default]
    Default,
    /// Armed with muskets.
    Soldier,
    /// Armed with muskets and mounted.
    Dragoon,
    /// Carries tools for terrain improvement.
    Pioneer,
    /// Mounted explorer.
    Scout,
}

impl UnitRole {
    /// Whether the role carries arms (and can therefore be demoted in combat).
    pub const fn is_armed(self) -> bool {
        matches!(self, Self::Soldier | Self::Dragoon)
    }

    /// Canonical lowercase key of the role.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Soldier => "soldier",
            Self::Dragoon => "dragoon",
            Self::Pioneer => "pioneer",
            Self::Scout => "scout",
        }
    }
}

// ---------------------------------------------------------------------------
// Tiles
// ---------------------------------------------------------------------------

/// Terrain overlay that is mutually exclusive with forestation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileAddition {
    /// No overlay.
    #[default]
    None,
    /// Hills.
    Hills,
    /// Mountains.
    Mountains,
}

/// Terrain improvement a pioneer can carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementAction {
    /// Plow a cleared tile, or clear the forest of a forested one.
    Plow,
    /// Build a road.
    Road,
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

/// Primary result of an attack, seen from the attacker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatOutcome {
    /// The attacker won.
    Win,
    /// The attacker lost.
    Lose,
    /// The defender slipped away (naval combat only).
    Evade,
}

impl CombatOutcome {
    /// Rank from the attacker's point of view: higher is better.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Lose => 0,
            Self::Evade => 1,
            Self::Win => 2,
        }
    }
}

/// Secondary consequence applied to the loser of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatConsequence {
    /// The losing ship is damaged and sent to its repair location.
    DamageShip,
    /// The losing ship is sunk.
    SinkShip,
    /// The losing unit changes hands.
    CaptureUnit,
    /// The losing unit is destroyed.
    SlaughterUnit,
    /// The losing unit loses its arms (role downgrade or demoted type).
    DemoteUnit,
    /// Great victory: the winner is promoted and the loser demoted.
    PromoteUnit,
    /// The colony the loser defended changes hands.
    CaptureColony,
}

impl CombatConsequence {
    /// Severity for the losing side: higher is worse.
    pub const fn severity(self) -> u8 {
        match self {
            Self::DemoteUnit => 1,
            Self::PromoteUnit | Self::DamageShip => 2,
            Self::CaptureUnit => 3,
            Self::SinkShip | Self::SlaughterUnit => 4,
            Self::CaptureColony => 5,
        }
    }

    /// Whether the consequence removes the losing unit from the map.
    pub const fn destroys_unit(self) -> bool {
        matches!(self, Self::SinkShip | Self::SlaughterUnit)
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// Kind of player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    /// A colonial power with a home port overseas.
    European,
    /// A native nation.
    Native,
    /// The crown's expeditionary force.
    Royal,
}

/// Diplomatic stance of one player toward another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    /// The players have not met.
    #[default]
    Uncontacted,
    /// Normal peaceful relations.
    Peace,
    /// Hostilities suspended.
    CeaseFire,
    /// Formal alliance.
    Alliance,
    /// Open war.
    War,
}

impl Stance {
    /// Whether combat between the two players is allowed.
    pub const fn is_hostile(self) -> bool {
        matches!(self, Self::War)
    }

    /// Canonical lowercase key of the stance.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Uncontacted => "uncontacted",
            Self::Peace => "peace",
            Self::CeaseFire => "cease_fire",
            Self::Alliance => "alliance",
            Self::War => "war",
        }
    }
}
