//! Grid coordinates and the eight compass directions.

use serde::{Deserialize, Serialize};

/// A tile coordinate. Ordered by column, then row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Column.
    pub x: u32,
    /// Row, growing southward.
    pub y: u32,
}

impl Position {
    /// Create a position.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// The neighbouring position in `direction`, or `None` below zero.
    ///
    /// The upper map bound is not checked here.
    pub fn step(self, direction: Direction) -> Option<Self> {
        let (dx, dy) = direction.offset();
        Some(Self {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }

    /// Chebyshev distance: the number of steps between two positions.
    pub const fn distance(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }

    /// Direction of an adjacent position, `None` when not adjacent.
    pub fn direction_to(self, other: Self) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|direction| self.step(*direction) == Some(other))
    }

    /// Whether `other` is one step away.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.distance(other) == 1
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the eight compass directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// North.
    N,
    /// North-east.
    Ne,
    /// East.
    E,
    /// South-east.
    Se,
    /// South.
    S,
    /// South-west.
    Sw,
    /// West.
    W,
    /// North-west.
    Nw,
}

impl Direction {
    /// All directions, clockwise from north.
    pub const ALL: [Self; 8] = [
        Self::N,
        Self::Ne,
        Self::E,
        Self::Se,
        Self::S,
        Self::Sw,
        Self::W,
        Self::Nw,
    ];

    /// The four directions a river can flow along, clockwise from north.
    pub const LONGSIDES: [Self; 4] = [Self::N, Self::E, Self::S, Self::W];

    /// Column and row offsets.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::N => (0, -1),
            Self::Ne => (1, -1),
            Self::E => (1, 0),
            Self::Se => (1, 1),
            Self::S => (0, 1),
            Self::Sw => (-1, 1),
            Self::W => (-1, 0),
            Self::Nw => (-1, -1),
        }
    }

    /// Position of the direction in [`Direction::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::N => 0,
            Self::Ne => 1,
            Self::E => 2,
            Self::Se => 3,
            Self::S => 4,
            Self::Sw => 5,
            Self::W => 6,
            Self::Nw => 7,
        }
    }

    /// Position in [`Direction::LONGSIDES`], `None` for diagonals.
    pub const fn longside_index(self) -> Option<usize> {
        match self {
            Self::N => Some(0),
            Self::E => Some(1),
            Self::S => Some(2),
            Self::W => Some(3),
            Self::Ne | Self::Se | Self::Sw | Self::Nw => None,
        }
    }

    /// The opposite direction.
    pub const fn reverse(self) -> Self {
        match self {
            Self::N => Self::S,
            Self::Ne => Self::Sw,
            Self::E => Self::W,
            Self::Se => Self::Nw,
            Self::S => Self::N,
            Self::Sw => Self::Ne,
            Self::W => Self::E,
            Self::Nw => Self::Se,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_and_directions_agree() {
        let origin = Position::new(5, 5);
        for direction in Direction::ALL {
            let next = origin.step(direction);
            assert!(next.is_some());
            let next = next.unwrap_or(origin);
            assert_eq!(origin.direction_to(next), Some(direction));
            assert_eq!(next.direction_to(origin), Some(direction.reverse()));
            assert!(origin.is_adjacent(next));
        }
    }

    #[test]
    fn stepping_below_zero_fails() {
        assert_eq!(Position::new(0, 3).step(Direction::W), None);
        assert_eq!(Position::new(3, 0).step(Direction::Ne), None);
    }

    #[test]
    fn distance_is_chebyshev() {
        assert_eq!(Position::new(1, 1).distance(Position::new(4, 3)), 3);
        assert_eq!(Position::new(2, 2).distance(Position::new(2, 2)), 0);
        assert_eq!(Position::new(0, 0).direction_to(Position::new(2, 0)), None);
    }

    #[test]
    fn only_longsides_have_river_slots() {
        assert_eq!(Direction::E.longside_index(), Some(1));
        assert_eq!(Direction::Se.longside_index(), None);
        for (slot, direction) in Direction::LONGSIDES.into_iter().enumerate() {
            assert_eq!(direction.longside_index(), Some(slot));
        }
    }
}
